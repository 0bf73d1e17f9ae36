//! Second rectification from the segmented playing-grid contour.
//!
//! The corner detector frames the board including its border; the grid
//! segmenter outlines the 8x8 playing area inside the first rectified image.
//! Re-rectifying onto that outline removes the border and residual skew.

use fenshot_core::{approx_closed_polygon, closed_perimeter, Homography, RgbImageView};
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::rectify::{rectify_quad, RectifiedBoard, RectifyError};
use crate::GridParams;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("grid contour approximates to {vertices} vertices, expected 4")]
    GridApproximationFailed { vertices: usize },
    #[error(transparent)]
    Rectify(#[from] RectifyError),
}

/// Grid outline with vertices named by their image position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridQuad {
    pub top_left: Point2<f32>,
    pub bottom_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_right: Point2<f32>,
}

impl GridQuad {
    /// Name four vertices: the two smallest-x points form the left side, the
    /// smaller y of each side is its top.
    pub fn from_vertices(vertices: [Point2<f32>; 4]) -> Self {
        let mut v = vertices;
        v.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let (tl, bl) = if v[0].y <= v[1].y {
            (v[0], v[1])
        } else {
            (v[1], v[0])
        };
        let (tr, br) = if v[2].y <= v[3].y {
            (v[2], v[3])
        } else {
            (v[3], v[2])
        };
        Self {
            top_left: tl,
            bottom_left: bl,
            top_right: tr,
            bottom_right: br,
        }
    }

    /// Storage order: `[top_left, bottom_left, top_right, bottom_right]`.
    pub fn as_array(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.bottom_left,
            self.top_right,
            self.bottom_right,
        ]
    }

    /// Warp order, matching the canonical destination corners.
    pub fn clockwise(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Output of [`GridResolver::resolve`].
#[derive(Clone, Debug)]
pub struct ResolvedGrid {
    pub quad: GridQuad,
    /// Doubly rectified image plus the first-rectified -> grid transform.
    pub board: RectifiedBoard,
}

impl ResolvedGrid {
    /// First-rectified frame -> grid frame.
    pub fn homography(&self) -> &Homography {
        &self.board.h_rect_from_src
    }
}

#[derive(Clone, Debug, Default)]
pub struct GridResolver {
    params: GridParams,
}

impl GridResolver {
    pub fn new(params: GridParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Reduce one closed contour to a named quadrilateral.
    pub fn quad_from_contour(&self, contour: &[Point2<f32>]) -> Result<GridQuad, GridError> {
        let eps = self.params.epsilon_frac * closed_perimeter(contour);
        let approx = approx_closed_polygon(contour, eps);
        let vertices: [Point2<f32>; 4] =
            approx
                .try_into()
                .map_err(|v: Vec<Point2<f32>>| GridError::GridApproximationFailed {
                    vertices: v.len(),
                })?;
        Ok(GridQuad::from_vertices(vertices))
    }

    /// Use the first contour; an empty list counts as zero vertices.
    pub fn quad_from_contours(&self, contours: &[Vec<Point2<f32>>]) -> Result<GridQuad, GridError> {
        match contours.first() {
            Some(contour) => {
                if contours.len() > 1 {
                    debug!("{} grid contours, using the first", contours.len());
                }
                self.quad_from_contour(contour)
            }
            None => Err(GridError::GridApproximationFailed { vertices: 0 }),
        }
    }

    /// Find the grid quad in `rectified` and warp it onto the canonical square.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, rectified, contours), fields(contours = contours.len()))
    )]
    pub fn resolve(
        &self,
        rectified: &RgbImageView<'_>,
        contours: &[Vec<Point2<f32>>],
    ) -> Result<ResolvedGrid, GridError> {
        let quad = self.quad_from_contours(contours)?;
        debug!("grid quad {:?}", quad.as_array());
        let board = rectify_quad(rectified, &quad.clockwise())?;
        Ok(ResolvedGrid { quad, board })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use fenshot_core::{RgbImage, CANONICAL_SIDE};

    fn densify(corners: &[Point2<f32>], per_edge: usize) -> Vec<Point2<f32>> {
        let n = corners.len();
        let mut out = Vec::with_capacity(n * per_edge);
        for i in 0..n {
            let a = corners[i];
            let b = corners[(i + 1) % n];
            for k in 0..per_edge {
                let t = k as f32 / per_edge as f32;
                out.push(a + (b - a) * t);
            }
        }
        out
    }

    fn regular_polygon(sides: usize) -> Vec<Point2<f32>> {
        (0..sides)
            .map(|k| {
                let a = k as f32 * std::f32::consts::TAU / sides as f32;
                Point2::new(320.0 + 250.0 * a.cos(), 320.0 + 250.0 * a.sin())
            })
            .collect()
    }

    #[test]
    fn vertices_are_named_by_position() {
        let quad = GridQuad::from_vertices([
            Point2::new(600.0, 610.0),
            Point2::new(30.0, 20.0),
            Point2::new(25.0, 590.0),
            Point2::new(615.0, 35.0),
        ]);
        assert_eq!(quad.top_left, Point2::new(30.0, 20.0));
        assert_eq!(quad.bottom_left, Point2::new(25.0, 590.0));
        assert_eq!(quad.top_right, Point2::new(615.0, 35.0));
        assert_eq!(quad.bottom_right, Point2::new(600.0, 610.0));
    }

    #[test]
    fn dense_square_contour_gives_quad() {
        let corners = [
            Point2::new(40.0, 35.0),
            Point2::new(600.0, 42.0),
            Point2::new(605.0, 598.0),
            Point2::new(38.0, 602.0),
        ];
        let quad = GridResolver::default()
            .quad_from_contour(&densify(&corners, 40))
            .expect("quad");
        assert_eq!(quad.top_left, corners[0]);
        assert_eq!(quad.top_right, corners[1]);
        assert_eq!(quad.bottom_right, corners[2]);
        assert_eq!(quad.bottom_left, corners[3]);
    }

    #[test]
    fn pentagon_is_rejected() {
        let err = GridResolver::default()
            .quad_from_contour(&regular_polygon(5))
            .unwrap_err();
        assert_eq!(err, GridError::GridApproximationFailed { vertices: 5 });
    }

    #[test]
    fn triangle_is_rejected() {
        let err = GridResolver::default()
            .quad_from_contour(&regular_polygon(3))
            .unwrap_err();
        assert_eq!(err, GridError::GridApproximationFailed { vertices: 3 });
    }

    #[test]
    fn no_contours_report_zero_vertices() {
        let err = GridResolver::default().quad_from_contours(&[]).unwrap_err();
        assert_eq!(err, GridError::GridApproximationFailed { vertices: 0 });
    }

    #[test]
    fn full_frame_grid_is_identity() {
        let m = (CANONICAL_SIDE - 1) as f32;
        let contour = densify(
            &[
                Point2::new(0.0, 0.0),
                Point2::new(m, 0.0),
                Point2::new(m, m),
                Point2::new(0.0, m),
            ],
            32,
        );
        let image = RgbImage::filled(CANONICAL_SIDE, CANONICAL_SIDE, [90, 120, 60]);
        let grid = GridResolver::default()
            .resolve(&image.view(), &[contour])
            .expect("grid");
        let p = grid.homography().apply(Point2::new(123.0, 456.0));
        assert_abs_diff_eq!(p.x, 123.0, epsilon = 1e-2);
        assert_abs_diff_eq!(p.y, 456.0, epsilon = 1e-2);
        assert_eq!(grid.board.image.view().pixel(300, 300), Some([90, 120, 60]));
    }
}
