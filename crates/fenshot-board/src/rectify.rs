use fenshot_core::{
    homography_from_4pt, warp_perspective_rgb, Homography, RgbImage, RgbImageView, CANONICAL_SIDE,
};
use nalgebra::Point2;

use crate::CornerSet;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    #[error("source quadrilateral is degenerate (collinear or repeated points)")]
    DegenerateQuad,
    #[error("perspective transform not invertible")]
    NonInvertible,
}

/// Destination corners of the canonical square, in the order every source
/// quad is expected in: `(0,0)`, `(639,0)`, `(639,639)`, `(0,639)`.
pub fn canonical_corners() -> [Point2<f32>; 4] {
    let m = (CANONICAL_SIDE - 1) as f32;
    [
        Point2::new(0.0, 0.0),
        Point2::new(m, 0.0),
        Point2::new(m, m),
        Point2::new(0.0, m),
    ]
}

/// A board image resampled onto the canonical square.
#[derive(Clone, Debug)]
pub struct RectifiedBoard {
    pub image: RgbImage,
    /// Source pixel -> canonical pixel.
    pub h_rect_from_src: Homography,
    /// Canonical pixel -> source pixel (used for resampling).
    pub h_src_from_rect: Homography,
}

/// Forward and inverse transforms for `src[k] -> canonical_corners()[k]`.
pub fn canonical_transform(
    src: &[Point2<f32>; 4],
) -> Result<(Homography, Homography), RectifyError> {
    let h_rect_from_src =
        homography_from_4pt(src, &canonical_corners()).ok_or(RectifyError::DegenerateQuad)?;
    let h_src_from_rect = h_rect_from_src
        .inverse()
        .ok_or(RectifyError::NonInvertible)?;
    Ok((h_rect_from_src, h_src_from_rect))
}

/// Rectify the quad `src` (canonical corner order) to a 640x640 image.
pub fn rectify_quad(
    image: &RgbImageView<'_>,
    src: &[Point2<f32>; 4],
) -> Result<RectifiedBoard, RectifyError> {
    let (h_rect_from_src, h_src_from_rect) = canonical_transform(src)?;
    let image = warp_perspective_rgb(image, &h_src_from_rect, CANONICAL_SIDE, CANONICAL_SIDE);
    Ok(RectifiedBoard {
        image,
        h_rect_from_src,
        h_src_from_rect,
    })
}

/// Rectify the board outlined by an ordered corner set.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(image, corners), fields(width = image.width, height = image.height))
)]
pub fn rectify_from_corners(
    image: &RgbImageView<'_>,
    corners: &CornerSet,
) -> Result<RectifiedBoard, RectifyError> {
    rectify_quad(image, corners.points())
}
