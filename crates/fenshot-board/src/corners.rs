//! Corner localisation: from unordered corner boxes to a labeled corner set.
//!
//! Algorithm:
//! 1. With exactly four boxes, their centers are the corners.
//! 2. Otherwise every box contributes five candidates (four corners + center).
//!    Starting from the globally leftmost candidate, candidates are sorted by
//!    polar angle and the first point of each of the first four distinct boxes
//!    is kept.
//! 3. The four points are labeled around their centroid and emitted as
//!    `[bottom_left, bottom_right, top_right, top_left]`.
//!
//! Labels follow the Cartesian convention of `atan2` on raw pixel coordinates.
//! Pixel rows grow downward, so `bottom_left` is the corner nearest the image
//! origin and the emitted order walks clockwise on screen starting top-left.
//! The rectifier maps that order onto `(0,0), (639,0), (639,639), (0,639)`.

use std::f32::consts::FRAC_PI_2;

use fenshot_core::BoundingBox;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::CornerParams;

/// Angles closer to zero than this are treated as exactly horizontal.
pub const ANGLE_EPS: f32 = 1e-6;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CornerError {
    #[error("corner detection failed: need 4 distinct board corners, resolved {found}")]
    CornerDetectionFailed { found: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerLabel {
    BottomLeft,
    BottomRight,
    TopRight,
    TopLeft,
}

impl CornerLabel {
    /// Labels in the order a [`CornerSet`] stores its points.
    pub const ORDER: [CornerLabel; 4] = [
        CornerLabel::BottomLeft,
        CornerLabel::BottomRight,
        CornerLabel::TopRight,
        CornerLabel::TopLeft,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            CornerLabel::BottomLeft => 0,
            CornerLabel::BottomRight => 1,
            CornerLabel::TopRight => 2,
            CornerLabel::TopLeft => 3,
        }
    }
}

/// Four board corners in canonical order plus their centroid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerSet {
    points: [Point2<f32>; 4],
    centroid: Point2<f32>,
}

fn centroid_of(points: &[Point2<f32>; 4]) -> Point2<f32> {
    let sx: f32 = points.iter().map(|p| p.x).sum();
    let sy: f32 = points.iter().map(|p| p.y).sum();
    Point2::new(sx / 4.0, sy / 4.0)
}

impl CornerSet {
    /// Label four unordered points around their centroid.
    ///
    /// The result does not depend on the order of `points`.
    pub fn from_unordered(points: [Point2<f32>; 4]) -> Self {
        let centroid = centroid_of(&points);
        let mut keyed = points.map(|p| ((p.y - centroid.y).atan2(p.x - centroid.x), p));
        // Descending angle yields top-left, top-right, bottom-right, bottom-left;
        // the stored order is the reverse of that.
        keyed.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.x.total_cmp(&b.1.x))
                .then(a.1.y.total_cmp(&b.1.y))
        });
        Self {
            points: keyed.map(|(_, p)| p),
            centroid,
        }
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f32>; 4] {
        &self.points
    }

    #[inline]
    pub fn centroid(&self) -> Point2<f32> {
        self.centroid
    }

    #[inline]
    pub fn get(&self, label: CornerLabel) -> Point2<f32> {
        self.points[label.index()]
    }

    /// Push every corner outward by `(dx, dy)` along its own quadrant.
    pub fn inflated(&self, dx: f32, dy: f32) -> Self {
        let signs = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let mut points = self.points;
        for (p, (sx, sy)) in points.iter_mut().zip(signs) {
            p.x += sx * dx;
            p.y += sy * dy;
        }
        Self {
            points,
            centroid: centroid_of(&points),
        }
    }
}

/// Turns raw corner-box detections into a [`CornerSet`].
#[derive(Clone, Debug, Default)]
pub struct CornerLocator {
    params: CornerParams,
}

impl CornerLocator {
    pub fn new(params: CornerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CornerParams {
        &self.params
    }

    /// Resolve, label and inflate the board corners.
    pub fn locate(&self, boxes: &[BoundingBox]) -> Result<CornerSet, CornerError> {
        let points = if boxes.len() == 4 {
            [
                boxes[0].center(),
                boxes[1].center(),
                boxes[2].center(),
                boxes[3].center(),
            ]
        } else {
            debug!(
                "{} corner boxes detected, falling back to the leftmost angular walk",
                boxes.len()
            );
            walk_representatives(boxes)?
        };

        let found = count_distinct(&points);
        if found < 4 {
            return Err(CornerError::CornerDetectionFailed { found });
        }

        let corners = CornerSet::from_unordered(points);
        Ok(corners.inflated(self.params.offset_x, self.params.offset_y))
    }
}

fn count_distinct(points: &[Point2<f32>]) -> usize {
    let mut distinct: Vec<Point2<f32>> = Vec::with_capacity(points.len());
    for p in points {
        if !distinct.iter().any(|q| (q - p).norm() <= f32::EPSILON) {
            distinct.push(*p);
        }
    }
    distinct.len()
}

fn walk_angle(from: Point2<f32>, to: Point2<f32>) -> f32 {
    let theta = (to.y - from.y).atan2(to.x - from.x);
    if theta.abs() < ANGLE_EPS {
        theta + FRAC_PI_2
    } else {
        theta
    }
}

/// Pick one point from each of the first four distinct boxes met when sweeping
/// candidates by angle around the leftmost candidate.
fn walk_representatives(boxes: &[BoundingBox]) -> Result<[Point2<f32>; 4], CornerError> {
    let candidates: Vec<(usize, Point2<f32>)> = boxes
        .iter()
        .enumerate()
        .flat_map(|(i, b)| b.candidate_points().into_iter().map(move |p| (i, p)))
        .collect();

    let Some(leftmost) = candidates
        .iter()
        .map(|&(_, p)| p)
        .reduce(|best, p| if p.x < best.x { p } else { best })
    else {
        return Err(CornerError::CornerDetectionFailed { found: 0 });
    };

    let mut keyed: Vec<(f32, usize, Point2<f32>)> = candidates
        .iter()
        .map(|&(i, p)| (walk_angle(leftmost, p), i, p))
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen: Vec<usize> = Vec::with_capacity(4);
    let mut picked: Vec<Point2<f32>> = Vec::with_capacity(4);
    for (_, box_idx, p) in keyed {
        if seen.contains(&box_idx) {
            continue;
        }
        seen.push(box_idx);
        picked.push(p);
        if picked.len() == 4 {
            break;
        }
    }

    let found = picked.len();
    picked
        .try_into()
        .map_err(|_| CornerError::CornerDetectionFailed { found })
}
