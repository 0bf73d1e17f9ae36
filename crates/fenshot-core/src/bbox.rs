use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned detector box in pixel space, stored as center + size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
        }
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.cx, self.cy)
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.cx - 0.5 * self.width
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.cx + 0.5 * self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.cy - 0.5 * self.height
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.cy + 0.5 * self.height
    }

    /// Corners in image orientation: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [
            Point2::new(self.left(), self.top()),
            Point2::new(self.right(), self.top()),
            Point2::new(self.right(), self.bottom()),
            Point2::new(self.left(), self.bottom()),
        ]
    }

    /// The four corners followed by the center.
    pub fn candidate_points(&self) -> [Point2<f32>; 5] {
        let [tl, tr, br, bl] = self.corners();
        [tl, tr, bl, br, self.center()]
    }
}
