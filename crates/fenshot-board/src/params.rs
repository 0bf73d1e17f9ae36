use serde::{Deserialize, Serialize};

/// Parameters for turning corner detections into an ordered corner set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerParams {
    /// Outward inflation of every corner along x, in source pixels.
    pub offset_x: f32,
    /// Outward inflation of every corner along y, in source pixels.
    pub offset_y: f32,
}

/// Parameters for reducing the grid segmentation contour to a quadrilateral.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Douglas–Peucker tolerance as a fraction of the contour perimeter.
    pub epsilon_frac: f32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self { epsilon_frac: 0.1 }
    }
}

/// Parameters for the colour-based orientation check.
///
/// Thresholds are in 8-bit Lab units (`L` in `0..=255`, `b` offset by 128).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationParams {
    /// Side of the square patch sampled at each image corner (one board square).
    pub patch_size: usize,
    /// Width of the border band inside each patch that samples are drawn from.
    pub border_width: usize,
    /// Random samples averaged per patch.
    pub samples: usize,
    pub l_threshold: f32,
    pub b_threshold: f32,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            patch_size: 80,
            border_width: 10,
            samples: 10,
            l_threshold: 100.0,
            b_threshold: 140.0,
        }
    }
}
