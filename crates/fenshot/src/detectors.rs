//! Contracts for the external detection models, plus a JSON replay backend.
//!
//! Detectors run outside this workspace (neural networks, a web service,
//! a labelling tool). The pipeline only sees their output through these
//! traits, so recorded output can stand in for a live model.

use std::fs;
use std::path::Path;

use fenshot_core::{BoundingBox, RgbImageView};
use fenshot_position::PieceDetection;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Confidence and NMS IoU thresholds handed to a detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    pub confidence: f32,
    pub iou: f32,
}

impl DetectionThresholds {
    pub const CORNERS: Self = Self {
        confidence: 0.1,
        iou: 0.2,
    };
    pub const GRID: Self = Self {
        confidence: 0.1,
        iou: 0.2,
    };
    pub const PIECES: Self = Self {
        confidence: 0.25,
        iou: 0.2,
    };
}

#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("detector backend failed: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Finds the four board-corner markers in the photograph.
pub trait CornerDetector {
    fn detect_corners(
        &self,
        image: &RgbImageView<'_>,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<BoundingBox>, DetectorError>;
}

/// Outlines the playing grid in the first rectified image. Each contour is
/// a closed polyline in canonical pixel coordinates.
pub trait GridSegmenter {
    fn segment_grid(
        &self,
        image: &RgbImageView<'_>,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<Vec<Point2<f32>>>, DetectorError>;
}

/// Finds pieces in the first rectified image.
pub trait PieceDetector {
    fn detect_pieces(
        &self,
        image: &RgbImageView<'_>,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<PieceDetection>, DetectorError>;
}

/// Previously recorded detector output, replayed regardless of the image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedDetections {
    /// Corner boxes in source-image pixels.
    pub corners: Vec<BoundingBox>,
    /// Grid contours in the first rectified frame.
    pub grid: Vec<Vec<Point2<f32>>>,
    /// Piece boxes in the first rectified frame.
    pub pieces: Vec<PieceDetection>,
}

impl RecordedDetections {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectorError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl CornerDetector for RecordedDetections {
    fn detect_corners(
        &self,
        _image: &RgbImageView<'_>,
        thresholds: &DetectionThresholds,
    ) -> Result<Vec<BoundingBox>, DetectorError> {
        debug!(
            "replaying {} corner boxes (conf {}, iou {} not applied)",
            self.corners.len(),
            thresholds.confidence,
            thresholds.iou
        );
        Ok(self.corners.clone())
    }
}

impl GridSegmenter for RecordedDetections {
    fn segment_grid(
        &self,
        _image: &RgbImageView<'_>,
        _thresholds: &DetectionThresholds,
    ) -> Result<Vec<Vec<Point2<f32>>>, DetectorError> {
        Ok(self.grid.clone())
    }
}

impl PieceDetector for RecordedDetections {
    fn detect_pieces(
        &self,
        _image: &RgbImageView<'_>,
        _thresholds: &DetectionThresholds,
    ) -> Result<Vec<PieceDetection>, DetectorError> {
        Ok(self.pieces.clone())
    }
}
