//! JSON configuration for [`crate::BoardReader`] and the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use fenshot_board::{CornerParams, GridParams, OrientationParams};
use fenshot_position::MapperParams;
use serde::{Deserialize, Serialize};

use crate::DetectionThresholds;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_corner_thresholds() -> DetectionThresholds {
    DetectionThresholds::CORNERS
}

fn default_grid_thresholds() -> DetectionThresholds {
    DetectionThresholds::GRID
}

fn default_piece_thresholds() -> DetectionThresholds {
    DetectionThresholds::PIECES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_depth() -> usize {
    15
}

/// External UCI engine to ask for a move once the position is read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub path: PathBuf,
    #[serde(default = "default_depth")]
    pub depth: usize,
}

/// Every tunable of the reading pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default = "default_corner_thresholds")]
    pub corner_thresholds: DetectionThresholds,
    #[serde(default = "default_grid_thresholds")]
    pub grid_thresholds: DetectionThresholds,
    #[serde(default = "default_piece_thresholds")]
    pub piece_thresholds: DetectionThresholds,
    #[serde(default)]
    pub corners: CornerParams,
    #[serde(default)]
    pub grid: GridParams,
    #[serde(default)]
    pub orientation: OrientationParams,
    #[serde(default)]
    pub mapper: MapperParams,
    /// Seed for the sampling RNG; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Reject readings that are not a playable position (missing or extra
    /// kings, pawns on a back rank, the side not to move in check).
    #[serde(default)]
    pub strict_position: bool,
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            corner_thresholds: default_corner_thresholds(),
            grid_thresholds: default_grid_thresholds(),
            piece_thresholds: default_piece_thresholds(),
            corners: CornerParams::default(),
            grid: GridParams::default(),
            orientation: OrientationParams::default(),
            mapper: MapperParams::default(),
            seed: None,
            strict_position: false,
            engine: None,
            log_level: default_log_level(),
        }
    }
}

impl ReaderConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
