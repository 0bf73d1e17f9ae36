//! High-level facade for the `fenshot-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometric and position crates,
//! - detector and engine traits that external models plug into,
//! - [`BoardReader`], which chains corner rectification, grid
//!   re-rectification, orientation handling and piece mapping,
//! - SVG board diagrams with a best-move arrow,
//! - (feature `image`) adapters for `image` buffers and batch rectification
//!   of a photo directory.
//!
//! ## Quickstart
//!
//! ```no_run
//! use fenshot::{BoardReader, Color, ReaderConfig, RecordedDetections, TopSide};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = fenshot::images::load_rgb("board.jpg")?;
//! let detections = RecordedDetections::load_json("board.detections.json")?;
//! let config = ReaderConfig::default();
//!
//! let reader = BoardReader::from_detector(&detections, &config);
//! let mut rng = StdRng::seed_from_u64(0);
//! let fen = reader.read_fen(&photo.view(), TopSide::Black, Color::White, &mut rng)?;
//! println!("{fen}");
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `fenshot::core`: points, boxes, RGB images, homographies, Lab colour.
//! - `fenshot::board`: corner locator, rectifier, grid resolver, orientation.
//! - `fenshot::position`: squares, pieces, square mapper, FEN.

pub use fenshot_board as board;
pub use fenshot_core as core;
pub use fenshot_position as position;

mod config;
mod detectors;
mod engine;
mod pipeline;
mod render;

#[cfg(feature = "image")]
pub mod batch;
#[cfg(feature = "image")]
pub mod images;

pub use config::{ConfigError, EngineConfig, ReaderConfig};
pub use detectors::{
    CornerDetector, DetectionThresholds, DetectorError, GridSegmenter, PieceDetector,
    RecordedDetections,
};
pub use engine::{
    best_move_for, move_squares, ChessEngine, EngineError, UciEngine, UciSession,
};
pub use shakmaty::uci::UciMove;
pub use pipeline::{BoardReader, BoardReading, ReadError};
pub use render::{board_svg, DiagramStyle};

pub use fenshot_board::TopSide;
pub use fenshot_core::{BoundingBox, Point2, RgbImage, RgbImageView};
pub use fenshot_position::{
    is_valid_fen, ClassScores, Color, Fen, FenError, Piece, PieceDetection, Placement, Square,
};
