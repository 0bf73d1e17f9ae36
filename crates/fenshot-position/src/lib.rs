//! Board-state synthesis: from piece boxes in the rectified frame to FEN.
//!
//! ```
//! use fenshot_position::{Color, Fen, Occupancy, Piece, PieceKind, Placement};
//!
//! let mut board = Occupancy::empty();
//! board.place("e1".parse().unwrap(), Piece::new(Color::White, PieceKind::King));
//! board.place("e8".parse().unwrap(), Piece::new(Color::Black, PieceKind::King));
//!
//! let fen = Fen::new(Placement::from_occupancy(&board), Color::White);
//! assert_eq!(fen.to_string(), "4k3/8/8/8/8/8/8/4K3 w - - 0 0");
//! ```

mod error;
mod fen;
mod grid;
mod mapper;
mod occupancy;
mod piece;
mod square;

pub use error::FenError;
pub use fen::{is_valid_fen, CastlingRights, Fen, Placement};
pub use grid::BoardGrid;
pub use mapper::{ClassScores, MapperParams, PieceDetection, SquareMapper};
pub use occupancy::Occupancy;
pub use piece::{Color, Piece, PieceKind, PIECE_CLASSES};
pub use square::Square;
