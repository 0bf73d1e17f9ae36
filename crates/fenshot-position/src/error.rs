/// Errors produced while building, parsing or validating positions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN placement structure: {placement:?}")]
    InvalidFenStructure { placement: String },
    #[error("rank {rank} covers {width} files, expected 8")]
    InvalidRankWidth { rank: u8, width: usize },
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: &'static str },
    #[error("{fen:?} is not a playable position: {reason}")]
    IllegalPosition { fen: String, reason: String },
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
    #[error("invalid piece symbol {0:?}")]
    InvalidPiece(char),
}
