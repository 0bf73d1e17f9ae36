use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FenError;

/// Class order of the piece detector's probability vector.
pub const PIECE_CLASSES: &str = "PNBRQKpnbrqk";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A coloured piece, printed as its FEN letter (uppercase for White).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    pub fn from_fen_char(c: char) -> Result<Self, FenError> {
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return Err(FenError::InvalidPiece(c)),
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Self { color, kind })
    }

    pub fn fen_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Piece for detector class `index` in [`PIECE_CLASSES`] order.
    pub fn from_class_index(index: usize) -> Option<Self> {
        let c = PIECE_CLASSES.chars().nth(index)?;
        Self::from_fen_char(c).ok()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

impl TryFrom<char> for Piece {
    type Error = FenError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_fen_char(c)
    }
}

impl From<Piece> for char {
    fn from(p: Piece) -> Self {
        p.fen_char()
    }
}
