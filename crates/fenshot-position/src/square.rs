use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FenError;

/// A board square: file `0..8` (a..h) and rank `1..=8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && (1..=8).contains(&rank)).then_some(Self { file, rank })
    }

    /// Square at occupancy row `row` (0 = rank 8) and column `col` (0 = file a).
    pub fn from_row_col(row: usize, col: usize) -> Option<Self> {
        if row >= 8 || col >= 8 {
            return None;
        }
        Self::new(col as u8, 8 - row as u8)
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.file
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.rank
    }

    #[inline]
    pub fn row(self) -> usize {
        (8 - self.rank) as usize
    }

    #[inline]
    pub fn col(self) -> usize {
        self.file as usize
    }

    #[inline]
    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    /// Lowercase coordinate as used by UCI (`e1`).
    pub fn uci(self) -> String {
        format!("{}{}", self.file_char(), self.rank)
    }
}

/// Uppercase coordinate (`E1`).
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char().to_ascii_uppercase(), self.rank)
    }
}

impl FromStr for Square {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(FenError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        Square::new(file, rank).ok_or_else(|| FenError::InvalidSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = FenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}
