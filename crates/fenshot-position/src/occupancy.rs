use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Piece, Square};

/// 8x8 board contents: row 0 = rank 8, column 0 = file a.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupancy {
    cells: [[Option<Piece>; 8]; 8],
}

impl Occupancy {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [[Option<Piece>; 8]; 8]) -> Self {
        Self { cells }
    }

    /// Fold `(square, piece)` pairs into a board; a later pair on the same
    /// square replaces the earlier one.
    pub fn from_placements<'a>(pairs: impl IntoIterator<Item = &'a (Square, Piece)>) -> Self {
        let mut occ = Self::empty();
        for &(sq, piece) in pairs {
            occ.place(sq, piece);
        }
        occ
    }

    #[inline]
    pub fn cells(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.row()][sq.col()]
    }

    /// Put `piece` on `sq`, returning whatever was there.
    pub fn place(&mut self, sq: Square, piece: Piece) -> Option<Piece> {
        let previous = self.cells[sq.row()][sq.col()].replace(piece);
        if let Some(prev) = previous {
            debug!("{sq}: {prev} replaced by {piece}");
        }
        previous
    }

    pub fn clear(&mut self, sq: Square) -> Option<Piece> {
        self.cells[sq.row()][sq.col()].take()
    }

    pub fn piece_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Occupied squares in grid order (rank 8 first).
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, rank)| {
            rank.iter().enumerate().filter_map(move |(col, cell)| {
                let piece = (*cell)?;
                Some((Square::from_row_col(row, col)?, piece))
            })
        })
    }

    /// Rank order reversed, files unchanged.
    pub fn flipped_ranks(&self) -> Self {
        let mut cells = self.cells;
        cells.reverse();
        Self { cells }
    }

    /// Files reversed within every rank.
    pub fn mirrored_files(&self) -> Self {
        let mut cells = self.cells;
        for rank in cells.iter_mut() {
            rank.reverse();
        }
        Self { cells }
    }

    /// The board seen from the other side.
    pub fn rotated_180(&self) -> Self {
        self.flipped_ranks().mirrored_files()
    }
}

/// Text diagram, rank 8 on top, `.` for empty squares.
impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, rank) in self.cells.iter().enumerate() {
            write!(f, "{} ", 8 - row)?;
            for cell in rank {
                match cell {
                    Some(p) => write!(f, "{p}")?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  abcdefgh")
    }
}
