use fenshot_core::CANONICAL_SIDE;
use nalgebra::Point2;

use crate::Square;

/// Partition of the canonical square into 64 equal cells.
///
/// Row 0 is rank 8 (top of the image), column 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoardGrid {
    side: f32,
    cell: f32,
}

impl Default for BoardGrid {
    fn default() -> Self {
        Self::canonical()
    }
}

impl BoardGrid {
    /// 640x640 board, 80x80 cells.
    pub fn canonical() -> Self {
        Self::with_side(CANONICAL_SIDE as f32)
    }

    pub fn with_side(side: f32) -> Self {
        Self {
            side,
            cell: side / 8.0,
        }
    }

    #[inline]
    pub fn side(&self) -> f32 {
        self.side
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell
    }

    /// Square whose cell contains `p`, `None` outside the board.
    ///
    /// Cells are half-open: `[x0, x0 + cell) x [y0, y0 + cell)`.
    pub fn locate(&self, p: Point2<f32>) -> Option<Square> {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return None;
        }
        if p.x < 0.0 || p.y < 0.0 || p.x >= self.side || p.y >= self.side {
            return None;
        }
        let col = ((p.x / self.cell) as usize).min(7);
        let row = ((p.y / self.cell) as usize).min(7);
        Square::from_row_col(row, col)
    }

    /// Iteration order of the grid: rank 8 to rank 1, file a to h.
    pub fn squares(&self) -> impl Iterator<Item = Square> {
        (0..64).filter_map(|i| Square::from_row_col(i / 8, i % 8))
    }

    /// Flat index of `sq` in [`BoardGrid::squares`] order.
    #[inline]
    pub fn index_of(sq: Square) -> usize {
        sq.row() * 8 + sq.col()
    }

    /// Center of the cell for `sq`.
    pub fn cell_center(&self, sq: Square) -> Point2<f32> {
        Point2::new(
            (sq.col() as f32 + 0.5) * self.cell,
            (sq.row() as f32 + 0.5) * self.cell,
        )
    }
}
