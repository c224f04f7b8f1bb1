//! Coordinate system for the 4x4 town grid.
//!
//! Cells are addressed by a linear index in row-major order:
//! `row = index / 4`, `col = index % 4`. This module provides:
//! - `CellIndex`: a checked linear index into the grid
//! - Conversions between linear index and (row, col)
//! - Orthogonal neighbours and row/column iteration used by scoring

use serde::{Deserialize, Serialize};

/// Width and height of the town grid
pub const GRID_SIZE: usize = 4;

/// Total number of cells on the grid
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// A cell position on the grid.
///
/// Construct with [`CellIndex::new`] to get bounds checking; the inner
/// value is always `< CELL_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct CellIndex(usize);

impl CellIndex {
    /// Create a cell index, returning `None` if it is off the grid
    pub fn new(index: usize) -> Option<Self> {
        (index < CELL_COUNT).then_some(Self(index))
    }

    /// Create a cell index from (row, col)
    pub fn from_row_col(row: usize, col: usize) -> Option<Self> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Some(Self(row * GRID_SIZE + col))
        } else {
            None
        }
    }

    /// The linear index
    pub fn index(&self) -> usize {
        self.0
    }

    /// Row of this cell (0 at the top)
    pub fn row(&self) -> usize {
        self.0 / GRID_SIZE
    }

    /// Column of this cell (0 at the left)
    pub fn col(&self) -> usize {
        self.0 % GRID_SIZE
    }

    /// Orthogonally adjacent cells (up, down, left, right), clipped to the grid
    pub fn neighbors(&self) -> Vec<CellIndex> {
        let (row, col) = (self.row(), self.col());
        let mut out = Vec::with_capacity(4);
        if row > 0 {
            out.push(Self(self.0 - GRID_SIZE));
        }
        if row < GRID_SIZE - 1 {
            out.push(Self(self.0 + GRID_SIZE));
        }
        if col > 0 {
            out.push(Self(self.0 - 1));
        }
        if col < GRID_SIZE - 1 {
            out.push(Self(self.0 + 1));
        }
        out
    }

    /// Every cell sharing this cell's row, including itself
    pub fn row_cells(&self) -> impl Iterator<Item = CellIndex> {
        let start = self.row() * GRID_SIZE;
        (start..start + GRID_SIZE).map(Self)
    }

    /// Every cell sharing this cell's column, including itself
    pub fn col_cells(&self) -> impl Iterator<Item = CellIndex> {
        let col = self.col();
        (0..GRID_SIZE).map(move |row| Self(row * GRID_SIZE + col))
    }

    /// All cells in index order
    pub fn all() -> impl Iterator<Item = CellIndex> {
        (0..CELL_COUNT).map(Self)
    }
}

impl TryFrom<usize> for CellIndex {
    type Error = String;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        CellIndex::new(value).ok_or_else(|| format!("cell index {} is off the grid", value))
    }
}

impl From<CellIndex> for usize {
    fn from(cell: CellIndex) -> usize {
        cell.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_col_roundtrip() {
        for cell in CellIndex::all() {
            assert_eq!(
                CellIndex::from_row_col(cell.row(), cell.col()),
                Some(cell)
            );
        }
        assert_eq!(CellIndex::new(6).map(|c| (c.row(), c.col())), Some((1, 2)));
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(CellIndex::new(16).is_none());
        assert!(CellIndex::from_row_col(4, 0).is_none());
        assert!(CellIndex::from_row_col(0, 4).is_none());
    }

    #[test]
    fn test_corner_has_two_neighbors() {
        let corner = CellIndex::new(0).unwrap();
        let mut n: Vec<usize> = corner.neighbors().iter().map(|c| c.index()).collect();
        n.sort();
        assert_eq!(n, vec![1, 4]);
    }

    #[test]
    fn test_center_has_four_neighbors() {
        let center = CellIndex::new(5).unwrap();
        let mut n: Vec<usize> = center.neighbors().iter().map(|c| c.index()).collect();
        n.sort();
        assert_eq!(n, vec![1, 4, 6, 9]);
    }

    #[test]
    fn test_neighbors_do_not_wrap_rows() {
        // index 3 is the end of row 0; index 4 starts row 1
        let edge = CellIndex::new(3).unwrap();
        assert!(!edge.neighbors().iter().any(|c| c.index() == 4));
    }

    #[test]
    fn test_row_and_col_cells() {
        let cell = CellIndex::new(6).unwrap();
        let row: Vec<usize> = cell.row_cells().map(|c| c.index()).collect();
        let col: Vec<usize> = cell.col_cells().map(|c| c.index()).collect();
        assert_eq!(row, vec![4, 5, 6, 7]);
        assert_eq!(col, vec![2, 6, 10, 14]);
    }

    #[test]
    fn test_serde_rejects_off_grid() {
        assert!(serde_json::from_str::<CellIndex>("16").is_err());
        let cell: CellIndex = serde_json::from_str("15").unwrap();
        assert_eq!(cell.index(), 15);
    }
}
