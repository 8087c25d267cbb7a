//! Linked per-cell chains of point indices.
//!
//! One flat `links` array of length `n_points + n_cells`:
//! - `links[p]` for `p < n_points` is the previously inserted point in the same
//!   cell, or [`CHAIN_END`];
//! - `links[n_points + c]` is the head of cell `c` (most recently inserted point),
//!   or [`CHAIN_END`] if the cell is empty.

use glam::Vec3;

use super::grid::CellGrid;

/// Chain terminator, distinct from every valid point index.
pub const CHAIN_END: u32 = u32::MAX;

/// Per-cell point chains for one point-set snapshot.
#[derive(Debug, Clone)]
pub struct CellChains {
    links: Vec<u32>,
    n_points: usize,
    n_cells: usize,
}

impl CellChains {
    /// Empty chains for `n_cells` cells.
    pub fn new(n_cells: usize) -> Self {
        Self {
            links: vec![CHAIN_END; n_cells],
            n_points: 0,
            n_cells,
        }
    }

    /// Discard all chains and insert `points` in input order.
    ///
    /// Each chain is traversed last-inserted-first.
    pub fn rebuild(&mut self, grid: &CellGrid, points: &[Vec3]) {
        debug_assert_eq!(grid.num_cells(), self.n_cells);
        debug_assert!((points.len() as u64) < CHAIN_END as u64);

        let n = points.len();
        self.n_points = n;
        self.links.clear();
        self.links.resize(n + self.n_cells, CHAIN_END);

        for (i, &p) in points.iter().enumerate() {
            let head = n + grid.cell_of(p) as usize;
            self.links[i] = self.links[head];
            self.links[head] = i as u32;
        }
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.n_points
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.n_cells
    }

    /// Most recently inserted point of `cell`, or [`CHAIN_END`].
    #[inline]
    pub fn head(&self, cell: u32) -> u32 {
        self.links[self.n_points + cell as usize]
    }

    /// Cursor over the points of `cell`.
    #[inline]
    pub fn iter_cell(&self, cell: u32) -> ChainCursor<'_> {
        assert!(
            (cell as usize) < self.n_cells,
            "cell {} out of range ({} cells)",
            cell,
            self.n_cells
        );
        ChainCursor {
            links: &self.links,
            current: self.head(cell),
        }
    }
}

/// Cursor following one cell chain until [`CHAIN_END`].
///
/// Advancing an exhausted cursor is harmless: it keeps returning `None`.
#[derive(Debug, Clone, Copy)]
pub struct ChainCursor<'a> {
    links: &'a [u32],
    current: u32,
}

impl<'a> ChainCursor<'a> {
    /// A cursor that is already at its end.
    #[inline]
    pub fn empty() -> Self {
        Self {
            links: &[],
            current: CHAIN_END,
        }
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.current == CHAIN_END
    }
}

impl Iterator for ChainCursor<'_> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.current == CHAIN_END {
            return None;
        }
        let p = self.current;
        self.current = self.links[p as usize];
        Some(p)
    }
}

impl std::iter::FusedIterator for ChainCursor<'_> {}
