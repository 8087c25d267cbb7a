//! Cell-list spatial index over a (possibly periodic) box.
//!
//! Points are bucketed into a uniform grid of cells at least `cell_width` wide.
//! Queries walk concentric shells of cells outward from the query's cell:
//! - ball queries stop once a shell can no longer hold a point within `r_max`;
//! - k-nearest queries stop once the shell distance bound certifies the best `k`.
//!
//! Build is single-threaded and O(n). Queries only read the index (the neighbor
//! cache is internally synchronized), so one `LinkCell` can serve many threads.

mod build;
mod chain;
mod grid;
mod neighbors;
mod query;
mod shell;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use glam::Vec3;

pub use chain::{CellChains, ChainCursor, CHAIN_END};
pub use grid::CellGrid;
pub use neighbors::CellNeighborCache;
pub use query::CellQueryIter;
pub use shell::{shell_len, shell_offsets, CellShellIter};

use crate::sim_box::SimBox;

/// Construction parameters for [`LinkCell`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkCellConfig {
    /// Minimum cell width along every active axis.
    pub cell_width: f32,
    /// Shell radius of the memoized neighborhood returned by
    /// [`LinkCell::cell_neighbors`]. Defaults to 1 (the 3×3×3 block).
    pub neighbor_range: u32,
}

impl LinkCellConfig {
    pub fn new(cell_width: f32) -> Self {
        Self {
            cell_width,
            neighbor_range: 1,
        }
    }

    pub fn with_neighbor_range(mut self, neighbor_range: u32) -> Self {
        self.neighbor_range = neighbor_range;
        self
    }
}

/// Cell-list index: grid, per-cell point chains, and a shared neighbor cache.
pub struct LinkCell {
    grid: CellGrid,
    points: Vec<Vec3>,
    chains: CellChains,
    cache: CellNeighborCache,
    config: LinkCellConfig,
}

impl LinkCell {
    #[inline]
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    #[inline]
    pub fn sim_box(&self) -> &SimBox {
        self.grid.sim_box()
    }

    #[inline]
    pub fn config(&self) -> &LinkCellConfig {
        &self.config
    }

    /// Indexed reference points, in input order.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.grid.num_cells()
    }

    #[inline]
    pub fn chains(&self) -> &CellChains {
        &self.chains
    }

    /// Cell id of an arbitrary point (need not be indexed).
    #[inline]
    pub fn cell_of(&self, p: Vec3) -> u32 {
        self.grid.cell_of(p)
    }

    /// Points assigned to `cell`, most recently inserted first.
    #[inline]
    pub fn iter_cell(&self, cell: u32) -> ChainCursor<'_> {
        self.chains.iter_cell(cell)
    }

    /// Memoized cells within `neighbor_range` shells of `cell`, including `cell`.
    ///
    /// # Panics
    /// If `cell >= num_cells()`.
    pub fn cell_neighbors(&self, cell: u32) -> Arc<[u32]> {
        self.cache.neighbors(&self.grid, cell)
    }

    /// Distinct cells of shell `range` around `cell` after periodic wrap.
    pub(crate) fn shell_cells(&self, cell: u32, range: u32) -> Arc<[u32]> {
        self.cache.shell(&self.grid, cell, range)
    }
}

impl std::fmt::Debug for LinkCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkCell")
            .field("dims", &self.grid.dims())
            .field("num_points", &self.points.len())
            .field("config", &self.config)
            .finish()
    }
}
