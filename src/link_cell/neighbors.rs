//! Memoized wrapped neighbor cells.
//!
//! Entries are pure functions of `(grid, cell, range)`, so concurrent misses on
//! the same key may compute the value twice; whichever insert lands first wins and
//! every reader observes that same value afterwards.

use std::sync::{Arc, RwLock};

use glam::IVec3;
use rustc_hash::{FxHashMap, FxHashSet};

use super::grid::CellGrid;
use super::shell::{shell_len, CellShellIter};

/// Lock stripes. Readers on different stripes never contend.
const NUM_SHARDS: usize = 16;

/// Cache key: one shell of one cell, or the full neighborhood of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Shell { cell: u32, range: u32 },
    Neighborhood { cell: u32 },
}

impl Key {
    #[inline]
    fn shard(&self) -> usize {
        let cell = match *self {
            Key::Shell { cell, .. } | Key::Neighborhood { cell } => cell,
        };
        cell as usize % NUM_SHARDS
    }
}

/// Striped concurrent map from cell to wrapped neighbor cell ids.
pub struct CellNeighborCache {
    shards: Box<[RwLock<FxHashMap<Key, Arc<[u32]>>>]>,
    /// Neighborhood radius for [`CellNeighborCache::neighbors`].
    neighbor_range: u32,
    /// Shells up to this radius are memoized; larger ones are computed per call.
    cached_range: u32,
}

impl CellNeighborCache {
    pub fn new(neighbor_range: u32) -> Self {
        Self {
            shards: (0..NUM_SHARDS)
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
            neighbor_range,
            cached_range: neighbor_range + 1,
        }
    }

    #[inline]
    pub fn neighbor_range(&self) -> u32 {
        self.neighbor_range
    }

    /// Distinct cells at shell `range` around `cell`, wrapped through the grid.
    ///
    /// Small or periodic grids can map several offsets (or the center) onto the same
    /// cell; each appears once, in first-enumerated order.
    pub fn shell(&self, grid: &CellGrid, cell: u32, range: u32) -> Arc<[u32]> {
        if range > self.cached_range {
            return compute_shell(grid, cell, range).into();
        }
        self.get_or_insert(grid, Key::Shell { cell, range }, || {
            compute_shell(grid, cell, range)
        })
    }

    /// Distinct cells within `neighbor_range` shells of `cell` (including `cell`).
    pub fn neighbors(&self, grid: &CellGrid, cell: u32) -> Arc<[u32]> {
        self.get_or_insert(grid, Key::Neighborhood { cell }, || {
            let mut seen = FxHashSet::default();
            let mut out = Vec::new();
            for range in 0..=self.neighbor_range {
                for &c in self.shell(grid, cell, range).iter() {
                    if seen.insert(c) {
                        out.push(c);
                    }
                }
            }
            out
        })
    }

    /// Number of memoized entries across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|m| m.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_insert<F>(&self, grid: &CellGrid, key: Key, compute: F) -> Arc<[u32]>
    where
        F: FnOnce() -> Vec<u32>,
    {
        let cell = match key {
            Key::Shell { cell, .. } | Key::Neighborhood { cell } => cell,
        };
        assert!(
            (cell as usize) < grid.num_cells(),
            "cell {} out of range ({} cells)",
            cell,
            grid.num_cells()
        );

        let shard = &self.shards[key.shard()];
        // A poisoned lock only means another reader panicked; the map itself is
        // never left half-written because values are inserted whole.
        if let Some(hit) = shard
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return Arc::clone(hit);
        }

        log::trace!("neighbor cache miss: {:?}", key);
        let value: Arc<[u32]> = compute().into();
        let mut map = shard.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(map.entry(key).or_insert(value))
    }
}

impl std::fmt::Debug for CellNeighborCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellNeighborCache")
            .field("neighbor_range", &self.neighbor_range)
            .field("entries", &self.len())
            .finish()
    }
}

/// Walk one shell of offsets around `cell` and resolve them to distinct cell ids.
fn compute_shell(grid: &CellGrid, cell: u32, range: u32) -> Vec<u32> {
    let dims = grid.dims();
    let axes = if grid.is_2d() { 2 } else { 3 };
    let window = 2 * range as u64 + 1;
    if range > 0 && (0..axes).any(|a| dims[a] as u64 <= window) {
        return compute_folded_shell(grid, cell, range);
    }

    let is_2d = grid.is_2d();
    let home = grid.coords(cell).as_ivec3();
    let end = CellShellIter::new(range + 1, is_2d);
    let mut iter = CellShellIter::new(range, is_2d);

    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(shell_len(range, is_2d).min(grid.num_cells()));
    while iter != end {
        let c = grid.cell_at(home + iter.offset());
        if seen.insert(c) {
            out.push(c);
        }
        iter.advance();
    }
    out
}

/// Same cells as [`compute_shell`] when some axis has at most `2 * range + 1` cells.
///
/// The shell is the union over axes `a` of the faces `offset[a] = ±range`. Along any
/// other axis whose offsets `-range..=range` already cover every cell, one pass over
/// `0..count` reaches the same wrapped cells.
fn compute_folded_shell(grid: &CellGrid, cell: u32, range: u32) -> Vec<u32> {
    let dims = grid.dims();
    let axes = if grid.is_2d() { 2 } else { 3 };
    let window = 2 * range as u64 + 1;
    let r = range as i32;
    let spans: Vec<Vec<i32>> = (0..3)
        .map(|b| {
            if b >= axes {
                vec![0]
            } else if dims[b] as u64 <= window {
                (0..dims[b] as i32).collect()
            } else {
                (-r..=r).collect()
            }
        })
        .collect();

    let home = grid.coords(cell).as_ivec3();
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for pinned in 0..axes {
        for side in [-r, r] {
            let pin = [side];
            let span = |b: usize| if b == pinned { &pin[..] } else { &spans[b][..] };
            for &z in span(2) {
                for &y in span(1) {
                    for &x in span(0) {
                        let c = grid.cell_at(home + IVec3::new(x, y, z));
                        if seen.insert(c) {
                            out.push(c);
                        }
                    }
                }
            }
        }
    }
    out
}
