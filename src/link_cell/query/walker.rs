//! Shared shell traversal for both query policies.

use std::sync::Arc;

use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::link_cell::{ChainCursor, LinkCell};

/// One unit of progress from a [`ShellWalker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Step {
    /// Candidate point and its squared minimum-image distance to the query.
    Point(u32, f32),
    /// Every cell of this shell radius has been drained.
    ShellDone(u32),
    /// No cell is left within the walker's range. Repeats on every later call.
    Exhausted,
}

/// Drains cell chains shell by shell around the query's cell.
///
/// Each distinct cell is scanned once per query even when periodic wrap maps
/// several offsets (across shells) onto it.
pub(super) struct ShellWalker<'a> {
    index: &'a LinkCell,
    query: Vec3,
    home: u32,
    range: u32,
    max_range: u32,
    shell: Arc<[u32]>,
    shell_pos: usize,
    chain: ChainCursor<'a>,
    searched: FxHashSet<u32>,
    last_shell: bool,
}

impl<'a> ShellWalker<'a> {
    /// Walk shells `0..=max_range` around the cell of `query`.
    pub(super) fn new(index: &'a LinkCell, query: Vec3, max_range: u32) -> Self {
        let home = index.cell_of(query);
        let max_range = max_range.min(index.grid().max_range());
        Self {
            index,
            query,
            home,
            range: 0,
            max_range,
            shell: index.shell_cells(home, 0),
            shell_pos: 0,
            chain: ChainCursor::empty(),
            searched: FxHashSet::default(),
            last_shell: max_range == 0,
        }
    }

    #[inline]
    pub(super) fn query(&self) -> Vec3 {
        self.query
    }

    pub(super) fn step(&mut self) -> Step {
        loop {
            if let Some(p) = self.chain.next() {
                let d_sq = self
                    .index
                    .sim_box()
                    .distance_sq(self.query, self.index.points()[p as usize]);
                return Step::Point(p, d_sq);
            }

            if let Some(&cell) = self.shell.get(self.shell_pos) {
                self.shell_pos += 1;
                if self.searched.insert(cell) {
                    self.chain = self.index.iter_cell(cell);
                }
                continue;
            }

            if self.shell_pos == usize::MAX {
                return Step::Exhausted;
            }

            let finished = self.range;
            if self.last_shell {
                // Parks the cursor past every shell.
                self.shell_pos = usize::MAX;
            } else {
                self.range += 1;
                self.last_shell = self.range >= self.max_range;
                self.shell = self.index.shell_cells(self.home, self.range);
                self.shell_pos = 0;
            }
            return Step::ShellDone(finished);
        }
    }
}
