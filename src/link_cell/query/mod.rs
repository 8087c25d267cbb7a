//! Ball and k-nearest queries over a `LinkCell`.
//!
//! Both query kinds share one [`ShellWalker`]; they differ only in what they do
//! with each candidate and when they stop:
//! - ball: emit every candidate with `d <= r_max` as it is found; stop after the
//!   last shell that can still hold such a point.
//! - nearest: keep the best `k` candidates ordered by `(distance, point id)`;
//!   after each completed shell, emit the prefix the shell bound has certified.

mod walker;

use std::cmp::Ordering;

use glam::Vec3;

use self::walker::{ShellWalker, Step};
use super::LinkCell;
use crate::error::LocalityError;
use crate::query::{NeighborIter, NeighborQuery, QueryArgs, QueryBatch, QueryMode};
use crate::sim_box::SimBox;
use crate::types::NeighborBond;

/// A f32 wrapper that implements Ord using total_cmp.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF32(f32);

impl Eq for OrdF32 {}

impl PartialOrd for OrdF32 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF32 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl OrdF32 {
    #[inline]
    fn get(self) -> f32 {
        self.0
    }
}

/// Bounded best-k buffer with an emitted prefix that never changes.
struct Nearest {
    k: usize,
    r_max_sq: f32,
    bound_width: f32,
    /// Ascending by `(d_sq, id)`; at most `k` entries.
    buffer: Vec<(OrdF32, u32)>,
    /// Entries `..ready` are final.
    ready: usize,
    /// Entries `..emitted` have been yielded.
    emitted: usize,
    finished: bool,
}

impl Nearest {
    fn offer(&mut self, id: u32, d_sq: f32) {
        if d_sq > self.r_max_sq {
            return;
        }
        let cand = (OrdF32(d_sq), id);
        if self.buffer.len() == self.k {
            match self.buffer.last() {
                Some(worst) if cand < *worst => {
                    self.buffer.pop();
                }
                _ => return,
            }
        }
        // Later shells never beat certified entries; the clamp only absorbs rounding.
        let pos = self.buffer.partition_point(|c| *c < cand).max(self.ready);
        self.buffer.insert(pos, cand);
    }

    fn certify(&mut self, range: u32) {
        let bound = if range == 0 {
            0.0
        } else {
            range as f32 * self.bound_width
        };
        let bound_sq = bound * bound;
        self.ready = self
            .buffer
            .partition_point(|c| c.0.get() < bound_sq)
            .max(self.ready);
        if self.ready == self.k {
            self.finished = true;
        }
    }

    fn finish(&mut self) {
        self.ready = self.buffer.len();
        self.finished = true;
    }
}

enum Policy {
    Ball { r_max_sq: f32 },
    Nearest(Nearest),
}

/// Lazy neighbor sequence for one query point.
///
/// Ball queries yield bonds in traversal order. k-nearest queries yield them in
/// ascending `(distance, point id)` order. Once `next` returns `None` it keeps
/// returning `None`.
pub struct CellQueryIter<'a> {
    walker: ShellWalker<'a>,
    query_idx: usize,
    exclude_self: bool,
    policy: Policy,
}

impl<'a> CellQueryIter<'a> {
    /// Start a query. `args` must already be validated against the index's box.
    pub(crate) fn new(index: &'a LinkCell, point: Vec3, query_idx: usize, args: &QueryArgs) -> Self {
        let grid = index.grid();
        let bound_width = grid.bound_width();
        let (max_range, policy) = match args.mode {
            QueryMode::Ball { r_max } => {
                let extra = if r_max == grid.cell_width() { 0 } else { 1 };
                let range = shells_for(r_max, bound_width).saturating_add(extra);
                (
                    range,
                    Policy::Ball {
                        r_max_sq: r_max * r_max,
                    },
                )
            }
            QueryMode::Nearest {
                num_neighbors,
                r_max,
            } => {
                let range = if r_max.is_finite() {
                    shells_for(r_max, bound_width).saturating_add(1)
                } else {
                    u32::MAX
                };
                (
                    range,
                    Policy::Nearest(Nearest {
                        k: num_neighbors,
                        r_max_sq: r_max * r_max,
                        bound_width,
                        buffer: Vec::with_capacity(num_neighbors.min(1024)),
                        ready: 0,
                        emitted: 0,
                        finished: false,
                    }),
                )
            }
        };

        Self {
            walker: ShellWalker::new(index, point, max_range),
            query_idx,
            exclude_self: args.exclude_self,
            policy,
        }
    }

    /// The query point this iterator searches around.
    pub fn query_point(&self) -> Vec3 {
        self.walker.query()
    }

    /// Point id reported on every bond.
    pub fn query_idx(&self) -> usize {
        self.query_idx
    }
}

impl Iterator for CellQueryIter<'_> {
    type Item = NeighborBond;

    fn next(&mut self) -> Option<NeighborBond> {
        let query_idx = self.query_idx;
        let exclude_self = self.exclude_self;
        let skip = |id: u32| exclude_self && id as usize == query_idx;

        match &mut self.policy {
            Policy::Ball { r_max_sq } => loop {
                match self.walker.step() {
                    Step::Point(id, d_sq) if d_sq <= *r_max_sq && !skip(id) => {
                        return Some(NeighborBond::new(query_idx, id as usize, d_sq.sqrt()));
                    }
                    Step::Point(..) | Step::ShellDone(_) => {}
                    Step::Exhausted => return None,
                }
            },
            Policy::Nearest(nearest) => loop {
                if nearest.emitted < nearest.ready {
                    let (d_sq, id) = nearest.buffer[nearest.emitted];
                    nearest.emitted += 1;
                    return Some(NeighborBond::new(
                        query_idx,
                        id as usize,
                        d_sq.get().sqrt(),
                    ));
                }
                if nearest.finished {
                    return None;
                }
                match self.walker.step() {
                    Step::Point(id, d_sq) if !skip(id) => nearest.offer(id, d_sq),
                    Step::Point(..) => {}
                    Step::ShellDone(range) => nearest.certify(range),
                    Step::Exhausted => nearest.finish(),
                }
            },
        }
    }
}

impl std::iter::FusedIterator for CellQueryIter<'_> {}

/// Smallest shell count whose bound covers `r_max`.
#[inline]
fn shells_for(r_max: f32, bound_width: f32) -> u32 {
    // `as` saturates, so huge ratios clamp to u32::MAX.
    (r_max / bound_width).ceil() as u32
}

impl LinkCell {
    /// Query a single point.
    ///
    /// `query_idx` is reported as [`NeighborBond::query_point`] and, with
    /// `exclude_self`, names the reference point to skip.
    pub fn query_point(
        &self,
        point: Vec3,
        query_idx: usize,
        args: &QueryArgs,
    ) -> Result<CellQueryIter<'_>, LocalityError> {
        args.validate(self.sim_box())?;
        Ok(CellQueryIter::new(self, point, query_idx, args))
    }

    /// Validate `args` once and prepare per-point queries for `query_points`.
    pub fn query<'a>(
        &'a self,
        query_points: &'a [Vec3],
        args: QueryArgs,
    ) -> Result<QueryBatch<'a>, LocalityError> {
        QueryBatch::new(self, query_points, args)
    }
}

impl NeighborQuery for LinkCell {
    fn sim_box(&self) -> &SimBox {
        LinkCell::sim_box(self)
    }

    fn points(&self) -> &[Vec3] {
        LinkCell::points(self)
    }

    fn query_single(&self, point: Vec3, query_idx: usize, args: &QueryArgs) -> NeighborIter<'_> {
        Box::new(CellQueryIter::new(self, point, query_idx, args))
    }
}
