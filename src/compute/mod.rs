//! Parallel pair-compute driver.
//!
//! Applies a caller callback `f(point, query_point, distance, weight)` to every
//! bond of a finalized [`NeighborList`] or to every pair discovered by live
//! queries. Work is range-partitioned across a rayon pool; no ordering holds
//! across tasks, so callbacks accumulate through atomics, locks, or a
//! [`ScratchPool`] reduced afterwards.

mod scratch;

pub use scratch::ScratchPool;

use glam::Vec3;
use rayon::prelude::*;

use crate::error::LocalityError;
use crate::kd_tree::KdTreeQuery;
use crate::neighbor_list::NeighborList;
use crate::query::{Indexing, NeighborQuery, PointSource, QueryArgs};

/// Query points per rayon task. Each task owns one iterator at a time.
const MIN_QUERIES_PER_TASK: usize = 32;

/// Thread-count selection for [`PairCompute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// `None` runs on rayon's global pool.
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }
}

/// Fork-join driver over bonds or live queries.
#[derive(Debug, Default)]
pub struct PairCompute {
    pool: Option<rayon::ThreadPool>,
}

impl PairCompute {
    pub fn new(config: ParallelConfig) -> Result<Self, LocalityError> {
        let pool = match config.num_threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("pair-compute-{i}"))
                    .build()?;
                log::debug!("pair compute pool: {} threads", pool.current_num_threads());
                Some(pool)
            }
            None => None,
        };
        Ok(Self { pool })
    }

    /// Workers available to this driver.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Run `op` inside this driver's pool (or inline on the global pool).
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Scratch buffers sized for this driver's workers.
    pub fn scratch_pool<T: Default + Clone + Send>(&self, len: usize) -> ScratchPool<T> {
        ScratchPool::new(self.num_threads(), len)
    }

    /// Call `f` once per stored bond, processing contiguous chunks concurrently.
    pub fn for_each_bond<F>(&self, nlist: &NeighborList, f: F)
    where
        F: Fn(usize, usize, f32, f32) + Sync + Send,
    {
        let bonds = nlist.bonds();
        if bonds.is_empty() {
            return;
        }
        let chunk = bonds.len().div_ceil(self.num_threads() * 4).max(1);
        self.install(|| {
            bonds.par_chunks(chunk).for_each(|chunk| {
                for b in chunk {
                    f(b.point, b.query_point, b.distance, b.weight);
                }
            });
        });
    }

    /// Query every point of `query_points` against `source` and call `f` per pair.
    ///
    /// Unindexed sources get a [`KdTreeQuery`] built over them first. Pairs whose
    /// reference id equals the query id are dropped when `args.exclude_self` is set.
    pub fn for_each_pair<S, F>(
        &self,
        source: &S,
        query_points: &[Vec3],
        args: &QueryArgs,
        f: F,
    ) -> Result<(), LocalityError>
    where
        S: PointSource + ?Sized,
        F: Fn(usize, usize, f32, f32) + Sync + Send,
    {
        let fallback;
        let index: &dyn NeighborQuery = match source.indexing() {
            Indexing::Ready(index) => index,
            Indexing::NeedsIndex { sim_box, points } => {
                log::debug!("building kd tree over {} unindexed points", points.len());
                fallback = KdTreeQuery::new(sim_box, points)?;
                &fallback
            }
        };
        index.validate(args)?;

        let exclude_self = args.exclude_self;
        self.install(|| {
            (0..query_points.len())
                .into_par_iter()
                .with_min_len(MIN_QUERIES_PER_TASK)
                .for_each(|i| {
                    for bond in index.query_single(query_points[i], i, args) {
                        if exclude_self && bond.point == i {
                            continue;
                        }
                        f(bond.point, bond.query_point, bond.distance, bond.weight);
                    }
                });
        });
        Ok(())
    }
}
