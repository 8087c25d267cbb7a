//! Query arguments and the capability interface shared by spatial indices.
//!
//! An index that can answer per-point queries implements [`NeighborQuery`].
//! Anything the pair driver accepts as a reference point set implements
//! [`PointSource`], which says up front whether it is already queryable or must
//! be indexed first.

use glam::Vec3;
use rayon::prelude::*;

use crate::error::LocalityError;
use crate::neighbor_list::NeighborList;
use crate::sim_box::SimBox;
use crate::types::{collect_points, NeighborBond, PointLike};

/// Query points per rayon task when collecting a batch.
const MIN_QUERIES_PER_TASK: usize = 64;

/// What a query searches for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryMode {
    /// Every point with `distance <= r_max`.
    Ball { r_max: f32 },
    /// The `num_neighbors` closest points, optionally capped at `r_max`
    /// (`f32::INFINITY` for no cap).
    Nearest { num_neighbors: usize, r_max: f32 },
}

/// Query mode plus self-exclusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryArgs {
    pub mode: QueryMode,
    /// Skip the reference point whose index equals the query point's index.
    pub exclude_self: bool,
}

impl QueryArgs {
    pub fn ball(r_max: f32) -> Self {
        Self {
            mode: QueryMode::Ball { r_max },
            exclude_self: false,
        }
    }

    pub fn nearest(num_neighbors: usize) -> Self {
        Self::nearest_within(num_neighbors, f32::INFINITY)
    }

    pub fn nearest_within(num_neighbors: usize, r_max: f32) -> Self {
        Self {
            mode: QueryMode::Nearest {
                num_neighbors,
                r_max,
            },
            exclude_self: false,
        }
    }

    pub fn exclude_self(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    /// Radius cutoff (infinite for uncapped k-nearest queries).
    pub fn r_max(&self) -> f32 {
        match self.mode {
            QueryMode::Ball { r_max } | QueryMode::Nearest { r_max, .. } => r_max,
        }
    }

    /// Check the arguments against `sim_box`.
    ///
    /// Ball queries need a finite positive `r_max`; k-nearest queries need at
    /// least one neighbor and a positive (possibly infinite) `r_max`. A finite
    /// `r_max` may not exceed half a periodic box length.
    pub fn validate(&self, sim_box: &SimBox) -> Result<(), LocalityError> {
        let r_max = self.r_max();
        match self.mode {
            QueryMode::Ball { .. } => {
                if !(r_max.is_finite() && r_max > 0.0) {
                    return Err(LocalityError::InvalidRMax(r_max));
                }
            }
            QueryMode::Nearest { num_neighbors, .. } => {
                if num_neighbors == 0 {
                    return Err(LocalityError::InvalidNumNeighbors(num_neighbors));
                }
                if r_max.is_nan() || r_max <= 0.0 {
                    return Err(LocalityError::InvalidRMax(r_max));
                }
            }
        }

        let limit = sim_box.max_periodic_cutoff();
        if r_max.is_finite() && r_max > limit {
            return Err(LocalityError::RMaxTooLarge { r_max, limit });
        }
        Ok(())
    }
}

/// Per-point neighbor sequence handed out by a [`NeighborQuery`].
pub type NeighborIter<'a> = Box<dyn Iterator<Item = NeighborBond> + Send + 'a>;

/// A spatial index that can answer ball and k-nearest queries.
pub trait NeighborQuery: Sync {
    fn sim_box(&self) -> &SimBox;

    /// Indexed reference points.
    fn points(&self) -> &[Vec3];

    fn validate(&self, args: &QueryArgs) -> Result<(), LocalityError> {
        args.validate(self.sim_box())
    }

    /// Neighbors of `point`, reported with `query_idx` as the query id.
    ///
    /// `args` must have passed [`NeighborQuery::validate`]. The returned
    /// iterator honors `exclude_self` and is fused.
    fn query_single(&self, point: Vec3, query_idx: usize, args: &QueryArgs) -> NeighborIter<'_>;
}

/// How a reference point set becomes queryable.
pub enum Indexing<'a> {
    /// Already an index.
    Ready(&'a dyn NeighborQuery),
    /// Raw coordinates; the caller must build an index over them.
    NeedsIndex { sim_box: SimBox, points: &'a [Vec3] },
}

/// A reference point set accepted by the pair driver.
pub trait PointSource {
    fn indexing(&self) -> Indexing<'_>;
}

/// Unindexed points in a box.
#[derive(Debug, Clone)]
pub struct RawPoints {
    sim_box: SimBox,
    points: Vec<Vec3>,
}

impl RawPoints {
    pub fn new<P: PointLike>(sim_box: SimBox, points: &[P]) -> Self {
        Self {
            sim_box,
            points: collect_points(points),
        }
    }

    pub fn sim_box(&self) -> &SimBox {
        &self.sim_box
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl PointSource for RawPoints {
    fn indexing(&self) -> Indexing<'_> {
        Indexing::NeedsIndex {
            sim_box: self.sim_box,
            points: &self.points,
        }
    }
}

impl<T: NeighborQuery> PointSource for T {
    fn indexing(&self) -> Indexing<'_> {
        Indexing::Ready(self)
    }
}

/// Validated query arguments bound to an index and a set of query points.
pub struct QueryBatch<'a> {
    index: &'a dyn NeighborQuery,
    query_points: &'a [Vec3],
    args: QueryArgs,
}

impl<'a> QueryBatch<'a> {
    pub fn new(
        index: &'a dyn NeighborQuery,
        query_points: &'a [Vec3],
        args: QueryArgs,
    ) -> Result<Self, LocalityError> {
        index.validate(&args)?;
        Ok(Self {
            index,
            query_points,
            args,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.query_points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.query_points.is_empty()
    }

    #[inline]
    pub fn args(&self) -> &QueryArgs {
        &self.args
    }

    /// Fresh iterator for query point `i`.
    ///
    /// # Panics
    /// If `i >= len()`.
    pub fn query(&self, i: usize) -> NeighborIter<'a> {
        self.index.query_single(self.query_points[i], i, &self.args)
    }

    /// All bonds, query point by query point, on the current thread.
    pub fn iter(&self) -> impl Iterator<Item = NeighborBond> + '_ {
        (0..self.len()).flat_map(move |i| self.query(i))
    }

    /// Collect every bond in parallel, ordered by query point.
    pub fn to_neighbor_list(&self) -> NeighborList {
        let bonds: Vec<NeighborBond> = (0..self.len())
            .into_par_iter()
            .with_min_len(MIN_QUERIES_PER_TASK)
            .flat_map_iter(|i| self.query(i))
            .collect();
        NeighborList::from_bonds(bonds)
    }
}
