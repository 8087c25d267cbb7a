//! Cell-list neighbor search for points in a (possibly periodic) box.
//!
//! Points are bucketed into a uniform grid of cells. Queries walk concentric
//! shells of cells around the query point and support two modes:
//! - ball: every point within `r_max`
//! - k-nearest: the `k` closest points, optionally capped at `r_max`
//!
//! A [`PairCompute`] driver fans a pairwise callback out over all query points
//! (or over a finalized [`NeighborList`]) on a rayon pool, with optional
//! per-worker [`ScratchPool`] buffers for accumulation.
//!
//! # Example
//!
//! ```
//! use cell_locality::{LinkCell, QueryArgs, SimBox};
//! use glam::Vec3;
//!
//! let sim_box = SimBox::cube(10.0).non_periodic();
//! let points = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
//! let index = LinkCell::new(sim_box, 2.0, &points).expect("valid box");
//!
//! let args = QueryArgs::ball(1.5).exclude_self();
//! let bonds: Vec<_> = index.query_point(points[0], 0, &args).unwrap().collect();
//! assert_eq!(bonds.len(), 1);
//! assert_eq!(bonds[0].point, 1);
//! assert!((bonds[0].distance - 1.0).abs() < 1e-6);
//! ```

mod error;
mod index3d;
mod kd_tree;
mod neighbor_list;
mod query;
mod sim_box;
mod types;
mod util;

pub mod compute;
pub mod link_cell;

pub use compute::{PairCompute, ParallelConfig, ScratchPool};
pub use error::LocalityError;
pub use index3d::Index3D;
pub use kd_tree::KdTreeQuery;
pub use link_cell::{CellQueryIter, LinkCell, LinkCellConfig};
pub use neighbor_list::NeighborList;
pub use query::{
    Indexing, NeighborIter, NeighborQuery, PointSource, QueryArgs, QueryBatch, QueryMode,
    RawPoints,
};
pub use sim_box::SimBox;
pub use types::{NeighborBond, PointLike};
