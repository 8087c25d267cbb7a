//! k-d tree index used when the reference points arrive unindexed.
//!
//! Periodic boxes are handled by querying every periodic image of the
//! (wrapped) query point against a tree of wrapped reference points and merging
//! hits by point id at their minimum-image distance. 2D boxes index `[x, y]`
//! only.

use std::num::NonZero;

use glam::Vec3;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use rustc_hash::FxHashMap;

use crate::error::LocalityError;
use crate::query::{NeighborIter, NeighborQuery, QueryArgs, QueryMode};
use crate::sim_box::SimBox;
use crate::types::{collect_points, NeighborBond, PointLike};
use crate::util::Timed;

enum Tree {
    Planar(ImmutableKdTree<f32, 2>),
    Spatial(ImmutableKdTree<f32, 3>),
}

impl Tree {
    fn build(sim_box: &SimBox, points: &[Vec3]) -> Self {
        let wrapped = points.iter().map(|&p| sim_box.wrap_point(p));
        if sim_box.is_2d() {
            let entries: Vec<[f32; 2]> = wrapped.map(|p| [p.x, p.y]).collect();
            Tree::Planar(ImmutableKdTree::new_from_slice(&entries))
        } else {
            let entries: Vec<[f32; 3]> = wrapped.map(|p| p.to_array()).collect();
            Tree::Spatial(ImmutableKdTree::new_from_slice(&entries))
        }
    }

    /// Point ids within squared distance `r_sq` of `q`.
    fn within(&self, q: Vec3, r_sq: f32) -> Vec<usize> {
        match self {
            Tree::Planar(tree) => tree
                .within_unsorted::<SquaredEuclidean>(&[q.x, q.y], r_sq)
                .into_iter()
                .map(|n| n.item as usize)
                .collect(),
            Tree::Spatial(tree) => tree
                .within_unsorted::<SquaredEuclidean>(&q.to_array(), r_sq)
                .into_iter()
                .map(|n| n.item as usize)
                .collect(),
        }
    }

    /// The `count` nearest ids to `q`, plus every id tied with the farthest of them.
    fn nearest(&self, q: Vec3, count: NonZero<usize>) -> Vec<usize> {
        let found: Vec<(f32, usize)> = match self {
            Tree::Planar(tree) => tree
                .nearest_n::<SquaredEuclidean>(&[q.x, q.y], count)
                .into_iter()
                .map(|n| (n.distance, n.item as usize))
                .collect(),
            Tree::Spatial(tree) => tree
                .nearest_n::<SquaredEuclidean>(&q.to_array(), count)
                .into_iter()
                .map(|n| (n.distance, n.item as usize))
                .collect(),
        };
        if found.len() < count.get() {
            return found.into_iter().map(|(_, id)| id).collect();
        }
        // Equidistant points beyond the first `count` are picked arbitrarily by the tree.
        let farthest = found.iter().fold(0.0f32, |acc, &(d_sq, _)| acc.max(d_sq));
        self.within(q, widen(farthest))
    }
}

/// Squared radius enlarged so rounding in the tree never drops a boundary hit.
fn widen(r_sq: f32) -> f32 {
    r_sq * (1.0 + 1e-5) + f32::EPSILON
}

/// Tree-backed index with the same query contract as `LinkCell`.
pub struct KdTreeQuery {
    sim_box: SimBox,
    points: Vec<Vec3>,
    /// `None` for an empty point set.
    tree: Option<Tree>,
    /// Query-point shifts covering every minimum image.
    image_shifts: Vec<Vec3>,
}

impl KdTreeQuery {
    pub fn new<P: PointLike>(sim_box: SimBox, points: &[P]) -> Result<Self, LocalityError> {
        if !sim_box.is_valid() {
            return Err(LocalityError::InvalidBox {
                lengths: sim_box.lengths().to_array(),
            });
        }
        let points = collect_points(points);
        if let Some(index) = points.iter().position(|&p| !sim_box.contains(p)) {
            return Err(LocalityError::PointOutsideBox { index });
        }

        let _t = Timed::debug("kd tree build");
        let tree = if points.is_empty() {
            None
        } else {
            Some(Tree::build(&sim_box, &points))
        };

        Ok(Self {
            image_shifts: image_shifts(&sim_box),
            sim_box,
            points,
            tree,
        })
    }

    /// Candidates from every image, keyed by point id at minimum-image distance.
    fn gather<F>(&self, point: Vec3, mut per_image: F) -> Vec<(f32, usize)>
    where
        F: FnMut(Vec3) -> Vec<usize>,
    {
        let base = self.sim_box.wrap_point(point);
        let mut best: FxHashMap<usize, f32> = FxHashMap::default();
        for &shift in &self.image_shifts {
            for id in per_image(base + shift) {
                best.entry(id)
                    .or_insert_with(|| self.sim_box.distance_sq(point, self.points[id]));
            }
        }
        let mut hits: Vec<(f32, usize)> = best.into_iter().map(|(id, d_sq)| (d_sq, id)).collect();
        hits.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits
    }
}

fn image_shifts(sim_box: &SimBox) -> Vec<Vec3> {
    let lengths = sim_box.lengths().to_array();
    let periodic = sim_box.periodic();
    let per_axis: Vec<Vec<f32>> = (0..3)
        .map(|axis| {
            if axis < sim_box.dims() && periodic[axis] {
                vec![0.0, -lengths[axis], lengths[axis]]
            } else {
                vec![0.0]
            }
        })
        .collect();

    let mut shifts = Vec::with_capacity(27);
    for &x in &per_axis[0] {
        for &y in &per_axis[1] {
            for &z in &per_axis[2] {
                shifts.push(Vec3::new(x, y, z));
            }
        }
    }
    shifts
}

impl NeighborQuery for KdTreeQuery {
    fn sim_box(&self) -> &SimBox {
        &self.sim_box
    }

    fn points(&self) -> &[Vec3] {
        &self.points
    }

    fn query_single(&self, point: Vec3, query_idx: usize, args: &QueryArgs) -> NeighborIter<'_> {
        let Some(tree) = self.tree.as_ref() else {
            return Box::new(std::iter::empty());
        };
        let exclude = |id: usize| args.exclude_self && id == query_idx;

        let hits: Vec<(f32, usize)> = match args.mode {
            QueryMode::Ball { r_max } => {
                let r_max_sq = r_max * r_max;
                let search = widen(r_max_sq);
                self.gather(point, |q| tree.within(q, search))
                    .into_iter()
                    .filter(|&(d_sq, id)| d_sq <= r_max_sq && !exclude(id))
                    .collect()
            }
            QueryMode::Nearest {
                num_neighbors,
                r_max,
            } => {
                let r_max_sq = r_max * r_max;
                let want = num_neighbors.saturating_add(1).min(self.points.len());
                let Some(want) = NonZero::new(want) else {
                    return Box::new(std::iter::empty());
                };
                self.gather(point, |q| tree.nearest(q, want))
                    .into_iter()
                    .filter(|&(d_sq, id)| d_sq <= r_max_sq && !exclude(id))
                    .take(num_neighbors)
                    .collect()
            }
        };

        Box::new(
            hits.into_iter()
                .map(move |(d_sq, id)| NeighborBond::new(query_idx, id, d_sq.sqrt())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_image_hit() {
        let sim_box = SimBox::cube(10.0);
        let points = [Vec3::new(4.9, 0.0, 0.0), Vec3::new(-4.9, 0.0, 0.0)];
        let tree = KdTreeQuery::new(sim_box, &points).unwrap();
        let args = QueryArgs::ball(0.5).exclude_self();
        let bonds: Vec<_> = tree.query_single(points[0], 0, &args).collect();
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].point, 1);
        assert!((bonds[0].distance - 0.2).abs() < 1e-4, "distance={}", bonds[0].distance);
    }

    #[test]
    fn test_nearest_sorted_and_capped() {
        let sim_box = SimBox::cube(20.0).non_periodic();
        let points: Vec<Vec3> = (0..6).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let tree = KdTreeQuery::new(sim_box, &points).unwrap();

        let bonds: Vec<_> = tree
            .query_single(Vec3::ZERO, 0, &QueryArgs::nearest(3))
            .collect();
        let ids: Vec<usize> = bonds.iter().map(|b| b.point).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let capped: Vec<_> = tree
            .query_single(Vec3::ZERO, 0, &QueryArgs::nearest_within(5, 1.5).exclude_self())
            .collect();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].point, 1);
    }

    #[test]
    fn test_empty_and_invalid() {
        let empty = KdTreeQuery::new(SimBox::cube(5.0), &[] as &[Vec3]).unwrap();
        assert_eq!(empty.query_single(Vec3::ZERO, 0, &QueryArgs::nearest(2)).count(), 0);

        let outside = KdTreeQuery::new(SimBox::cube(2.0).non_periodic(), &[Vec3::splat(3.0)]);
        assert!(matches!(outside, Err(LocalityError::PointOutsideBox { index: 0 })));
    }

    #[test]
    fn test_image_shift_counts() {
        assert_eq!(image_shifts(&SimBox::cube(1.0)).len(), 27);
        assert_eq!(image_shifts(&SimBox::square(1.0, 1.0)).len(), 9);
        assert_eq!(image_shifts(&SimBox::cube(1.0).non_periodic()).len(), 1);
    }

    fn brute_nearest(sim_box: &SimBox, points: &[Vec3], q: Vec3, k: usize) -> Vec<usize> {
        let mut all: Vec<(f32, usize)> = points
            .iter()
            .enumerate()
            .map(|(j, &p)| (sim_box.distance_sq(q, p), j))
            .collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        all.into_iter().take(k).map(|(_, j)| j).collect()
    }

    #[test]
    fn test_planar_tree_with_many_points() {
        let sim_box = SimBox::square(10.0, 6.0);
        // Row-major grid of 40 x 10 points, all with z = 0.
        let points: Vec<Vec3> = (0..400)
            .map(|i| Vec3::new((i % 40) as f32 * 0.25 - 4.9, (i / 40) as f32 * 0.6 - 2.9, 0.0))
            .collect();
        let tree = KdTreeQuery::new(sim_box, &points).unwrap();
        assert!(matches!(tree.tree, Some(Tree::Planar(_))));

        for (i, &q) in points.iter().enumerate().step_by(17) {
            let got: Vec<usize> = tree
                .query_single(q, i, &QueryArgs::nearest(7))
                .map(|b| b.point)
                .collect();
            assert_eq!(got, brute_nearest(&sim_box, &points, q, 7), "query {}", i);
        }
    }

    #[test]
    fn test_exact_lattice_ties() {
        let sim_box = SimBox::cube(8.0);
        let points: Vec<Vec3> = (0..512)
            .map(|i| Vec3::new((i % 8) as f32, ((i / 8) % 8) as f32, (i / 64) as f32) - 3.5)
            .collect();
        let tree = KdTreeQuery::new(sim_box, &points).unwrap();

        for (i, &q) in points.iter().enumerate().step_by(23) {
            let ball = tree
                .query_single(q, i, &QueryArgs::ball(1.0).exclude_self())
                .count();
            assert_eq!(ball, 6, "query {}", i);

            // Six face neighbors tie at 1, twelve edge neighbors tie at sqrt(2).
            let got: Vec<usize> = tree
                .query_single(q, i, &QueryArgs::nearest(10))
                .map(|b| b.point)
                .collect();
            assert_eq!(got, brute_nearest(&sim_box, &points, q, 10), "query {}", i);
        }
    }
}
