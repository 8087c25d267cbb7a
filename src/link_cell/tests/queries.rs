use super::super::*;
use crate::query::QueryArgs;
use crate::types::NeighborBond;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_points(sim_box: &SimBox, n: usize, seed: u64) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let l = sim_box.lengths();
    (0..n)
        .map(|_| {
            let p = Vec3::new(
                (rng.gen::<f32>() - 0.5) * l.x,
                (rng.gen::<f32>() - 0.5) * l.y,
                (rng.gen::<f32>() - 0.5) * l.z,
            );
            if sim_box.is_2d() {
                Vec3::new(p.x, p.y, 0.0)
            } else {
                p
            }
        })
        .collect()
}

fn brute_ball(sim_box: &SimBox, points: &[Vec3], q: Vec3, r_max: f32) -> Vec<usize> {
    let r_sq = r_max * r_max;
    (0..points.len())
        .filter(|&j| sim_box.distance_sq(q, points[j]) <= r_sq)
        .collect()
}

fn sorted_ids(bonds: &[NeighborBond]) -> Vec<usize> {
    let mut ids: Vec<usize> = bonds.iter().map(|b| b.point).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn test_chains_cover_every_point_once() {
    let sim_box = SimBox::new(9.0, 7.0, 5.0);
    let points = random_points(&sim_box, 500, 7);
    let index = LinkCell::new(sim_box, 1.3, &points).unwrap();

    let mut seen = vec![0u32; points.len()];
    for cell in 0..index.num_cells() as u32 {
        for p in index.iter_cell(cell) {
            assert_eq!(index.cell_of(points[p as usize]), cell);
            seen[p as usize] += 1;
        }
    }
    assert!(seen.iter().all(|&c| c == 1), "points lost or duplicated");
}

#[test]
fn test_ball_matches_brute_force_small_grid() {
    // 3x3x3 cells: shells wrap onto already-searched cells.
    let sim_box = SimBox::cube(6.0);
    let points = random_points(&sim_box, 200, 11);
    let index = LinkCell::new(sim_box, 2.0, &points).unwrap();

    for r_max in [0.5f32, 1.0, 2.0, 2.9] {
        let args = QueryArgs::ball(r_max);
        for (i, &q) in points.iter().enumerate().take(50) {
            let bonds: Vec<_> = index.query_point(q, i, &args).unwrap().collect();
            assert_eq!(
                sorted_ids(&bonds),
                brute_ball(&sim_box, &points, q, r_max),
                "r_max={}, query={}",
                r_max,
                i
            );
        }
    }
}

#[test]
fn test_ball_r_max_equal_to_cell_width() {
    let sim_box = SimBox::cube(10.0);
    let points = random_points(&sim_box, 300, 3);
    let index = LinkCell::new(sim_box, 2.0, &points).unwrap();
    let args = QueryArgs::ball(2.0);
    for (i, &q) in points.iter().enumerate().take(60) {
        let bonds: Vec<_> = index.query_point(q, i, &args).unwrap().collect();
        assert_eq!(sorted_ids(&bonds), brute_ball(&sim_box, &points, q, 2.0));
    }
}

#[test]
fn test_nearest_finds_everything_when_k_exceeds_n() {
    let sim_box = SimBox::cube(8.0);
    let points = random_points(&sim_box, 40, 5);
    let index = LinkCell::new(sim_box, 1.0, &points).unwrap();

    let bonds: Vec<_> = index
        .query_point(Vec3::ZERO, 0, &QueryArgs::nearest(100))
        .unwrap()
        .collect();
    assert_eq!(bonds.len(), 40);
    assert!(bonds.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn test_nearest_tie_break_lower_id() {
    let sim_box = SimBox::cube(10.0).non_periodic();
    // Four points at equal distance from the origin.
    let points = vec![
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
    ];
    let index = LinkCell::new(sim_box, 2.0, &points).unwrap();
    let bonds: Vec<_> = index
        .query_point(Vec3::ZERO, 99, &QueryArgs::nearest(2))
        .unwrap()
        .collect();
    let ids: Vec<usize> = bonds.iter().map(|b| b.point).collect();
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_iterators_are_fused() {
    let sim_box = SimBox::cube(10.0);
    let points = random_points(&sim_box, 20, 1);
    let index = LinkCell::new(sim_box, 2.0, &points).unwrap();
    for args in [QueryArgs::ball(1.0), QueryArgs::nearest(3)] {
        let mut iter = index.query_point(points[0], 0, &args).unwrap();
        while iter.next().is_some() {}
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }
}

#[test]
fn test_rebuild_keeps_grid() {
    let sim_box = SimBox::cube(10.0);
    let mut index = LinkCell::new(sim_box, 2.0, &random_points(&sim_box, 50, 1)).unwrap();
    let before = index.cell_neighbors(0);

    let points = random_points(&sim_box, 80, 2);
    index.rebuild(&points).unwrap();
    assert_eq!(index.num_points(), 80);
    assert_eq!(&before[..], &index.cell_neighbors(0)[..]);

    let total: usize = (0..index.num_cells() as u32)
        .map(|c| index.iter_cell(c).count())
        .sum();
    assert_eq!(total, 80);
}

#[test]
fn test_rebuild_rejects_outside_points() {
    let sim_box = SimBox::cube(4.0).non_periodic();
    let mut index = LinkCell::new(sim_box, 1.0, &[Vec3::ZERO]).unwrap();
    let err = index.rebuild(&[Vec3::ZERO, Vec3::new(0.0, 2.5, 0.0)]);
    assert_eq!(err, Err(crate::error::LocalityError::PointOutsideBox { index: 1 }));
    assert_eq!(index.num_points(), 1);
}

#[test]
fn test_neighbor_range_config() {
    let sim_box = SimBox::cube(20.0);
    let config = LinkCellConfig::new(2.0).with_neighbor_range(2);
    let index = LinkCell::with_config(sim_box, config, &[Vec3::ZERO]).unwrap();
    assert_eq!(index.config().neighbor_range, 2);
    assert_eq!(index.cell_neighbors(0).len(), 125);
}
