#![allow(dead_code)]

use cell_locality::SimBox;
use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generate points uniformly distributed inside `sim_box`.
pub fn random_box_points(sim_box: &SimBox, n: usize, seed: u64) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_box_points_with_rng(sim_box, n, &mut rng)
}

pub fn random_box_points_with_rng<R: Rng + ?Sized>(
    sim_box: &SimBox,
    n: usize,
    rng: &mut R,
) -> Vec<Vec3> {
    let half = sim_box.lengths() * 0.5;
    (0..n)
        .map(|_| {
            let x = rng.gen_range(-half.x..half.x);
            let y = rng.gen_range(-half.y..half.y);
            let z = if sim_box.is_2d() {
                0.0
            } else {
                rng.gen_range(-half.z..half.z)
            };
            Vec3::new(x, y, z)
        })
        .collect()
}

/// Points packed against the box faces (within `margin` of at least one face).
///
/// Exercises periodic wrap and clamping at the edges.
pub fn near_face_points(sim_box: &SimBox, n: usize, margin: f32, seed: u64) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let half = sim_box.lengths() * 0.5;
    let axes = if sim_box.is_2d() { 2 } else { 3 };
    (0..n)
        .map(|_| {
            let mut p = random_box_points_with_rng(sim_box, 1, &mut rng)[0].to_array();
            let axis = rng.gen_range(0..axes);
            let h = half.to_array()[axis];
            let depth = rng.gen_range(0.0..margin);
            p[axis] = if rng.gen_bool(0.5) { h - depth } else { -h + depth };
            Vec3::from_array(p)
        })
        .collect()
}

/// Jittered cubic lattice with `per_axis` points along each active axis.
pub fn jittered_lattice(sim_box: &SimBox, per_axis: usize, jitter: f32, seed: u64) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let l = sim_box.lengths();
    let step = l / per_axis as f32;
    let nz = if sim_box.is_2d() { 1 } else { per_axis };
    let mut out = Vec::with_capacity(per_axis * per_axis * nz);
    for i in 0..per_axis {
        for j in 0..per_axis {
            for k in 0..nz {
                let mut p = Vec3::new(
                    -0.5 * l.x + (i as f32 + 0.5) * step.x,
                    -0.5 * l.y + (j as f32 + 0.5) * step.y,
                    if sim_box.is_2d() {
                        0.0
                    } else {
                        -0.5 * l.z + (k as f32 + 0.5) * step.z
                    },
                );
                if jitter > 0.0 {
                    p.x += rng.gen_range(-jitter..jitter);
                    p.y += rng.gen_range(-jitter..jitter);
                    if !sim_box.is_2d() {
                        p.z += rng.gen_range(-jitter..jitter);
                    }
                }
                out.push(p);
            }
        }
    }
    out
}

/// Indices of points within `r_max` of `q` (inclusive), ascending.
pub fn brute_force_ball(sim_box: &SimBox, points: &[Vec3], q: Vec3, r_max: f32) -> Vec<usize> {
    let r_sq = r_max * r_max;
    (0..points.len())
        .filter(|&j| sim_box.distance_sq(q, points[j]) <= r_sq)
        .collect()
}

/// `(distance², index)` of every point, ascending with lower index first on ties.
pub fn brute_force_sorted(sim_box: &SimBox, points: &[Vec3], q: Vec3) -> Vec<(f32, usize)> {
    let mut all: Vec<(f32, usize)> = points
        .iter()
        .enumerate()
        .map(|(j, &p)| (sim_box.distance_sq(q, p), j))
        .collect();
    all.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    all
}
