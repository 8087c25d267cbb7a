//! Core input/output types for neighbor queries.

use glam::Vec3;

/// Trait for types that can be used as input points.
///
/// Lets callers hand over coordinates from arrays, tuples, or glam vectors
/// without converting them first. 2D points must carry `z = 0`.
pub trait PointLike {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn z(&self) -> f32;

    #[inline]
    fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.x(), self.y(), self.z())
    }
}

impl PointLike for Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
    #[inline]
    fn to_vec3(&self) -> Vec3 {
        *self
    }
}

impl PointLike for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

impl PointLike for (f32, f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }
    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
    #[inline]
    fn z(&self) -> f32 {
        self.2
    }
}

/// Collect any point-like slice into the contiguous `Vec3` layout used internally.
pub(crate) fn collect_points<P: PointLike>(points: &[P]) -> Vec<Vec3> {
    points.iter().map(PointLike::to_vec3).collect()
}

/// One discovered or stored neighbor relationship.
///
/// `point` indexes the reference (indexed) point set, `query_point` the set the
/// query was issued for. `weight` is 1 unless the producer defines a weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborBond {
    pub query_point: usize,
    pub point: usize,
    pub distance: f32,
    pub weight: f32,
}

impl NeighborBond {
    #[inline]
    pub fn new(query_point: usize, point: usize, distance: f32) -> Self {
        Self {
            query_point,
            point,
            distance,
            weight: 1.0,
        }
    }

    #[inline]
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_like_trait() {
        fn accepts_like<P: PointLike>(p: &P) -> f32 {
            p.x() + p.y() + p.z()
        }

        let v = Vec3::new(1.0, 2.0, 3.0);
        let arr = [1.0f32, 2.0, 3.0];
        let tuple = (1.0f32, 2.0f32, 3.0f32);

        assert_eq!(accepts_like(&v), 6.0);
        assert_eq!(accepts_like(&arr), 6.0);
        assert_eq!(accepts_like(&tuple), 6.0);
        assert_eq!(arr.to_vec3(), v);
    }

    #[test]
    fn test_bond_default_weight() {
        let bond = NeighborBond::new(3, 7, 0.5);
        assert_eq!(bond.weight, 1.0);
        assert_eq!(bond.with_weight(0.25).weight, 0.25);
    }
}
