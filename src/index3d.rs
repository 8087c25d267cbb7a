//! Flat indexing for 3D cell coordinates.

use glam::UVec3;

/// Row-major mapping between `(x, y, z)` coordinates and a flat index.
///
/// `x` varies fastest: `index = x + w * (y + h * z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index3D {
    w: u32,
    h: u32,
    d: u32,
}

impl Index3D {
    #[inline]
    pub const fn new(w: u32, h: u32, d: u32) -> Self {
        Self { w, h, d }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.w
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.h
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.d
    }

    /// Dimensions as a vector.
    #[inline]
    pub fn dims(&self) -> UVec3 {
        UVec3::new(self.w, self.h, self.d)
    }

    /// Total element count, saturating at `u64::MAX`.
    #[inline]
    pub fn num_elements(&self) -> u64 {
        (self.w as u64)
            .saturating_mul(self.h as u64)
            .saturating_mul(self.d as u64)
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32, z: u32) -> u32 {
        debug_assert!(x < self.w && y < self.h && z < self.d);
        x + self.w * (y + self.h * z)
    }

    #[inline]
    pub fn index_of(&self, c: UVec3) -> u32 {
        self.index(c.x, c.y, c.z)
    }

    /// Inverse of [`Index3D::index`].
    #[inline]
    pub fn coords(&self, idx: u32) -> UVec3 {
        let x = idx % self.w;
        let rest = idx / self.w;
        UVec3::new(x, rest % self.h, rest / self.h)
    }
}
