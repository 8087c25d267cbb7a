//! Orthorhombic simulation box with optional periodic boundaries.
//!
//! The box is centered on the origin: a point is inside when every coordinate
//! lies in `[-L/2, L/2]`. 2D boxes ignore the z axis entirely.

use glam::Vec3;

/// Rectangular box, periodic per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimBox {
    lengths: Vec3,
    periodic: [bool; 3],
    is_2d: bool,
}

impl SimBox {
    /// 3D box, periodic in all axes.
    pub fn new(lx: f32, ly: f32, lz: f32) -> Self {
        Self {
            lengths: Vec3::new(lx, ly, lz),
            periodic: [true; 3],
            is_2d: false,
        }
    }

    /// Cubic 3D box, periodic in all axes.
    pub fn cube(l: f32) -> Self {
        Self::new(l, l, l)
    }

    /// 2D box in the xy plane, periodic in x and y.
    pub fn square(lx: f32, ly: f32) -> Self {
        Self {
            lengths: Vec3::new(lx, ly, 0.0),
            periodic: [true, true, false],
            is_2d: true,
        }
    }

    /// Override the periodic flags. The z flag is ignored for 2D boxes.
    pub fn with_periodic(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        if self.is_2d {
            self.periodic[2] = false;
        }
        self
    }

    /// Shorthand for `with_periodic([false; 3])`.
    pub fn non_periodic(self) -> Self {
        self.with_periodic([false; 3])
    }

    #[inline]
    pub fn lengths(&self) -> Vec3 {
        self.lengths
    }

    #[inline]
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    #[inline]
    pub fn is_2d(&self) -> bool {
        self.is_2d
    }

    /// Number of axes that carry geometry (2 or 3).
    #[inline]
    pub fn dims(&self) -> usize {
        if self.is_2d {
            2
        } else {
            3
        }
    }

    /// True when every active length is finite and positive.
    pub fn is_valid(&self) -> bool {
        self.lengths.to_array()[..self.dims()]
            .iter()
            .all(|&l| l.is_finite() && l > 0.0)
    }

    /// Fractional coordinates of `p`: `[0, 1)` on periodic axes, unbounded otherwise.
    #[inline]
    pub fn make_fraction(&self, p: Vec3) -> Vec3 {
        let mut frac = [0.0f32; 3];
        let p = p.to_array();
        let l = self.lengths.to_array();
        for axis in 0..self.dims() {
            let mut f = (p[axis] + 0.5 * l[axis]) / l[axis];
            if self.periodic[axis] {
                f -= f.floor();
                // f32 rounding can land exactly on 1.0 for tiny negative inputs.
                if f >= 1.0 {
                    f = 0.0;
                }
            }
            frac[axis] = f;
        }
        Vec3::from_array(frac)
    }

    /// Minimum-image displacement on periodic axes.
    #[inline]
    pub fn wrap(&self, d: Vec3) -> Vec3 {
        let mut out = d.to_array();
        let l = self.lengths.to_array();
        for axis in 0..3 {
            if axis >= self.dims() {
                out[axis] = 0.0;
            } else if self.periodic[axis] {
                out[axis] -= l[axis] * (out[axis] / l[axis]).round();
            }
        }
        Vec3::from_array(out)
    }

    /// Map a point into the primary image on periodic axes.
    #[inline]
    pub fn wrap_point(&self, p: Vec3) -> Vec3 {
        let mut out = p.to_array();
        let l = self.lengths.to_array();
        for axis in 0..3 {
            if axis >= self.dims() {
                out[axis] = 0.0;
            } else if self.periodic[axis] {
                let shifted = out[axis] + 0.5 * l[axis];
                out[axis] = shifted - l[axis] * (shifted / l[axis]).floor() - 0.5 * l[axis];
            }
        }
        Vec3::from_array(out)
    }

    /// Squared minimum-image distance between two points.
    #[inline]
    pub fn distance_sq(&self, a: Vec3, b: Vec3) -> f32 {
        self.wrap(b - a).length_squared()
    }

    /// True when `p` lies within the box on every non-periodic axis.
    pub fn contains(&self, p: Vec3) -> bool {
        let frac = self.make_fraction(p).to_array();
        (0..self.dims()).all(|axis| self.periodic[axis] || (0.0..=1.0).contains(&frac[axis]))
    }

    /// Largest cutoff that keeps minimum-image distances unambiguous.
    pub fn max_periodic_cutoff(&self) -> f32 {
        let l = self.lengths.to_array();
        (0..self.dims())
            .filter(|&axis| self.periodic[axis])
            .map(|axis| 0.5 * l[axis])
            .fold(f32::INFINITY, f32::min)
    }
}
