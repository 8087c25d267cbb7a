//! Uniform cell partition of a simulation box.

use glam::{IVec3, UVec3, Vec3};

use crate::error::LocalityError;
use crate::index3d::Index3D;
use crate::sim_box::SimBox;

/// Cell ids are `u32`; `u32::MAX` is reserved as the chain terminator.
const MAX_CELLS: u64 = u32::MAX as u64 - 1;

/// Regular grid of cells covering a [`SimBox`].
///
/// Built once from a box and a minimum cell width; immutable afterwards.
#[derive(Debug, Clone)]
pub struct CellGrid {
    sim_box: SimBox,
    indexer: Index3D,
    /// Requested minimum width.
    cell_width: f32,
    /// Actual per-axis widths (`L / count`).
    widths: Vec3,
    /// Narrowest width among axes split into more than one cell.
    bound_width: f32,
    /// Shell radius at which every cell has been reached through cyclic wrap.
    max_range: u32,
}

impl CellGrid {
    /// Split `sim_box` into cells at least `cell_width` wide where the box allows it.
    ///
    /// An axis shorter than `cell_width` collapses into a single cell. 2D boxes
    /// always get exactly one layer of cells along z.
    pub fn new(sim_box: SimBox, cell_width: f32) -> Result<Self, LocalityError> {
        if !sim_box.is_valid() {
            return Err(LocalityError::InvalidBox {
                lengths: sim_box.lengths().to_array(),
            });
        }
        if !(cell_width.is_finite() && cell_width > 0.0) {
            return Err(LocalityError::InvalidCellWidth(cell_width));
        }

        let lengths = sim_box.lengths().to_array();
        let mut counts = [1u32; 3];
        let mut widths = [0.0f32; 3];
        for axis in 0..3 {
            if axis >= sim_box.dims() {
                widths[axis] = f32::INFINITY;
                continue;
            }
            let n = (lengths[axis] / cell_width).floor();
            // Offsets are signed, so a single axis is capped at i32::MAX cells.
            counts[axis] = if n >= i32::MAX as f32 {
                i32::MAX as u32
            } else {
                (n as u32).max(1)
            };
            widths[axis] = lengths[axis] / counts[axis] as f32;
        }

        let indexer = Index3D::new(counts[0], counts[1], counts[2]);
        let cells = indexer.num_elements();
        if cells > MAX_CELLS {
            return Err(LocalityError::TooManyCells { cells });
        }

        let bound_width = (0..3)
            .filter(|&axis| counts[axis] > 1)
            .map(|axis| widths[axis])
            .fold(f32::INFINITY, f32::min);
        let max_range = counts.iter().map(|&c| c / 2).max().unwrap_or(0);

        if counts.iter().any(|&c| c == 1) && sim_box.dims() == 3 {
            log::debug!(
                "cell grid {:?} has single-cell axes (box {:?}, cell_width {})",
                counts,
                lengths,
                cell_width
            );
        }

        Ok(Self {
            sim_box,
            indexer,
            cell_width,
            widths: Vec3::from_array(widths),
            bound_width,
            max_range,
        })
    }

    #[inline]
    pub fn sim_box(&self) -> &SimBox {
        &self.sim_box
    }

    #[inline]
    pub fn indexer(&self) -> &Index3D {
        &self.indexer
    }

    /// Cells per axis.
    #[inline]
    pub fn dims(&self) -> UVec3 {
        self.indexer.dims()
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.indexer.num_elements() as usize
    }

    /// Requested minimum cell width.
    #[inline]
    pub fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Actual cell width per axis (infinite on the unused z axis of a 2D box).
    #[inline]
    pub fn widths(&self) -> Vec3 {
        self.widths
    }

    /// Lower-bound width for shell distance estimates.
    ///
    /// Any point in a cell first reached at shell `R + 1` is at least
    /// `R * bound_width()` away from a query in the shell-0 cell.
    #[inline]
    pub fn bound_width(&self) -> f32 {
        self.bound_width
    }

    /// Largest shell radius that can still reach an unvisited cell.
    #[inline]
    pub fn max_range(&self) -> u32 {
        self.max_range
    }

    #[inline]
    pub fn is_2d(&self) -> bool {
        self.sim_box.is_2d()
    }

    /// Cell coordinates of `p`.
    ///
    /// Periodic axes take the fractional cell index modulo the count; non-periodic
    /// axes clamp it so points on the upper face land in the last cell.
    #[inline]
    pub fn cell_coord(&self, p: Vec3) -> UVec3 {
        let frac = self.sim_box.make_fraction(p).to_array();
        let dims = self.dims().to_array();
        let periodic = self.sim_box.periodic();
        let mut c = [0u32; 3];
        for axis in 0..3 {
            let n = dims[axis];
            let raw = (frac[axis] * n as f32).floor();
            c[axis] = if periodic[axis] {
                (raw as i64).rem_euclid(n as i64) as u32
            } else {
                raw.clamp(0.0, (n - 1) as f32) as u32
            };
        }
        UVec3::from_array(c)
    }

    /// Cell id of `p`.
    #[inline]
    pub fn cell_of(&self, p: Vec3) -> u32 {
        self.indexer.index_of(self.cell_coord(p))
    }

    /// Reduce any signed cell coordinate into `[0, count)` per axis (true modulo).
    #[inline]
    pub fn wrap_coord(&self, c: IVec3) -> UVec3 {
        let dims = self.dims().as_ivec3();
        UVec3::new(
            c.x.rem_euclid(dims.x) as u32,
            c.y.rem_euclid(dims.y) as u32,
            c.z.rem_euclid(dims.z) as u32,
        )
    }

    /// Flat cell id of in-range coordinates.
    #[inline]
    pub fn flatten(&self, c: UVec3) -> u32 {
        self.indexer.index_of(c)
    }

    /// Cell coordinates of a flat id.
    #[inline]
    pub fn coords(&self, cell: u32) -> UVec3 {
        self.indexer.coords(cell)
    }

    /// Wrap and flatten in one step.
    #[inline]
    pub fn cell_at(&self, c: IVec3) -> u32 {
        self.flatten(self.wrap_coord(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_10_box_width_2() {
        let grid = CellGrid::new(SimBox::cube(10.0).non_periodic(), 2.0).unwrap();
        assert_eq!(grid.dims(), UVec3::new(5, 5, 5));
        assert_eq!(grid.num_cells(), 125);
        assert_eq!(grid.widths(), Vec3::splat(2.0));
        assert_eq!(grid.max_range(), 2);
    }

    #[test]
    fn test_width_rounds_up() {
        let grid = CellGrid::new(SimBox::new(10.0, 7.0, 3.0), 3.0).unwrap();
        assert_eq!(grid.dims(), UVec3::new(3, 2, 1));
        assert!((grid.widths().x - 10.0 / 3.0).abs() < 1e-6);
        assert!((grid.widths().y - 3.5).abs() < 1e-6);
        assert!(grid.widths().cmpge(Vec3::splat(3.0)).all());
        // z collapsed into one cell, so it does not bound shell distances.
        assert!((grid.bound_width() - 10.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_single_cell() {
        let grid = CellGrid::new(SimBox::cube(1.0), 5.0).unwrap();
        assert_eq!(grid.num_cells(), 1);
        assert_eq!(grid.max_range(), 0);
        assert_eq!(grid.bound_width(), f32::INFINITY);
    }

    #[test]
    fn test_2d_single_layer() {
        let grid = CellGrid::new(SimBox::square(10.0, 10.0), 1.0).unwrap();
        assert_eq!(grid.dims(), UVec3::new(10, 10, 1));
        assert_eq!(grid.cell_coord(Vec3::new(0.0, 0.0, 0.0)).z, 0);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            CellGrid::new(SimBox::new(0.0, 1.0, 1.0), 1.0),
            Err(LocalityError::InvalidBox { .. })
        ));
        assert!(matches!(
            CellGrid::new(SimBox::cube(1.0), 0.0),
            Err(LocalityError::InvalidCellWidth(_))
        ));
        assert!(matches!(
            CellGrid::new(SimBox::cube(1.0), -1.0),
            Err(LocalityError::InvalidCellWidth(_))
        ));
        assert!(matches!(
            CellGrid::new(SimBox::cube(1.0e6), 1.0e-3),
            Err(LocalityError::TooManyCells { .. })
        ));
    }

    #[test]
    fn test_cell_of_periodic_and_clamped() {
        let periodic = CellGrid::new(SimBox::cube(10.0), 2.0).unwrap();
        assert_eq!(periodic.cell_coord(Vec3::new(-4.9, 0.0, 0.0)).x, 0);
        assert_eq!(periodic.cell_coord(Vec3::new(4.9, 0.0, 0.0)).x, 4);
        assert_eq!(periodic.cell_coord(Vec3::new(5.1, 0.0, 0.0)).x, 0);

        let open = CellGrid::new(SimBox::cube(10.0).non_periodic(), 2.0).unwrap();
        assert_eq!(open.cell_coord(Vec3::new(5.0, 0.0, 0.0)).x, 4);
        assert_eq!(open.cell_coord(Vec3::new(-5.0, 0.0, 0.0)).x, 0);
        assert_eq!(open.cell_coord(Vec3::ZERO), UVec3::new(2, 2, 2));
    }

    #[test]
    fn test_wrap_coord_modulo() {
        let grid = CellGrid::new(SimBox::new(10.0, 6.0, 4.0), 2.0).unwrap();
        let dims = grid.dims().as_ivec3();
        assert_eq!(dims, IVec3::new(5, 3, 2));

        for x in 0..dims.x {
            for y in 0..dims.y {
                for z in 0..dims.z {
                    let c = IVec3::new(x, y, z);
                    // Idempotent on in-range coordinates.
                    assert_eq!(grid.wrap_coord(c).as_ivec3(), c);
                    for k in -3..=3 {
                        let shifted = c + dims * k;
                        assert_eq!(grid.wrap_coord(shifted), grid.wrap_coord(c));
                    }
                }
            }
        }
        assert_eq!(grid.wrap_coord(IVec3::new(-1, -1, -1)), UVec3::new(4, 2, 1));
    }
}
