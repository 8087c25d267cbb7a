//! Construction and re-indexing for `LinkCell`.

use glam::Vec3;

use super::{CellChains, CellGrid, CellNeighborCache, LinkCell, LinkCellConfig};
use crate::error::LocalityError;
use crate::sim_box::SimBox;
use crate::types::{collect_points, PointLike};
use crate::util::Timed;

impl LinkCell {
    /// Build an index over `points` with the default neighbor range.
    pub fn new<P: PointLike>(
        sim_box: SimBox,
        cell_width: f32,
        points: &[P],
    ) -> Result<Self, LocalityError> {
        Self::with_config(sim_box, LinkCellConfig::new(cell_width), points)
    }

    /// Build an index over `points`.
    ///
    /// Fails on an invalid box or cell width, or when a point lies outside a
    /// non-periodic axis of the box.
    pub fn with_config<P: PointLike>(
        sim_box: SimBox,
        config: LinkCellConfig,
        points: &[P],
    ) -> Result<Self, LocalityError> {
        let grid = CellGrid::new(sim_box, config.cell_width)?;
        log::debug!(
            "link cell grid {:?} ({} cells, width {:?}) for {} points",
            grid.dims().to_array(),
            grid.num_cells(),
            grid.widths().to_array(),
            points.len()
        );

        let mut index = Self {
            chains: CellChains::new(grid.num_cells()),
            cache: CellNeighborCache::new(config.neighbor_range),
            points: Vec::new(),
            grid,
            config,
        };
        index.rebuild(points)?;
        Ok(index)
    }

    /// Replace the indexed point set, keeping the grid and its neighbor cache.
    ///
    /// On error the previous point set stays indexed.
    pub fn rebuild<P: PointLike>(&mut self, points: &[P]) -> Result<(), LocalityError> {
        let points = collect_points(points);
        check_points(self.grid.sim_box(), &points)?;

        let _t = Timed::debug("cell list build");
        self.chains.rebuild(&self.grid, &points);
        self.points = points;
        Ok(())
    }
}

fn check_capacity(num_points: usize) -> Result<(), LocalityError> {
    let limit = super::CHAIN_END as usize - 1;
    if num_points > limit {
        return Err(LocalityError::TooManyPoints {
            points: num_points,
            limit,
        });
    }
    Ok(())
}

fn check_points(sim_box: &SimBox, points: &[Vec3]) -> Result<(), LocalityError> {
    check_capacity(points.len())?;
    if let Some(index) = points.iter().position(|&p| !sim_box.contains(p)) {
        return Err(LocalityError::PointOutsideBox { index });
    }
    Ok(())
}
