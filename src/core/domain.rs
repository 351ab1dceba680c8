// Copyright @yucwang 2026

use crate::core::error::{GridError, TransportError};
use crate::data::interaction_data::InteractionData;
use crate::grid::VoxelGrid;

pub trait ComputationalDomain: Send + Sync {
    fn voxel_grid(&self) -> &VoxelGrid;

    fn voxel_grid_mut(&mut self) -> &mut VoxelGrid;

    fn interaction_data(&self) -> &InteractionData;
}

#[derive(Debug, Clone)]
pub struct VoxelDomain {
    grid: VoxelGrid,
    data: InteractionData,
}

impl VoxelDomain {
    pub fn new(grid: VoxelGrid, data: InteractionData) -> Result<Self, TransportError> {
        grid.validate_materials(&data)?;
        log::info!(
            "Voxel domain: {:?} ({} voxels), {} materials, energy window {:.1}-{:.1} eV.",
            grid.dims(),
            grid.voxel_count(),
            data.material_ids().len(),
            data.energy_range().0,
            data.energy_range().1
        );
        Ok(Self { grid, data })
    }

    pub fn set_comp_properties(&mut self, data: InteractionData) -> Result<(), GridError> {
        self.grid.validate_materials(&data)?;
        self.data = data;
        Ok(())
    }

    pub fn set_voxel_grid(&mut self, grid: VoxelGrid) -> Result<(), GridError> {
        grid.validate_materials(&self.data)?;
        self.grid = grid;
        Ok(())
    }
}

impl ComputationalDomain for VoxelDomain {
    fn voxel_grid(&self) -> &VoxelGrid {
        &self.grid
    }

    fn voxel_grid_mut(&mut self) -> &mut VoxelGrid {
        &mut self.grid
    }

    fn interaction_data(&self) -> &InteractionData {
        &self.data
    }
}
