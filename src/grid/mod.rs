// Copyright @yucwang 2026

pub mod traversal;
pub mod voxel;
pub mod voxel_grid;

pub use traversal::GridTraversal;
pub use voxel::Voxel;
pub use voxel_grid::VoxelGrid;
