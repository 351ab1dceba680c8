// Copyright @yucwang 2026

use std::collections::BTreeMap;

use crate::core::error::{DataError, GridError};
use crate::core::statistics::Welford;
use crate::data::interaction_data::InteractionData;
use crate::grid::traversal::GridTraversal;
use crate::grid::voxel::Voxel;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

pub const DEFAULT_BLOCK_SIZE: usize = 8;

// Regular voxel lattice. Voxel `(i, j, k)` lives at `i + j * nx + k * nx * ny`.
// The lattice is partitioned into cubic blocks of `block_size` voxels per
// edge. Each block records the distinct materials it contains, which gives
// delta tracking a majorant that bounds every voxel in the block.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    dims: [usize; 3],
    origin: Vector3f,
    spacing: Vector3f,
    bounds: AABB,
    voxels: Vec<Voxel>,
    block_size: usize,
    block_dims: [usize; 3],
    block_groups: Vec<usize>,
    groups: Vec<Vec<u8>>,
}

impl VoxelGrid {
    pub fn new(dims: [usize; 3], spacing: Vector3f, origin: Vector3f, materials: Vec<u8>) -> Result<Self, GridError> {
        if dims.iter().any(|n| *n == 0) {
            return Err(GridError::InvalidDimensions(format!("dimensions {:?} must be positive", dims)));
        }
        if (0..3).any(|a| !(spacing[a] > 0.0) || !spacing[a].is_finite()) {
            return Err(GridError::InvalidDimensions("voxel spacing must be positive".to_string()));
        }
        let count = dims[0]
            .checked_mul(dims[1])
            .and_then(|v| v.checked_mul(dims[2]))
            .ok_or_else(|| GridError::InvalidDimensions("voxel count overflows".to_string()))?;
        if materials.len() != count {
            return Err(GridError::InvalidDimensions(format!(
                "expected {} material ids, got {}", count, materials.len()
            )));
        }

        let extent = Vector3f::new(
            spacing.x * dims[0] as Float,
            spacing.y * dims[1] as Float,
            spacing.z * dims[2] as Float,
        );
        let mut grid = Self {
            dims,
            origin,
            spacing,
            bounds: AABB::new(origin, origin + extent),
            voxels: materials.into_iter().map(Voxel::new).collect(),
            block_size: DEFAULT_BLOCK_SIZE,
            block_dims: [0; 3],
            block_groups: Vec::new(),
            groups: Vec::new(),
        };
        grid.build_blocks();
        Ok(grid)
    }

    pub fn uniform(dims: [usize; 3], spacing: Vector3f, origin: Vector3f, material: u8) -> Result<Self, GridError> {
        let count = dims.iter().product();
        Self::new(dims, spacing, origin, vec![material; count])
    }

    // A block size of at least the largest dimension yields one global majorant;
    // a block size of one makes every step end on a voxel face.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self.build_blocks();
        self
    }

    fn build_blocks(&mut self) {
        let bs = self.block_size;
        self.block_dims = [
            (self.dims[0] + bs - 1) / bs,
            (self.dims[1] + bs - 1) / bs,
            (self.dims[2] + bs - 1) / bs,
        ];
        let block_count = self.block_dims.iter().product();
        let mut sets: Vec<Vec<u8>> = vec![Vec::new(); block_count];
        for k in 0..self.dims[2] {
            for j in 0..self.dims[1] {
                for i in 0..self.dims[0] {
                    let material = self.voxels[self.linear_index([i, j, k])].material();
                    let block = self.block_linear_index([i / bs, j / bs, k / bs]);
                    if !sets[block].contains(&material) {
                        sets[block].push(material);
                    }
                }
            }
        }

        let mut lookup: BTreeMap<Vec<u8>, usize> = BTreeMap::new();
        self.groups.clear();
        self.block_groups = Vec::with_capacity(block_count);
        for mut set in sets.into_iter() {
            set.sort_unstable();
            let next = self.groups.len();
            let group = *lookup.entry(set.clone()).or_insert(next);
            if group == next {
                self.groups.push(set);
            }
            self.block_groups.push(group);
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn spacing(&self) -> Vector3f {
        self.spacing
    }

    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn contains(&self, p: &Vector3f) -> bool {
        self.bounds.contains_closed(p)
    }

    #[inline]
    pub fn linear_index(&self, idx: [usize; 3]) -> usize {
        idx[0] + idx[1] * self.dims[0] + idx[2] * self.dims[0] * self.dims[1]
    }

    // Voxel holding `p`. Points on the outer max faces belong to the last voxel.
    pub fn voxel_index(&self, p: &Vector3f) -> Result<[usize; 3], GridError> {
        if !self.contains(p) {
            return Err(GridError::OutOfDomain { position: *p });
        }
        let mut idx = [0usize; 3];
        for a in 0..3 {
            let i = ((p[a] - self.origin[a]) / self.spacing[a]).floor();
            idx[a] = (i.max(0.0) as usize).min(self.dims[a] - 1);
        }
        Ok(idx)
    }

    pub fn voxel(&self, idx: [usize; 3]) -> &Voxel {
        &self.voxels[self.linear_index(idx)]
    }

    pub fn voxel_bounds(&self, idx: [usize; 3]) -> AABB {
        let lo = Vector3f::new(
            self.origin.x + idx[0] as Float * self.spacing.x,
            self.origin.y + idx[1] as Float * self.spacing.y,
            self.origin.z + idx[2] as Float * self.spacing.z,
        );
        AABB::new(lo, lo + self.spacing)
    }

    pub fn material_at(&self, p: &Vector3f) -> Result<u8, GridError> {
        Ok(self.voxel(self.voxel_index(p)?).material())
    }

    pub fn materials_present(&self) -> Vec<u8> {
        let mut out: Vec<u8> = self.groups.iter().flatten().cloned().collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn distance_to_voxel_boundary(&self, p: &Vector3f, d: &Vector3f) -> Result<Float, GridError> {
        let idx = self.voxel_index(p)?;
        Ok(self.voxel_bounds(idx).exit_distance(p, d))
    }

    pub fn distance_to_grid_boundary(&self, p: &Vector3f, d: &Vector3f) -> Float {
        self.bounds.exit_distance(p, d)
    }

    #[inline]
    fn block_linear_index(&self, block: [usize; 3]) -> usize {
        block[0] + block[1] * self.block_dims[0] + block[2] * self.block_dims[0] * self.block_dims[1]
    }

    pub fn block_traversal(&self, p: &Vector3f, d: &Vector3f) -> GridTraversal {
        let cell = self.spacing * self.block_size as Float;
        GridTraversal::new(&self.origin, &cell, self.block_dims, p, d)
    }

    pub fn block_materials(&self, block: [usize; 3]) -> &[u8] {
        &self.groups[self.block_groups[self.block_linear_index(block)]]
    }

    pub fn block_majorant(&self, block: [usize; 3], energy: Float, data: &InteractionData) -> Result<Float, DataError> {
        data.majorant(self.block_materials(block), energy)
    }

    // Voxel holding `p`, forced into `block` so that a point rounded across a
    // block face still uses a material bounded by that block's majorant.
    pub fn voxel_index_in_block(&self, p: &Vector3f, block: [usize; 3]) -> [usize; 3] {
        let mut idx = [0usize; 3];
        for a in 0..3 {
            let lo = block[a] * self.block_size;
            let hi = ((block[a] + 1) * self.block_size).min(self.dims[a]) - 1;
            let i = ((p[a] - self.origin[a]) / self.spacing[a]).floor();
            idx[a] = (i.max(0.0) as usize).clamp(lo, hi);
        }
        idx
    }

    pub fn update_welford(&mut self, index: usize, x: Float) {
        self.voxels[index].update_welford(x);
    }

    pub fn merge_accumulators(&mut self, accumulators: &BTreeMap<usize, Welford>) {
        for (index, acc) in accumulators.iter() {
            self.voxels[*index].merge_welford(acc);
        }
    }

    pub fn reset_accumulators(&mut self) {
        for voxel in self.voxels.iter_mut() {
            voxel.reset();
        }
    }

    pub fn validate_materials(&self, data: &InteractionData) -> Result<(), GridError> {
        for id in self.materials_present() {
            if !data.contains(id) {
                return Err(GridError::UnknownMaterial(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dao::InMemoryDao;
    use crate::data::material_data::test_tables::*;

    fn layered() -> VoxelGrid {
        // 4x2x2 voxels of 0.5 cm, material 1 for i < 2 and 2 otherwise.
        let dims = [4, 2, 2];
        let mut materials = Vec::new();
        for _k in 0..2 {
            for _j in 0..2 {
                for i in 0..4 {
                    materials.push(if i < 2 { 1 } else { 2 });
                }
            }
        }
        VoxelGrid::new(dims, Vector3f::new(0.5, 0.5, 0.5), Vector3f::new(-1.0, 0.0, 0.0), materials).unwrap()
    }

    #[test]
    fn point_lookup_is_bounds_checked() {
        let grid = layered();
        assert_eq!(grid.voxel_index(&Vector3f::new(-0.9, 0.1, 0.1)).unwrap(), [0, 0, 0]);
        assert_eq!(grid.voxel_index(&Vector3f::new(0.2, 0.7, 0.99)).unwrap(), [2, 1, 1]);
        assert_eq!(grid.voxel_index(&Vector3f::new(1.0, 1.0, 1.0)).unwrap(), [3, 1, 1]);
        assert!(matches!(
            grid.voxel_index(&Vector3f::new(1.01, 0.5, 0.5)),
            Err(GridError::OutOfDomain { .. })
        ));
        assert_eq!(grid.material_at(&Vector3f::new(0.6, 0.5, 0.5)).unwrap(), 2);
        assert_eq!(grid.linear_index([3, 1, 1]), 3 + 4 + 8);
    }

    #[test]
    fn boundary_distances() {
        let grid = layered();
        let p = Vector3f::new(-0.8, 0.25, 0.25);
        let d = Vector3f::new(1.0, 0.0, 0.0);
        assert!((grid.distance_to_voxel_boundary(&p, &d).unwrap() - 0.3).abs() < 1e-12);
        assert!((grid.distance_to_grid_boundary(&p, &d) - 1.8).abs() < 1e-12);
        let b = grid.voxel_bounds([1, 0, 0]);
        assert!((b.p_min.x + 0.5).abs() < 1e-12 && (b.p_max.x - 0.0).abs() < 1e-12);
    }

    #[test]
    fn blocks_group_materials() {
        let grid = layered().with_block_size(2);
        assert_eq!(grid.block_materials([0, 0, 0]), &[1]);
        assert_eq!(grid.block_materials([1, 0, 0]), &[2]);
        let global = layered().with_block_size(16);
        assert_eq!(global.block_materials([0, 0, 0]), &[1, 2]);
        assert_eq!(global.materials_present(), vec![1, 2]);

        let p = Vector3f::new(0.0, 0.5, 0.5);
        assert_eq!(grid.voxel_index_in_block(&p, [0, 0, 0]), [1, 1, 1]);
        assert_eq!(grid.voxel_index_in_block(&p, [1, 0, 0]), [2, 1, 1]);
    }

    #[test]
    fn block_majorant_bounds_voxels() {
        let dao = InMemoryDao::new().with_material(scatterer(1, 1.0)).with_material(scatterer(2, 5.0));
        let data = InteractionData::from_dao(&dao, &[1, 2]).unwrap();
        let grid = layered().with_block_size(4);
        grid.validate_materials(&data).unwrap();
        for e in [2e3, 5e4, 8e5] {
            let maj = grid.block_majorant([0, 0, 0], e, &data).unwrap();
            for voxel in grid.voxels() {
                assert!(data.total_cross_section(voxel.material(), e).unwrap() <= maj);
            }
        }
        let missing = VoxelGrid::uniform([1, 1, 1], Vector3f::new(1.0, 1.0, 1.0), Vector3f::zeros(), 7).unwrap();
        assert_eq!(missing.validate_materials(&data).unwrap_err(), GridError::UnknownMaterial(7));
    }

    #[test]
    fn welford_updates_and_merges_per_voxel() {
        let mut grid = layered();
        grid.update_welford(3, 2.0);
        grid.update_welford(3, 4.0);
        let mut partial = BTreeMap::new();
        let mut acc = Welford::new();
        acc.update(6.0);
        partial.insert(3usize, acc);
        grid.merge_accumulators(&partial);
        let v = grid.voxels()[3].energy_deposition();
        assert_eq!(v.count(), 3);
        assert!((v.mean() - 4.0).abs() < 1e-12);
        assert!((v.population_variance() - 8.0 / 3.0).abs() < 1e-12);
        grid.reset_accumulators();
        assert_eq!(grid.voxels()[3].energy_deposition().count(), 0);
    }

    #[test]
    fn rejects_bad_shapes() {
        let spacing = Vector3f::new(1.0, 1.0, 1.0);
        assert!(VoxelGrid::new([0, 1, 1], spacing, Vector3f::zeros(), vec![]).is_err());
        assert!(VoxelGrid::new([2, 1, 1], spacing, Vector3f::zeros(), vec![1]).is_err());
        assert!(VoxelGrid::new([1, 1, 1], Vector3f::new(1.0, 0.0, 1.0), Vector3f::zeros(), vec![1]).is_err());
    }
}
