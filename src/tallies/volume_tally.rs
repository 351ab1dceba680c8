// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::GridError;
use crate::grid::VoxelGrid;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, EPSILON};
use crate::tallies::quantity::{EnergyBins, Quantity, QuantityContainer, TallyEstimate};
use crate::tallies::TrackSegment;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VolumeRegion {
    Cuboid(AABB),
    VoxelBox { min: [usize; 3], max: [usize; 3], bounds: AABB },
}

impl VolumeRegion {
    pub fn bounds(&self) -> &AABB {
        match self {
            VolumeRegion::Cuboid(bounds) => bounds,
            VolumeRegion::VoxelBox { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraversalType {
    Misses,
    StartsInsideExits,
    StartsInsideStays,
    PassesThrough,
    LandsInside,
}

impl TraversalType {
    pub fn enters(&self) -> bool {
        matches!(self, TraversalType::PassesThrough | TraversalType::LandsInside)
    }

    pub fn ends_inside(&self) -> bool {
        matches!(self, TraversalType::LandsInside | TraversalType::StartsInsideStays)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTally {
    id: String,
    region: VolumeRegion,
    container: QuantityContainer,
}

impl VolumeTally {
    pub fn new(region: VolumeRegion, quantities: &[Quantity], bins: EnergyBins) -> Result<Self, GridError> {
        let bounds = region.bounds();
        if !bounds.is_valid() || !(bounds.volume() > 0.0) {
            return Err(GridError::InvalidShape("volume tally region has no volume".to_string()));
        }
        if quantities.is_empty() {
            return Err(GridError::UnsupportedQuantity("volume tally without quantities".to_string()));
        }
        if let Some(q) = quantities.iter().find(|q| **q == Quantity::EntranceCosine) {
            return Err(GridError::UnsupportedQuantity(format!("{} on a volume tally", q.name())));
        }
        let kind = match region {
            VolumeRegion::Cuboid(_) => "cuboid_tally",
            VolumeRegion::VoxelBox { .. } => "voxel_box_tally",
        };
        Ok(Self { id: generate_node_id(kind), region, container: QuantityContainer::new(quantities, bins) })
    }

    pub fn cuboid(p_min: Vector3f, p_max: Vector3f, quantities: &[Quantity], bins: EnergyBins) -> Result<Self, GridError> {
        Self::new(VolumeRegion::Cuboid(AABB::new(p_min, p_max)), quantities, bins)
    }

    pub fn voxel_box(
        grid: &VoxelGrid,
        min: [usize; 3],
        max: [usize; 3],
        quantities: &[Quantity],
        bins: EnergyBins,
    ) -> Result<Self, GridError> {
        let dims = grid.dims();
        if (0..3).any(|a| min[a] > max[a] || max[a] >= dims[a]) {
            return Err(GridError::InvalidShape(format!(
                "voxel box {:?}..={:?} outside grid {:?}", min, max, dims
            )));
        }
        let lo = grid.voxel_bounds(min);
        let hi = grid.voxel_bounds(max);
        let bounds = AABB::new(lo.p_min, hi.p_max);
        Self::new(VolumeRegion::VoxelBox { min, max, bounds }, quantities, bins)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn region(&self) -> &VolumeRegion {
        &self.region
    }

    pub fn container(&self) -> &QuantityContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut QuantityContainer {
        &mut self.container
    }

    pub fn traversal_type(&self, segment: &TrackSegment) -> TraversalType {
        let bounds = self.region.bounds();
        let starts_inside = bounds.contains(&segment.start);
        let ends_inside = segment.end.map_or(false, |p| bounds.contains(&p));
        match (starts_inside, ends_inside) {
            (true, true) => TraversalType::StartsInsideStays,
            (true, false) => TraversalType::StartsInsideExits,
            (false, true) => TraversalType::LandsInside,
            // A chord that only grazes a face, e.g. a flight stopping on the
            // max face, leaves the entry to the following segment.
            (false, false) => match bounds.ray_intersect_range(&segment.ray()) {
                Some((t0, t1)) if t1 - t0 > EPSILON * (1.0 + t1) => TraversalType::PassesThrough,
                _ => TraversalType::Misses,
            },
        }
    }

    pub fn score<F: FnMut(usize, Float)>(&self, segment: &TrackSegment, mut add: F) {
        let traversal = self.traversal_type(segment);
        if traversal == TraversalType::Misses {
            return;
        }
        for quantity in self.container.quantities() {
            let value = match quantity {
                Quantity::NumberOfPhotons if traversal.enters() => 1.0,
                Quantity::IncidentEnergy if traversal.enters() => segment.energy,
                Quantity::EnergyDeposition if traversal.ends_inside() && segment.deposit > 0.0 => segment.deposit,
                Quantity::NumberOfInteractions if traversal.ends_inside() && segment.interaction.is_some() => 1.0,
                _ => continue,
            };
            if let Some(cell) = self.container.cell_index(*quantity, segment.order, segment.energy) {
                add(cell, value * segment.weight);
            }
        }
    }

    pub fn finalize(&self, histories: u64) -> Vec<TallyEstimate> {
        self.container.finalize(histories)
    }
}

impl ComputationNode for VolumeTally {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        match self.region {
            VolumeRegion::Cuboid(_) => "cuboid",
            VolumeRegion::VoxelBox { .. } => "voxel box",
        }
    }

    fn to_string(&self) -> String {
        let b = self.region.bounds();
        let names: Vec<&str> = self.container.quantities().iter().map(|q| q.name()).collect();
        format!(
            "VolumeTally[id={}, {} ({:.3}, {:.3}, {:.3})-({:.3}, {:.3}, {:.3}), quantities={}]",
            self.id, self.kind(),
            b.p_min.x, b.p_min.y, b.p_min.z,
            b.p_max.x, b.p_max.y, b.p_max.z,
            names.join(",")
        )
    }
}
