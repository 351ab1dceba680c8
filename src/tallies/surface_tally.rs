// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::GridError;
use crate::math::constants::{Float, Vector3f, EPSILON};
use crate::tallies::quantity::{EnergyBins, Quantity, QuantityContainer, TallyEstimate};
use crate::tallies::TrackSegment;

// Planar scoring shapes. Photons are counted when they cross the shape
// travelling along `normal`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SurfaceShape {
    Disc { center: Vector3f, normal: Vector3f, radius: Float },
    Rectangle { corner: Vector3f, edge1: Vector3f, edge2: Vector3f, normal: Vector3f },
}

impl SurfaceShape {
    pub fn normal(&self) -> Vector3f {
        match self {
            SurfaceShape::Disc { normal, .. } => *normal,
            SurfaceShape::Rectangle { normal, .. } => *normal,
        }
    }

    fn anchor(&self) -> Vector3f {
        match self {
            SurfaceShape::Disc { center, .. } => *center,
            SurfaceShape::Rectangle { corner, .. } => *corner,
        }
    }

    // `q` is assumed to lie in the plane of the shape.
    fn contains(&self, q: &Vector3f) -> bool {
        match self {
            SurfaceShape::Disc { center, radius, .. } => (q - center).norm_squared() <= radius * radius,
            SurfaceShape::Rectangle { corner, edge1, edge2, .. } => {
                let v = q - corner;
                let a = v.dot(edge1) / edge1.norm_squared();
                let b = v.dot(edge2) / edge2.norm_squared();
                (0.0..=1.0).contains(&a) && (0.0..=1.0).contains(&b)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceTally {
    id: String,
    shape: SurfaceShape,
    container: QuantityContainer,
}

impl SurfaceTally {
    fn new(shape: SurfaceShape, quantities: &[Quantity], bins: EnergyBins) -> Result<Self, GridError> {
        if quantities.is_empty() {
            return Err(GridError::UnsupportedQuantity("surface tally without quantities".to_string()));
        }
        if let Some(q) = quantities
            .iter()
            .find(|q| matches!(q, Quantity::EnergyDeposition | Quantity::NumberOfInteractions))
        {
            return Err(GridError::UnsupportedQuantity(format!("{} on a surface tally", q.name())));
        }
        let kind = match shape {
            SurfaceShape::Disc { .. } => "disc_tally",
            SurfaceShape::Rectangle { .. } => "rectangle_tally",
        };
        Ok(Self { id: generate_node_id(kind), shape, container: QuantityContainer::new(quantities, bins) })
    }

    pub fn disc(center: Vector3f, normal: Vector3f, radius: Float, quantities: &[Quantity], bins: EnergyBins) -> Result<Self, GridError> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(GridError::InvalidShape(format!("disc radius {} must be positive", radius)));
        }
        if !(normal.norm() > EPSILON) {
            return Err(GridError::InvalidShape("disc normal must be non-zero".to_string()));
        }
        Self::new(SurfaceShape::Disc { center, normal: normal.normalize(), radius }, quantities, bins)
    }

    // Rectangle spanned by `edge1` and `edge2` from `corner`. The normal is
    // `edge1 x edge2`.
    pub fn rectangle(corner: Vector3f, edge1: Vector3f, edge2: Vector3f, quantities: &[Quantity], bins: EnergyBins) -> Result<Self, GridError> {
        let l1 = edge1.norm();
        let l2 = edge2.norm();
        if !(l1 > EPSILON) || !(l2 > EPSILON) {
            return Err(GridError::InvalidShape("rectangle edges must be non-zero".to_string()));
        }
        if edge1.dot(&edge2).abs() > 1e-9 * l1 * l2 {
            return Err(GridError::InvalidShape("rectangle edges must be orthogonal".to_string()));
        }
        let normal = edge1.cross(&edge2).normalize();
        Self::new(SurfaceShape::Rectangle { corner, edge1, edge2, normal }, quantities, bins)
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn shape(&self) -> &SurfaceShape {
        &self.shape
    }

    pub fn container(&self) -> &QuantityContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut QuantityContainer {
        &mut self.container
    }

    // Entrance cosine if `segment` crosses the shape along its normal.
    // The segment must start strictly behind the plane and end on or past
    // it, so a point lying on the plane belongs to the segment ending there.
    pub fn crossing(&self, segment: &TrackSegment) -> Option<Float> {
        let n = self.shape.normal();
        let cos = segment.direction.dot(&n);
        if !(cos > 0.0) {
            return None;
        }
        let anchor = self.shape.anchor();
        let behind = (segment.start - anchor).dot(&n);
        if !(behind < 0.0) {
            return None;
        }
        if let Some(end) = segment.end {
            if (end - anchor).dot(&n) < 0.0 {
                return None;
            }
        }
        let t = (-behind / cos).min(segment.length);
        let q = segment.start + segment.direction * t;
        if self.shape.contains(&q) {
            Some(cos)
        } else {
            None
        }
    }

    pub fn score<F: FnMut(usize, Float)>(&self, segment: &TrackSegment, mut add: F) {
        let cos = match self.crossing(segment) {
            Some(cos) => cos,
            None => return,
        };
        for quantity in self.container.quantities() {
            let value = match quantity {
                Quantity::NumberOfPhotons => 1.0,
                Quantity::IncidentEnergy => segment.energy,
                Quantity::EntranceCosine => cos,
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

impl ComputationNode for SurfaceTally {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        match self.shape {
            SurfaceShape::Disc { .. } => "disc",
            SurfaceShape::Rectangle { .. } => "rectangle",
        }
    }

    fn to_string(&self) -> String {
        let names: Vec<&str> = self.container.quantities().iter().map(|q| q.name()).collect();
        let n = self.shape.normal();
        format!(
            "SurfaceTally[id={}, {} normal=({:.3}, {:.3}, {:.3}), quantities={}]",
            self.id, self.kind(), n.x, n.y, n.z, names.join(",")
        )
    }
}
