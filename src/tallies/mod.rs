// Copyright @yucwang 2026

pub mod buffer;
pub mod quantity;
pub mod surface_tally;
pub mod volume_tally;

use crate::core::photon::{InteractionType, ScatterOrder};
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

pub use buffer::{HistoryScope, TallyAccumulators, TallyBuffer};
pub use quantity::{EnergyBins, Quantity, QuantityClass, QuantityContainer, TallyEstimate};
pub use surface_tally::{SurfaceShape, SurfaceTally};
pub use volume_tally::{TraversalType, VolumeRegion, VolumeTally};

// `energy`, `weight` and `order` describe the photon while it travels the
// segment. `interaction` and `deposit` describe the real event at the end
// point, if any. Escaping flights have an infinite `length` and no `end`.
// `end` is the exact point the photon is moved to, so consecutive segments
// share their boundary point bit for bit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackSegment {
    pub start: Vector3f,
    pub direction: Vector3f,
    pub length: Float,
    pub end: Option<Vector3f>,
    pub energy: Float,
    pub weight: Float,
    pub order: ScatterOrder,
    pub interaction: Option<InteractionType>,
    pub deposit: Float,
}

impl TrackSegment {
    pub fn flight(start: Vector3f, direction: Vector3f, length: Float, energy: Float, weight: Float, order: ScatterOrder) -> Self {
        let end = if length.is_finite() { Some(start + direction * length) } else { None };
        Self { start, direction, length, end, energy, weight, order, interaction: None, deposit: 0.0 }
    }

    pub fn ending_at(mut self, end: Vector3f) -> Self {
        self.length = (end - self.start).norm();
        self.end = Some(end);
        self
    }

    pub fn escaping(mut self) -> Self {
        self.length = Float::INFINITY;
        self.end = None;
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionType, deposit: Float) -> Self {
        self.interaction = Some(interaction);
        self.deposit = deposit;
        self
    }

    pub fn ray(&self) -> Ray3f {
        Ray3f::new(self.start, self.direction, Some(0.0), Some(self.length))
    }
}
