// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InteractionType {
    Coherent,
    Incoherent,
    Photoelectric,
}

impl InteractionType {
    // Channel enumeration order used when sampling.
    pub const ALL: [InteractionType; 3] = [
        InteractionType::Coherent,
        InteractionType::Incoherent,
        InteractionType::Photoelectric,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InteractionType::Coherent => "coherent",
            InteractionType::Incoherent => "incoherent",
            InteractionType::Photoelectric => "photoelectric",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhotonState {
    Active,
    Absorbed,
    Escaped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScatterOrder {
    Primary,
    SingleCoherent,
    SingleIncoherent,
    Multiple,
}

impl ScatterOrder {
    pub const ALL: [ScatterOrder; 4] = [
        ScatterOrder::Primary,
        ScatterOrder::SingleCoherent,
        ScatterOrder::SingleIncoherent,
        ScatterOrder::Multiple,
    ];

    pub fn index(&self) -> usize {
        match self {
            ScatterOrder::Primary => 0,
            ScatterOrder::SingleCoherent => 1,
            ScatterOrder::SingleIncoherent => 2,
            ScatterOrder::Multiple => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScatterOrder::Primary => "primary",
            ScatterOrder::SingleCoherent => "single coherent",
            ScatterOrder::SingleIncoherent => "single incoherent",
            ScatterOrder::Multiple => "multiple",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InteractionRecord {
    pub interaction: InteractionType,
    pub energy: Float,
}

// Real interactions undergone by one photon, in order. Virtual
// collisions never appear here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotonScatteringHistory {
    records: Vec<InteractionRecord>,
    coherent: u32,
    incoherent: u32,
}

impl PhotonScatteringHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, interaction: InteractionType, energy: Float) {
        match interaction {
            InteractionType::Coherent => self.coherent += 1,
            InteractionType::Incoherent => self.incoherent += 1,
            InteractionType::Photoelectric => {}
        }
        self.records.push(InteractionRecord { interaction, energy });
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn coherent_count(&self) -> u32 {
        self.coherent
    }

    pub fn incoherent_count(&self) -> u32 {
        self.incoherent
    }

    pub fn scatter_count(&self) -> u32 {
        self.coherent + self.incoherent
    }

    pub fn scatter_order(&self) -> ScatterOrder {
        match (self.coherent, self.incoherent) {
            (0, 0) => ScatterOrder::Primary,
            (1, 0) => ScatterOrder::SingleCoherent,
            (0, 1) => ScatterOrder::SingleIncoherent,
            _ => ScatterOrder::Multiple,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Photon {
    position: Vector3f,
    direction: Vector3f,
    energy: Float,
    weight: Float,
    state: PhotonState,
    history: PhotonScatteringHistory,
}

impl Photon {
    pub fn new(position: Vector3f, direction: Vector3f, energy: Float) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            energy,
            weight: 1.0,
            state: PhotonState::Active,
            history: PhotonScatteringHistory::new(),
        }
    }

    pub fn with_weight(mut self, weight: Float) -> Self {
        self.weight = weight;
        self
    }

    pub fn position(&self) -> Vector3f {
        self.position
    }

    pub fn direction(&self) -> Vector3f {
        self.direction
    }

    pub fn energy(&self) -> Float {
        self.energy
    }

    pub fn weight(&self) -> Float {
        self.weight
    }

    pub fn state(&self) -> PhotonState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PhotonState::Active
    }

    pub fn history(&self) -> &PhotonScatteringHistory {
        &self.history
    }

    pub fn scatter_order(&self) -> ScatterOrder {
        self.history.scatter_order()
    }

    pub fn advance(&mut self, distance: Float) {
        self.position += self.direction * distance;
    }

    pub fn set_position(&mut self, position: Vector3f) {
        self.position = position;
    }

    // Keeps the direction unit length; floating-point drift is renormalized here.
    pub fn set_direction(&mut self, direction: Vector3f) {
        self.direction = direction.normalize();
    }

    pub fn set_energy(&mut self, energy: Float) {
        self.energy = energy;
    }

    pub fn record_interaction(&mut self, interaction: InteractionType) {
        self.history.record(interaction, self.energy);
    }

    pub fn absorb(&mut self) {
        self.state = PhotonState::Absorbed;
    }

    pub fn escape(&mut self) {
        self.state = PhotonState::Escaped;
    }
}
