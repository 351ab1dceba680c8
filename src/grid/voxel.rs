// Copyright @yucwang 2026

use crate::core::statistics::Welford;
use crate::math::constants::Float;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Voxel {
    material: u8,
    energy_deposition: Welford,
}

impl Voxel {
    pub fn new(material: u8) -> Self {
        Self { material, energy_deposition: Welford::new() }
    }

    pub fn material(&self) -> u8 {
        self.material
    }

    pub fn energy_deposition(&self) -> &Welford {
        &self.energy_deposition
    }

    pub fn update_welford(&mut self, x: Float) {
        self.energy_deposition.update(x);
    }

    pub fn merge_welford(&mut self, other: &Welford) {
        self.energy_deposition.merge(other);
    }

    pub fn reset(&mut self) {
        self.energy_deposition = Welford::new();
    }
}
