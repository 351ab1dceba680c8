// Copyright @yucwang 2026

pub mod coherent;
pub mod incoherent;
pub mod photoelectric;

use rand::Rng;

use crate::core::error::DataError;
use crate::core::photon::{InteractionType, Photon};
use crate::data::material_data::MaterialData;
use crate::math::constants::Float;

pub use coherent::CoherentScattering;
pub use incoherent::IncoherentScattering;
pub use photoelectric::PhotoelectricEffect;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub energy_deposited: Float,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParticleInteractionBehavior {
    Coherent(CoherentScattering),
    Incoherent(IncoherentScattering),
    Photoelectric(PhotoelectricEffect),
}

impl ParticleInteractionBehavior {
    pub fn for_type(interaction: InteractionType) -> Self {
        match interaction {
            InteractionType::Coherent => ParticleInteractionBehavior::Coherent(CoherentScattering),
            InteractionType::Incoherent => ParticleInteractionBehavior::Incoherent(IncoherentScattering),
            InteractionType::Photoelectric => ParticleInteractionBehavior::Photoelectric(PhotoelectricEffect),
        }
    }

    pub fn interact<R: Rng + ?Sized>(
        &self,
        photon: &mut Photon,
        material: &MaterialData,
        rng: &mut R,
    ) -> Result<InteractionOutcome, DataError> {
        match self {
            ParticleInteractionBehavior::Coherent(b) => b.interact(photon, material, rng),
            ParticleInteractionBehavior::Incoherent(b) => b.interact(photon, material, rng),
            ParticleInteractionBehavior::Photoelectric(b) => b.interact(photon, material, rng),
        }
    }
}
