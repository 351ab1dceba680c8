// Copyright @yucwang 2026

use rand::Rng;

use crate::core::error::DataError;
use crate::core::photon::{InteractionType, Photon};
use crate::core::probability_dist::Uniform;
use crate::data::material_data::MaterialData;
use crate::interactions::InteractionOutcome;
use crate::math::constants::PI;
use crate::math::frame::rotate_direction;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CoherentScattering;

impl CoherentScattering {
    pub fn interact<R: Rng + ?Sized>(
        &self,
        photon: &mut Photon,
        material: &MaterialData,
        rng: &mut R,
    ) -> Result<InteractionOutcome, DataError> {
        let angles = material
            .coherent_angles()
            .ok_or(DataError::MissingTable { material: material.id(), table: "coherent" })?;
        let mu = angles.sample(photon.energy(), rng).clamp(-1.0, 1.0);
        let phi = 2.0 * PI * Uniform::sample(rng);

        photon.record_interaction(InteractionType::Coherent);
        photon.set_direction(rotate_direction(&photon.direction(), mu, phi));
        Ok(InteractionOutcome { energy_deposited: 0.0 })
    }
}
