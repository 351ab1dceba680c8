// Copyright @yucwang 2026

use rand::Rng;

use crate::core::error::DataError;
use crate::core::photon::{InteractionType, Photon};
use crate::data::material_data::MaterialData;
use crate::interactions::InteractionOutcome;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PhotoelectricEffect;

impl PhotoelectricEffect {
    pub fn interact<R: Rng + ?Sized>(
        &self,
        photon: &mut Photon,
        _material: &MaterialData,
        _rng: &mut R,
    ) -> Result<InteractionOutcome, DataError> {
        let deposited = photon.energy();
        photon.record_interaction(InteractionType::Photoelectric);
        photon.absorb();
        Ok(InteractionOutcome { energy_deposited: deposited })
    }
}
