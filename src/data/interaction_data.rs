// Copyright @yucwang 2026

use std::collections::BTreeMap;

use crate::core::error::DataError;
use crate::core::photon::InteractionType;
use crate::data::dao::DataAccessObject;
use crate::data::material_data::{MaterialData, DEFAULT_RITA_ERROR};
use crate::math::constants::Float;

// Cross sections of every material in the domain. Read-only once built and
// shared by all transport workers.
#[derive(Debug, Clone)]
pub struct InteractionData {
    materials: Vec<Option<MaterialData>>,
    energy_range: (Float, Float),
}

impl InteractionData {
    pub fn new(materials: Vec<MaterialData>) -> Result<Self, DataError> {
        let mut slots: Vec<Option<MaterialData>> = vec![None; 256];
        let mut energy_range = (0.0, Float::INFINITY);
        for material in materials.into_iter() {
            if !material.is_void() {
                let (lo, hi) = material.energy_range();
                energy_range.0 = Float::max(energy_range.0, lo);
                energy_range.1 = Float::min(energy_range.1, hi);
            }
            let id = material.id() as usize;
            slots[id] = Some(material);
        }
        if !(energy_range.1 > energy_range.0) {
            return Err(DataError::EnergyOutOfRange { energy: energy_range.0, min: energy_range.0, max: energy_range.1 });
        }
        Ok(Self { materials: slots, energy_range })
    }

    pub fn from_dao(dao: &dyn DataAccessObject, ids: &[u8]) -> Result<Self, DataError> {
        Self::from_dao_with_error(dao, ids, DEFAULT_RITA_ERROR)
    }

    pub fn from_dao_with_error(dao: &dyn DataAccessObject, ids: &[u8], rita_error: Float) -> Result<Self, DataError> {
        let mut seen = BTreeMap::new();
        for id in ids {
            if seen.contains_key(id) {
                continue;
            }
            let record = dao.material(*id)?;
            let material = MaterialData::from_record(&record, rita_error)?;
            log::info!("Loaded material {} ({}), density {} g/cm^3.", material.id(), material.name(), material.density());
            seen.insert(*id, material);
        }
        Self::new(seen.into_iter().map(|(_, m)| m).collect())
    }

    // Fails unless every non-void material covers `[min, max]`.
    pub fn validate_energy_window(&self, min: Float, max: Float) -> Result<(), DataError> {
        self.check_energy(min)?;
        self.check_energy(max)
    }

    pub fn energy_range(&self) -> (Float, Float) {
        self.energy_range
    }

    #[inline]
    pub fn check_energy(&self, energy: Float) -> Result<(), DataError> {
        let (min, max) = self.energy_range;
        if energy >= min && energy <= max {
            Ok(())
        } else {
            Err(DataError::EnergyOutOfRange { energy, min, max })
        }
    }

    pub fn material(&self, id: u8) -> Result<&MaterialData, DataError> {
        self.materials[id as usize].as_ref().ok_or(DataError::MissingMaterial(id))
    }

    pub fn contains(&self, id: u8) -> bool {
        self.materials[id as usize].is_some()
    }

    pub fn material_ids(&self) -> Vec<u8> {
        self.materials
            .iter()
            .filter_map(|m| m.as_ref().map(|m| m.id()))
            .collect()
    }

    pub fn total_cross_section(&self, id: u8, energy: Float) -> Result<Float, DataError> {
        self.check_energy(energy)?;
        Ok(self.material(id)?.total_cross_section(energy))
    }

    pub fn channel_cross_sections(&self, id: u8, energy: Float) -> Result<[Float; 3], DataError> {
        self.check_energy(energy)?;
        let material = self.material(id)?;
        let mut out = [0.0; 3];
        for (slot, it) in out.iter_mut().zip(InteractionType::ALL.iter()) {
            *slot = material.channel_cross_section(*it, energy);
        }
        Ok(out)
    }

    // Maximum total cross section over `ids`. Zero only when all are void.
    pub fn majorant(&self, ids: &[u8], energy: Float) -> Result<Float, DataError> {
        self.check_energy(energy)?;
        let mut majorant: Float = 0.0;
        for id in ids {
            let sigma = self.material(*id)?.total_cross_section(energy);
            majorant = majorant.max(sigma);
        }
        if !majorant.is_finite() || majorant < 0.0 {
            return Err(DataError::NegativeMajorant { energy });
        }
        Ok(majorant)
    }
}
