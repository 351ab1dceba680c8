// Copyright @yucwang 2026

use std::collections::BTreeMap;

use crate::core::error::DataError;
use crate::math::constants::Float;

#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub x: Vec<Float>,
    pub y: Vec<Float>,
}

impl TableRecord {
    pub fn new(x: Vec<Float>, y: Vec<Float>) -> Self {
        Self { x, y }
    }
}

// Raw tables of one material. Attenuation tables are mass coefficients
// (cm^2/g) against energy (eV); form factor and incoherent scattering
// function are tabulated against momentum transfer (1/angstrom).
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub id: u8,
    pub name: String,
    pub density: Float,
    pub coherent: Option<TableRecord>,
    pub incoherent: Option<TableRecord>,
    pub photoelectric: Option<TableRecord>,
    pub form_factor: Option<TableRecord>,
    pub scattering_function: Option<TableRecord>,
}

impl MaterialRecord {
    pub fn void(id: u8, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            density: 0.0,
            coherent: None,
            incoherent: None,
            photoelectric: None,
            form_factor: None,
            scattering_function: None,
        }
    }

    pub fn with_density(mut self, density: Float) -> Self {
        self.density = density;
        self
    }

    pub fn with_coherent(mut self, table: TableRecord, form_factor: TableRecord) -> Self {
        self.coherent = Some(table);
        self.form_factor = Some(form_factor);
        self
    }

    pub fn with_incoherent(mut self, table: TableRecord, scattering_function: TableRecord) -> Self {
        self.incoherent = Some(table);
        self.scattering_function = Some(scattering_function);
        self
    }

    pub fn with_photoelectric(mut self, table: TableRecord) -> Self {
        self.photoelectric = Some(table);
        self
    }
}

pub trait DataAccessObject {
    fn material_ids(&self) -> Vec<u8>;
    fn material(&self, id: u8) -> Result<MaterialRecord, DataError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryDao {
    materials: BTreeMap<u8, MaterialRecord>,
}

impl InMemoryDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: MaterialRecord) {
        self.materials.insert(record.id, record);
    }

    pub fn with_material(mut self, record: MaterialRecord) -> Self {
        self.insert(record);
        self
    }
}

impl DataAccessObject for InMemoryDao {
    fn material_ids(&self) -> Vec<u8> {
        self.materials.keys().cloned().collect()
    }

    fn material(&self, id: u8) -> Result<MaterialRecord, DataError> {
        self.materials
            .get(&id)
            .cloned()
            .ok_or_else(|| DataError::Lookup(format!("no material with id {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_lookup() {
        let dao = InMemoryDao::new()
            .with_material(MaterialRecord::void(0, "vacuum"))
            .with_material(MaterialRecord::void(3, "air").with_density(1.2e-3));
        assert_eq!(dao.material_ids(), vec![0, 3]);
        assert_eq!(dao.material(3).unwrap().name, "air");
        assert!(matches!(dao.material(1), Err(DataError::Lookup(_))));
    }
}
