// Copyright @yucwang 2026

use crate::core::error::DataError;
use crate::core::photon::InteractionType;
use crate::core::probability_dist::ContinuousInversion;
use crate::data::dao::{MaterialRecord, TableRecord};
use crate::math::constants::{Float, ALPHA, ELECTRON_REST_MASS};
use crate::math::interpolator::{InterpolationKind, Interpolator};

pub const DEFAULT_RITA_ERROR: Float = 1e-4;

// Interpolated cross sections (linear attenuation, 1/cm) of one material.
#[derive(Debug, Clone)]
pub struct MaterialData {
    id: u8,
    name: String,
    density: Float,
    coherent: Option<Interpolator>,
    incoherent: Option<Interpolator>,
    photoelectric: Option<Interpolator>,
    total: Option<Interpolator>,
    form_factor: Option<Interpolator>,
    scattering_function: Option<Interpolator>,
    coherent_angles: Option<ContinuousInversion>,
    energy_range: (Float, Float),
}

impl MaterialData {
    pub fn from_record(record: &MaterialRecord, rita_error: Float) -> Result<Self, DataError> {
        let id = record.id;
        let has_channel = record.coherent.is_some() || record.incoherent.is_some() || record.photoelectric.is_some();
        if !has_channel {
            return Ok(Self {
                id,
                name: record.name.clone(),
                density: record.density,
                coherent: None,
                incoherent: None,
                photoelectric: None,
                total: None,
                form_factor: None,
                scattering_function: None,
                coherent_angles: None,
                energy_range: (0.0, Float::INFINITY),
            });
        }
        if !(record.density > 0.0 && record.density.is_finite()) {
            return Err(DataError::InvalidDensity(id));
        }

        let channel = |table: &Option<TableRecord>, kind: InterpolationKind, name: &str| -> Result<Option<Interpolator>, DataError> {
            match table {
                Some(t) => {
                    let scaled: Vec<Float> = t.y.iter().map(|v| v * record.density).collect();
                    Ok(Some(Interpolator::new(kind, &format!("{}/{}", record.name, name), &t.x, &scaled)?))
                }
                None => Ok(None),
            }
        };
        let coherent = channel(&record.coherent, InterpolationKind::LogLogSpline, "coherent")?;
        let incoherent = channel(&record.incoherent, InterpolationKind::LogLogSpline, "incoherent")?;
        let photoelectric = channel(&record.photoelectric, InterpolationKind::LogLogLinear, "photoelectric")?;

        let shape = |table: &Option<TableRecord>, name: &'static str| -> Result<Interpolator, DataError> {
            let t = table.as_ref().ok_or(DataError::MissingTable { material: id, table: name })?;
            Interpolator::new(InterpolationKind::LogLogLinearFromZero, &format!("{}/{}", record.name, name), &t.x, &t.y)
        };
        let form_factor = match coherent {
            Some(_) => Some(shape(&record.form_factor, "form factor")?),
            None => None,
        };
        let scattering_function = match incoherent {
            Some(_) => Some(shape(&record.scattering_function, "scattering function")?),
            None => None,
        };

        let mut energy_range = (0.0, Float::INFINITY);
        for table in [&record.coherent, &record.incoherent, &record.photoelectric].iter().filter_map(|t| t.as_ref()) {
            energy_range.0 = Float::max(energy_range.0, table.x[0]);
            energy_range.1 = Float::min(energy_range.1, table.x[table.x.len() - 1]);
        }
        if !(energy_range.1 > energy_range.0) {
            return Err(DataError::EnergyOutOfRange { energy: energy_range.0, min: energy_range.0, max: energy_range.1 });
        }

        let mut material = Self {
            id,
            name: record.name.clone(),
            density: record.density,
            coherent,
            incoherent,
            photoelectric,
            total: None,
            form_factor,
            scattering_function,
            coherent_angles: None,
            energy_range,
        };
        material.total = Some(material.build_total()?);
        if material.coherent.is_some() {
            material.coherent_angles = Some(material.build_coherent_angles(rita_error)?);
        }
        Ok(material)
    }

    fn knots_in_range(&self, interp: &Interpolator) -> Vec<Float> {
        let (lo, hi) = self.energy_range;
        interp.knots().into_iter().filter(|e| *e > lo && *e < hi).collect()
    }

    fn build_total(&self) -> Result<Interpolator, DataError> {
        let (lo, hi) = self.energy_range;
        let mut energies = vec![lo, hi];
        for interp in [&self.coherent, &self.incoherent, &self.photoelectric].iter().filter_map(|c| c.as_ref()) {
            energies.extend(self.knots_in_range(interp));
        }
        energies.sort_by(|a, b| a.total_cmp(b));
        energies.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * b.abs());

        let mut values = Vec::with_capacity(energies.len());
        for e in energies.iter() {
            let sigma = InteractionType::ALL.iter().map(|it| self.channel_cross_section(*it, *e)).sum::<Float>();
            if !(sigma > 0.0) || !sigma.is_finite() {
                return Err(DataError::NonPositiveCrossSection { material: self.id, energy: *e });
            }
            values.push(sigma);
        }
        Interpolator::new(InterpolationKind::LogLogLinear, &format!("{}/total", self.name), &energies, &values)
    }

    // Rayleigh angular tables: pdf(mu) ~ (1 + mu^2) F(x)^2 at every coherent knot.
    fn build_coherent_angles(&self, rita_error: Float) -> Result<ContinuousInversion, DataError> {
        let (lo, hi) = self.energy_range;
        let mut energies = vec![lo];
        if let Some(coherent) = &self.coherent {
            energies.extend(self.knots_in_range(coherent));
        }
        energies.push(hi);
        let form_factor = self.form_factor.as_ref().ok_or(DataError::MissingTable { material: self.id, table: "form factor" })?;
        let pdf = |mu: Float, energy: Float| {
            let x = ALPHA * energy / ELECTRON_REST_MASS * (1.0 - mu).max(0.0).sqrt();
            let f = form_factor.eval(x);
            (1.0 + mu * mu) * f * f
        };
        ContinuousInversion::from_pdf(pdf, &energies, -1.0, 1.0, rita_error)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn density(&self) -> Float {
        self.density
    }

    pub fn is_void(&self) -> bool {
        self.total.is_none()
    }

    pub fn energy_range(&self) -> (Float, Float) {
        self.energy_range
    }

    pub fn contains_energy(&self, energy: Float) -> bool {
        energy >= self.energy_range.0 && energy <= self.energy_range.1
    }

    pub fn channel_cross_section(&self, interaction: InteractionType, energy: Float) -> Float {
        let table = match interaction {
            InteractionType::Coherent => &self.coherent,
            InteractionType::Incoherent => &self.incoherent,
            InteractionType::Photoelectric => &self.photoelectric,
        };
        table.as_ref().map_or(0.0, |t| t.eval(energy))
    }

    pub fn total_cross_section(&self, energy: Float) -> Float {
        self.total.as_ref().map_or(0.0, |t| t.eval(energy))
    }

    // Form factor F(x); zero for materials without a coherent channel.
    pub fn form_factor(&self, x: Float) -> Float {
        self.form_factor.as_ref().map_or(0.0, |t| t.eval(x))
    }

    pub fn scattering_function(&self, x: Float) -> Float {
        self.scattering_function.as_ref().map_or(0.0, |t| t.eval(x))
    }

    pub fn coherent_angles(&self) -> Option<&ContinuousInversion> {
        self.coherent_angles.as_ref()
    }
}
