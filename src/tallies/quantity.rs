// Copyright @yucwang 2026

use crate::core::photon::ScatterOrder;
use crate::core::statistics::{Estimate, Welford};
use crate::math::constants::Float;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QuantityClass {
    Count,
    Vector,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    EnergyDeposition,
    IncidentEnergy,
    EntranceCosine,
    NumberOfPhotons,
    NumberOfInteractions,
}

impl Quantity {
    pub fn class(&self) -> QuantityClass {
        match self {
            Quantity::NumberOfPhotons | Quantity::NumberOfInteractions => QuantityClass::Count,
            Quantity::EnergyDeposition | Quantity::IncidentEnergy | Quantity::EntranceCosine => QuantityClass::Vector,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quantity::EnergyDeposition => "energy_deposition",
            Quantity::IncidentEnergy => "incident_energy",
            Quantity::EntranceCosine => "entrance_cosine",
            Quantity::NumberOfPhotons => "number_of_photons",
            Quantity::NumberOfInteractions => "number_of_interactions",
        }
    }

    pub fn from_name(name: &str) -> Option<Quantity> {
        match name.trim() {
            "energy_deposition" => Some(Quantity::EnergyDeposition),
            "incident_energy" => Some(Quantity::IncidentEnergy),
            "entrance_cosine" => Some(Quantity::EntranceCosine),
            "number_of_photons" => Some(Quantity::NumberOfPhotons),
            "number_of_interactions" => Some(Quantity::NumberOfInteractions),
            _ => None,
        }
    }
}

// Uniform energy bins on `[min, max)`. A single unbounded bin when `count == 1`
// and the range is infinite.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EnergyBins {
    min: Float,
    max: Float,
    count: usize,
}

impl Default for EnergyBins {
    fn default() -> Self {
        Self { min: 0.0, max: Float::INFINITY, count: 1 }
    }
}

impl EnergyBins {
    pub fn uniform(min: Float, max: Float, count: usize) -> Option<Self> {
        if count == 0 || !(max > min) || !max.is_finite() || min < 0.0 {
            return None;
        }
        Some(Self { min, max, count })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bin_of(&self, energy: Float) -> Option<usize> {
        if energy < self.min || energy >= self.max {
            return None;
        }
        if self.count == 1 {
            return Some(0);
        }
        let b = ((energy - self.min) / (self.max - self.min) * self.count as Float) as usize;
        Some(b.min(self.count - 1))
    }

    pub fn edges(&self, bin: usize) -> (Float, Float) {
        if !self.max.is_finite() {
            return (self.min, self.max);
        }
        let w = (self.max - self.min) / self.count as Float;
        (self.min + w * bin as Float, self.min + w * (bin + 1) as Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TallyEstimate {
    pub quantity: Quantity,
    pub order: ScatterOrder,
    pub bin: (Float, Float),
    pub estimate: Estimate,
}

// Welford cells laid out as `[quantity][scatter order][energy bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityContainer {
    quantities: Vec<Quantity>,
    bins: EnergyBins,
    cells: Vec<Welford>,
}

impl QuantityContainer {
    pub fn new(quantities: &[Quantity], bins: EnergyBins) -> Self {
        let mut unique: Vec<Quantity> = quantities.to_vec();
        unique.sort_unstable();
        unique.dedup();
        let size = unique.len() * ScatterOrder::ALL.len() * bins.count();
        Self { quantities: unique, bins, cells: vec![Welford::new(); size] }
    }

    pub fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    pub fn bins(&self) -> &EnergyBins {
        &self.bins
    }

    pub fn cell_index(&self, quantity: Quantity, order: ScatterOrder, energy: Float) -> Option<usize> {
        let q = self.quantities.iter().position(|x| *x == quantity)?;
        let bin = self.bins.bin_of(energy)?;
        Some((q * ScatterOrder::ALL.len() + order.index()) * self.bins.count() + bin)
    }

    pub fn cell(&self, index: usize) -> &Welford {
        &self.cells[index]
    }

    pub fn update_welford(&mut self, index: usize, x: Float) {
        self.cells[index].update(x);
    }

    pub fn merge(&mut self, other: &QuantityContainer) {
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells.iter()) {
            mine.merge(theirs);
        }
    }

    pub fn reset(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = Welford::new();
        }
    }

    pub fn finalize(&self, histories: u64) -> Vec<TallyEstimate> {
        let nbins = self.bins.count();
        let mut out = Vec::with_capacity(self.cells.len());
        for (q, quantity) in self.quantities.iter().enumerate() {
            for order in ScatterOrder::ALL.iter() {
                for bin in 0..nbins {
                    let index = (q * ScatterOrder::ALL.len() + order.index()) * nbins + bin;
                    out.push(TallyEstimate {
                        quantity: *quantity,
                        order: *order,
                        bin: self.bins.edges(bin),
                        estimate: self.cells[index].finalize(histories),
                    });
                }
            }
        }
        out
    }

    pub fn total_mean(&self, quantity: Quantity, histories: u64) -> Float {
        self.finalize(histories)
            .iter()
            .filter(|e| e.quantity == quantity)
            .map(|e| e.estimate.mean)
            .sum()
    }
}
