// Copyright @yucwang 2026

use std::fmt;

use crate::math::constants::{Float, Vector3f};

// Missing or unusable cross-section data. Always fatal for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    EmptyTable(String),
    LengthMismatch(String),
    NonMonotonicTable(String),
    NonFiniteValue(String),
    NonPositiveLogData(String),
    MissingTable { material: u8, table: &'static str },
    MissingMaterial(u8),
    InvalidDensity(u8),
    NonPositiveCrossSection { material: u8, energy: Float },
    NegativeMajorant { energy: Float },
    EnergyOutOfRange { energy: Float, min: Float, max: Float },
    Lookup(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::EmptyTable(name) => write!(f, "table {} needs at least two rows", name),
            DataError::LengthMismatch(name) => write!(f, "table {} has mismatched column lengths", name),
            DataError::NonMonotonicTable(name) => write!(f, "abscissae of table {} are not strictly increasing", name),
            DataError::NonFiniteValue(name) => write!(f, "table {} contains a non-finite value", name),
            DataError::NonPositiveLogData(name) => write!(f, "table {} has non-positive values under a log-log interpolator", name),
            DataError::MissingTable { material, table } => write!(f, "material {} has no {} table", material, table),
            DataError::MissingMaterial(id) => write!(f, "material {} is not defined", id),
            DataError::InvalidDensity(id) => write!(f, "material {} needs a positive finite density", id),
            DataError::NonPositiveCrossSection { material, energy } => {
                write!(f, "material {} has a non-positive total cross section at {} eV", material, energy)
            }
            DataError::NegativeMajorant { energy } => write!(f, "majorant cross section is negative at {} eV", energy),
            DataError::EnergyOutOfRange { energy, min, max } => {
                write!(f, "energy {} eV is outside the tabulated range [{}, {}] eV", energy, min, max)
            }
            DataError::Lookup(msg) => write!(f, "material database lookup failed: {}", msg),
        }
    }
}

impl std::error::Error for DataError {}

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    OutOfDomain { position: Vector3f },
    InvalidDimensions(String),
    UnknownMaterial(u8),
    InvalidShape(String),
    UnsupportedQuantity(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::OutOfDomain { position } => {
                write!(f, "position ({}, {}, {}) resolves to no voxel", position.x, position.y, position.z)
            }
            GridError::InvalidDimensions(msg) => write!(f, "invalid grid: {}", msg),
            GridError::UnknownMaterial(id) => write!(f, "voxel references unknown material {}", id),
            GridError::InvalidShape(msg) => write!(f, "invalid tally shape: {}", msg),
            GridError::UnsupportedQuantity(msg) => write!(f, "unsupported tally quantity: {}", msg),
        }
    }
}

impl std::error::Error for GridError {}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    Data(DataError),
    Grid(GridError),
}

impl From<DataError> for TransportError {
    fn from(err: DataError) -> Self {
        TransportError::Data(err)
    }
}

impl From<GridError> for TransportError {
    fn from(err: GridError) -> Self {
        TransportError::Grid(err)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Data(err) => write!(f, "configuration error: {}", err),
            TransportError::Grid(err) => write!(f, "geometry error: {}", err),
        }
    }
}

impl std::error::Error for TransportError {}
