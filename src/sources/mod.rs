// Copyright @yucwang 2026

pub mod point;

pub use point::{Directionality, EnergySpectrum, PointSource};
