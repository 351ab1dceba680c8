/* Copyright 2020 @Yuchen Wong */

use nalgebra::{Vector2, Vector3};

pub type Float = f64;
pub type Vector2f = Vector2<Float>;
pub type Vector3f = Vector3<Float>;

pub const EPSILON: Float = 1e-9;
pub const PI: Float = std::f64::consts::PI;
pub const SQUARE_2: Float = std::f64::consts::SQRT_2;

// Energies are in eV, lengths in cm.
pub const ELECTRON_REST_MASS: Float = 0.51099895e6;
pub const PLANCK_CONSTANT: Float = 4.135667662e-15;
pub const SPEED_OF_LIGHT: Float = 299792458e2;

// Converts `k = E / m_e c^2` and `sqrt(1 - cos(theta))` into the momentum
// transfer variable `x = sin(theta / 2) / lambda` in inverse angstrom.
pub const ALPHA: Float = ELECTRON_REST_MASS / (SQUARE_2 * PLANCK_CONSTANT * SPEED_OF_LIGHT * 1e8);
