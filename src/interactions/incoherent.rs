// Copyright @yucwang 2026

use rand::Rng;

use crate::core::error::DataError;
use crate::core::photon::{InteractionType, Photon};
use crate::core::probability_dist::Uniform;
use crate::data::material_data::MaterialData;
use crate::interactions::InteractionOutcome;
use crate::math::constants::{Float, ALPHA, ELECTRON_REST_MASS, PI, SQUARE_2};
use crate::math::frame::rotate_direction;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct IncoherentScattering;

impl IncoherentScattering {
    pub fn interact<R: Rng + ?Sized>(
        &self,
        photon: &mut Photon,
        material: &MaterialData,
        rng: &mut R,
    ) -> Result<InteractionOutcome, DataError> {
        let energy = photon.energy();
        let k = energy / ELECTRON_REST_MASS;
        let s_max = material.scattering_function(ALPHA * k * SQUARE_2);

        let (ratio, mu) = loop {
            let (ratio, mu) = sample_klein_nishina(k, rng);
            if s_max <= 0.0 {
                break (ratio, mu);
            }
            let s = material.scattering_function(ALPHA * k * (1.0 - mu).max(0.0).sqrt());
            if Uniform::sample(rng) * s_max <= s {
                break (ratio, mu);
            }
        };

        let outgoing = energy / ratio;
        let phi = 2.0 * PI * Uniform::sample(rng);
        photon.record_interaction(InteractionType::Incoherent);
        photon.set_energy(outgoing);
        photon.set_direction(rotate_direction(&photon.direction(), mu, phi));
        Ok(InteractionOutcome { energy_deposited: energy - outgoing })
    }
}

// Kahn's rejection sampler for the Klein-Nishina cross section. Returns
// `(E / E', cos(theta))` for reduced energy `k = E / m_e c^2`.
pub fn sample_klein_nishina<R: Rng + ?Sized>(k: Float, rng: &mut R) -> (Float, Float) {
    let threshold = (1.0 + 2.0 * k) / (9.0 + 2.0 * k);
    loop {
        let r1 = Uniform::sample(rng);
        let r2 = Uniform::sample(rng);
        let r3 = Uniform::sample(rng);
        if r1 <= threshold {
            let ratio = 1.0 + 2.0 * k * r2;
            if r3 <= 4.0 * (1.0 / ratio - 1.0 / (ratio * ratio)) {
                let mu = 1.0 - (ratio - 1.0) / k;
                return (ratio, mu.clamp(-1.0, 1.0));
            }
        } else {
            let ratio = (1.0 + 2.0 * k) / (1.0 + 2.0 * k * r2);
            let mu = 1.0 - (ratio - 1.0) / k;
            if r3 <= 0.5 * (mu * mu + 1.0 / ratio) {
                return (ratio, mu.clamp(-1.0, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::PcgRng;
    use crate::data::material_data::test_tables::scatterer;
    use crate::data::material_data::DEFAULT_RITA_ERROR;
    use crate::math::constants::Vector3f;

    fn klein_nishina_mean_cosine(k: Float) -> Float {
        let pdf = |mu: Float| {
            let p = 1.0 / (1.0 + k * (1.0 - mu));
            p * p * (p + 1.0 / p - 1.0 + mu * mu)
        };
        let n = 4000;
        let h = 2.0 / n as Float;
        let (mut norm, mut first) = (0.0, 0.0);
        for i in 0..n {
            let mu = -1.0 + (i as Float + 0.5) * h;
            norm += pdf(mu);
            first += mu * pdf(mu);
        }
        first / norm
    }

    #[test]
    fn kahn_reproduces_klein_nishina() {
        let mut rng = PcgRng::new(99);
        for k in [0.1, 1.0, 4.0] {
            let samples = 100_000;
            let mut mean = 0.0;
            for _ in 0..samples {
                let (ratio, mu) = sample_klein_nishina(k, &mut rng);
                assert!(ratio >= 1.0 - 1e-12 && ratio <= 1.0 + 2.0 * k + 1e-12);
                assert!(((1.0 + k * (1.0 - mu)) - ratio).abs() < 1e-9);
                mean += mu;
            }
            mean /= samples as Float;
            let expected = klein_nishina_mean_cosine(k);
            assert!((mean - expected).abs() < 0.012, "k {} mean {} expected {}", k, mean, expected);
        }
    }

    #[test]
    fn conserves_energy_and_keeps_unit_direction() {
        let material = MaterialData::from_record(&scatterer(1, 1.0), DEFAULT_RITA_ERROR).unwrap();
        let mut rng = PcgRng::new(5);
        let mut photon = Photon::new(Vector3f::zeros(), Vector3f::new(0.3, -0.2, 0.9), 5e5);
        for _ in 0..2000 {
            let before = photon.energy();
            if before < 2e3 {
                photon.set_energy(5e5);
                continue;
            }
            let outcome = IncoherentScattering.interact(&mut photon, &material, &mut rng).unwrap();
            assert!(outcome.energy_deposited >= 0.0);
            assert!((outcome.energy_deposited + photon.energy() - before).abs() <= 1e-9 * before);
            assert!((photon.direction().norm() - 1.0).abs() < 1e-9);
        }
        assert_eq!(photon.history().incoherent_count() as usize, photon.history().len());
    }
}
