// Copyright @yucwang 2026

use rand::RngCore;

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::error::DataError;
use crate::core::photon::Photon;
use crate::core::probability_dist::{DiscreteInversion, Uniform};
use crate::core::source::PhotonSource;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::frame::Frame;
use crate::math::warp::{sample_uniform_cone, sample_uniform_sphere};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Directionality {
    Beam(Vector3f),
    Isotropic,
    // Uniform over the cap `cos(theta) >= cos_theta_max` around `axis`.
    Cone { axis: Vector3f, cos_theta_max: Float },
}

#[derive(Debug, Clone)]
pub enum EnergySpectrum {
    Mono(Float),
    Poly(DiscreteInversion<Float>),
}

impl EnergySpectrum {
    pub fn lines(lines: &[(Float, Float)]) -> Result<Self, DataError> {
        if let Some((e, _)) = lines.iter().find(|(e, _)| !(*e > 0.0) || !e.is_finite()) {
            return Err(DataError::NonFiniteValue(format!("spectrum line energy {}", e)));
        }
        Ok(EnergySpectrum::Poly(DiscreteInversion::new(lines)?))
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> Float {
        match self {
            EnergySpectrum::Mono(e) => *e,
            EnergySpectrum::Poly(dist) => dist.sample(rng),
        }
    }

    pub fn energy_range(&self) -> (Float, Float) {
        match self {
            EnergySpectrum::Mono(e) => (*e, *e),
            EnergySpectrum::Poly(dist) => dist
                .outcomes()
                .iter()
                .enumerate()
                .filter(|(i, _)| dist.probability(*i) > 0.0)
                .fold((Float::INFINITY, 0.0), |(lo, hi), (_, e)| (lo.min(*e), hi.max(*e))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointSource {
    id: String,
    position: Vector3f,
    directionality: Directionality,
    spectrum: EnergySpectrum,
    weight: Float,
}

impl PointSource {
    pub fn new(position: Vector3f, directionality: Directionality, spectrum: EnergySpectrum) -> Result<Self, DataError> {
        let directionality = match directionality {
            Directionality::Beam(d) => {
                if !(d.norm() > EPSILON) {
                    return Err(DataError::NonFiniteValue("beam direction is zero".to_string()));
                }
                Directionality::Beam(d.normalize())
            }
            Directionality::Cone { axis, cos_theta_max } => {
                if !(axis.norm() > EPSILON) || !(-1.0..=1.0).contains(&cos_theta_max) {
                    return Err(DataError::NonFiniteValue("cone axis or aperture".to_string()));
                }
                Directionality::Cone { axis: axis.normalize(), cos_theta_max }
            }
            Directionality::Isotropic => Directionality::Isotropic,
        };
        if let EnergySpectrum::Mono(e) = spectrum {
            if !(e > 0.0) || !e.is_finite() {
                return Err(DataError::NonFiniteValue(format!("source energy {}", e)));
            }
        }
        Ok(Self { id: generate_node_id("point_source"), position, directionality, spectrum, weight: 1.0 })
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_weight(mut self, weight: Float) -> Self {
        self.weight = weight;
        self
    }

    pub fn position(&self) -> Vector3f {
        self.position
    }

    pub fn directionality(&self) -> &Directionality {
        &self.directionality
    }

    fn sample_direction(&self, rng: &mut dyn RngCore) -> Vector3f {
        match self.directionality {
            Directionality::Beam(d) => d,
            Directionality::Isotropic => {
                let u = Vector2f::new(Uniform::sample(rng), Uniform::sample(rng));
                sample_uniform_sphere(&u)
            }
            Directionality::Cone { axis, cos_theta_max } => {
                let u = Vector2f::new(Uniform::sample(rng), Uniform::sample(rng));
                Frame::from_z(&axis).from_local(&sample_uniform_cone(&u, cos_theta_max))
            }
        }
    }
}

impl PhotonSource for PointSource {
    fn sample_photon(&self, rng: &mut dyn RngCore) -> Photon {
        let direction = self.sample_direction(rng);
        let energy = self.spectrum.sample(rng);
        Photon::new(self.position, direction, energy).with_weight(self.weight)
    }

    fn energy_range(&self) -> (Float, Float) {
        self.spectrum.energy_range()
    }
}

impl ComputationNode for PointSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &'static str {
        "point source"
    }

    fn to_string(&self) -> String {
        let (lo, hi) = self.energy_range();
        format!(
            "PointSource[id={}, position=({:.3}, {:.3}, {:.3}), energy={:.1}-{:.1} eV, {:?}]",
            self.id, self.position.x, self.position.y, self.position.z, lo, hi, self.directionality
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::PcgRng;

    #[test]
    fn beam_is_deterministic() {
        let source = PointSource::new(Vector3f::new(1.0, 2.0, 3.0), Directionality::Beam(Vector3f::new(0.0, 0.0, 2.0)), EnergySpectrum::Mono(6e4)).unwrap();
        let mut rng = PcgRng::new(1);
        let photon = source.sample_photon(&mut rng);
        assert_eq!(photon.position(), Vector3f::new(1.0, 2.0, 3.0));
        assert!((photon.direction() - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert_eq!(photon.energy(), 6e4);
        assert_eq!(source.energy_range(), (6e4, 6e4));
    }

    #[test]
    fn cone_stays_inside_aperture() {
        let axis = Vector3f::new(1.0, 1.0, 0.0).normalize();
        let source = PointSource::new(Vector3f::zeros(), Directionality::Cone { axis, cos_theta_max: 0.9 }, EnergySpectrum::Mono(1e4)).unwrap();
        let mut rng = PcgRng::new(7);
        for _ in 0..2000 {
            let d = source.sample_photon(&mut rng).direction();
            assert!((d.norm() - 1.0).abs() < 1e-9);
            assert!(d.dot(&axis) >= 0.9 - 1e-9);
        }
    }

    #[test]
    fn isotropic_has_zero_mean_direction() {
        let source = PointSource::new(Vector3f::zeros(), Directionality::Isotropic, EnergySpectrum::Mono(1e4)).unwrap();
        let mut rng = PcgRng::new(3);
        let n = 100_000;
        let mut sum = Vector3f::zeros();
        for _ in 0..n {
            sum += source.sample_photon(&mut rng).direction();
        }
        // each component has variance 1/3 per sample
        let tol = 5.0 * (1.0 / 3.0 / n as Float).sqrt();
        assert!((sum / n as Float).amax() < tol);
    }

    #[test]
    fn poly_spectrum_follows_line_weights() {
        let spectrum = EnergySpectrum::lines(&[(2e4, 1.0), (5e4, 3.0), (8e4, 0.0)]).unwrap();
        assert_eq!(spectrum.energy_range(), (2e4, 5e4));
        let source = PointSource::new(Vector3f::zeros(), Directionality::Isotropic, spectrum).unwrap();
        let mut rng = PcgRng::new(11);
        let n = 100_000;
        let high = (0..n).filter(|_| source.sample_photon(&mut rng).energy() == 5e4).count();
        let p = high as Float / n as Float;
        assert!((p - 0.75).abs() < 5.0 * (0.75 * 0.25 / n as Float).sqrt());
        assert!(EnergySpectrum::lines(&[(-1.0, 1.0)]).is_err());
    }
}
