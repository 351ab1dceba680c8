// Copyright @yucwang 2026

use rand::RngCore;

use crate::core::computation_node::ComputationNode;
use crate::core::photon::Photon;
use crate::math::constants::Float;

// Emits primary photons. Implementations are shared read-only by all workers;
// every worker passes its own random stream.
pub trait PhotonSource: ComputationNode + Send + Sync {
    fn sample_photon(&self, rng: &mut dyn RngCore) -> Photon;

    fn energy_range(&self) -> (Float, Float);
}
