// Copyright @yucwang 2026

use std::fmt;
use std::time::Duration;

use crate::core::error::TransportError;
use crate::core::source::PhotonSource;
use crate::core::statistics::Estimate;
use crate::engine::PhysicsEngine;
use crate::grid::VoxelGrid;
use crate::math::constants::Float;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SimulationSettings {
    pub photons: u64,
    pub seed: u64,
    // Zero picks the available parallelism.
    pub threads: usize,
    pub histories_per_chunk: u64,
    pub energy_cutoff: Option<Float>,
    pub block_size: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            photons: 100_000,
            seed: 0,
            threads: 0,
            histories_per_chunk: 10_000,
            energy_cutoff: None,
            block_size: crate::grid::voxel_grid::DEFAULT_BLOCK_SIZE,
        }
    }
}

impl SimulationSettings {
    pub fn chunk_count(&self) -> usize {
        let per_chunk = self.histories_per_chunk.max(1);
        ((self.photons + per_chunk - 1) / per_chunk) as usize
    }

    pub fn chunk_range(&self, chunk: usize) -> (u64, u64) {
        let per_chunk = self.histories_per_chunk.max(1);
        let first = chunk as u64 * per_chunk;
        (first, (first + per_chunk).min(self.photons))
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub histories: u64,
    pub absorbed: u64,
    pub escaped: u64,
    pub chunks: usize,
    pub threads: usize,
    pub elapsed: Duration,
    pub voxel_deposits: Vec<([usize; 3], Estimate)>,
    pub total_deposited: Float,
}

impl RunSummary {
    pub fn voxel_deposits(grid: &VoxelGrid, histories: u64) -> (Vec<([usize; 3], Estimate)>, Float) {
        let [nx, ny, _] = grid.dims();
        let mut deposits = Vec::new();
        let mut total = 0.0;
        for (index, voxel) in grid.voxels().iter().enumerate() {
            let acc = voxel.energy_deposition();
            if acc.count() == 0 {
                continue;
            }
            total += acc.sum();
            let idx = [index % nx, (index / nx) % ny, index / (nx * ny)];
            deposits.push((idx, acc.finalize(histories)));
        }
        (deposits, total)
    }
}

// A failed run. Histories of the chunks merged before the failure stay in
// the engine tallies.
#[derive(Debug)]
pub struct RunError {
    pub histories_completed: u64,
    pub error: TransportError,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run failed after {} histories: {}", self.histories_completed, self.error)
    }
}

impl std::error::Error for RunError {}

pub trait Runner {
    fn run(&self, engine: &mut PhysicsEngine, source: &dyn PhotonSource) -> Result<RunSummary, RunError>;
}
