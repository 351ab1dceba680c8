// Copyright @yucwang 2026

pub mod parallel;
pub mod runner;

pub use parallel::ParallelRunner;
pub use runner::{RunError, RunSummary, Runner, SimulationSettings};
