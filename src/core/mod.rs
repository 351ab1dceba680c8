// Copyright @yucwang 2026

pub mod computation_node;
pub mod domain;
pub mod error;
pub mod photon;
pub mod probability_dist;
pub mod rng;
pub mod run_loader;
pub mod source;
pub mod statistics;
