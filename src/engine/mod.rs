// Copyright @yucwang 2026

pub mod physics_engine;

pub use physics_engine::{FreePath, PhysicsEngine, WorkerContext};
