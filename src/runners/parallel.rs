// Copyright @yucwang 2026

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::computation_node::ComputationNode;
use crate::core::error::TransportError;
use crate::core::rng::PcgRng;
use crate::core::source::PhotonSource;
use crate::engine::PhysicsEngine;
use crate::runners::runner::{RunError, RunSummary, Runner, SimulationSettings};
use crate::tallies::TallyAccumulators;

struct ChunkResult {
    tallies: TallyAccumulators,
    absorbed: u64,
    escaped: u64,
}

// Runs histories in fixed-size chunks on a scoped worker pool. Chunk `c`
// draws from random stream `c`, and chunks are merged in index order, so the
// tallies do not depend on the thread count.
pub struct ParallelRunner {
    settings: SimulationSettings,
    show_progress: bool,
}

impl ParallelRunner {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings, show_progress: true }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    fn thread_count(&self, chunks: usize) -> usize {
        let threads = match self.settings.threads {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        threads.min(chunks).max(1)
    }

    fn run_chunk(&self, engine: &PhysicsEngine, source: &dyn PhotonSource, chunk: usize) -> Result<ChunkResult, TransportError> {
        let (first, last) = self.settings.chunk_range(chunk);
        let mut ctx = engine.worker_context(PcgRng::with_stream(self.settings.seed, chunk as u64));
        for _ in first..last {
            let mut photon = source.sample_photon(&mut ctx.rng);
            engine.transport_photon(&mut photon, &mut ctx)?;
        }
        Ok(ChunkResult { tallies: ctx.tallies, absorbed: ctx.absorbed, escaped: ctx.escaped })
    }
}

impl Runner for ParallelRunner {
    fn run(&self, engine: &mut PhysicsEngine, source: &dyn PhotonSource) -> Result<RunSummary, RunError> {
        let (lo, hi) = source.energy_range();
        if let Err(err) = engine.interaction_data().validate_energy_window(lo, hi) {
            return Err(RunError { histories_completed: 0, error: err.into() });
        }

        let total_chunks = self.settings.chunk_count();
        let thread_count = self.thread_count(total_chunks);
        log::info!(
            "Transporting {} photons from {} in {} chunks on {} threads.",
            self.settings.photons,
            source.id(),
            total_chunks,
            thread_count
        );

        let progress = if self.show_progress { ProgressBar::new(total_chunks as u64) } else { ProgressBar::hidden() };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} chunks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let start = Instant::now();
        let next_chunk = Arc::new(AtomicUsize::new(0));
        let abort = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<(usize, Result<ChunkResult, TransportError>)>();
        let mut merged = engine.new_accumulators();
        let mut absorbed = 0;
        let mut escaped = 0;
        let mut failure: Option<TransportError> = None;
        let engine_ref: &PhysicsEngine = engine;

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_chunk = Arc::clone(&next_chunk);
                let abort = Arc::clone(&abort);
                let tx = tx.clone();
                scope.spawn(move || loop {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    let chunk = next_chunk.fetch_add(1, Ordering::Relaxed);
                    if chunk >= total_chunks {
                        break;
                    }
                    let result = self.run_chunk(engine_ref, source, chunk);
                    if result.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    if tx.send((chunk, result)).is_err() {
                        break;
                    }
                });
            }

            drop(tx);
            // Chunks are folded strictly in index order; later ones wait here.
            let mut pending = BTreeMap::new();
            let mut next = 0usize;
            for (chunk, result) in rx.iter() {
                pending.insert(chunk, result);
                while let Some(result) = pending.remove(&next) {
                    match result {
                        Ok(chunk) if failure.is_none() => {
                            merged.merge(&chunk.tallies);
                            absorbed += chunk.absorbed;
                            escaped += chunk.escaped;
                            progress.inc(1);
                        }
                        Ok(_) => {}
                        Err(err) => {
                            if failure.is_none() {
                                log::warn!("Chunk {} failed: {}", next, err);
                                failure = Some(err);
                            }
                        }
                    }
                    next += 1;
                }
            }
        });
        progress.finish_and_clear();

        engine.merge_accumulators(&merged);
        if let Some(error) = failure {
            return Err(RunError { histories_completed: merged.histories(), error });
        }

        let (voxel_deposits, total_deposited) = RunSummary::voxel_deposits(engine.voxel_grid(), engine.histories());
        let elapsed = start.elapsed();
        log::info!(
            "Finished {} histories in {:.2}s ({} absorbed, {} escaped).",
            merged.histories(),
            elapsed.as_secs_f64(),
            absorbed,
            escaped
        );
        Ok(RunSummary {
            histories: merged.histories(),
            absorbed,
            escaped,
            chunks: total_chunks,
            threads: thread_count,
            elapsed,
            voxel_deposits,
            total_deposited,
        })
    }
}
