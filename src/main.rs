// Copyright @yucwang 2026

use madeleine::core::computation_node::ComputationNode;
use madeleine::core::run_loader::load_run;
use madeleine::engine::PhysicsEngine;
use madeleine::runners::{ParallelRunner, RunSummary, Runner};
use madeleine::tallies::TallyEstimate;

use console::style;
use std::env;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <run.xml> [--photons N] [--seed N] [--threads N] [--chunk N]", args[0]);
        std::process::exit(1);
    }

    let mut run = match load_run(&args[1]) {
        Ok(run) => run,
        Err(err) => {
            eprintln!("{} {}", style("error:").bold().red(), err);
            std::process::exit(1);
        }
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--photons" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    run.settings.photons = v;
                }
            }
            "--seed" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    run.settings.seed = v;
                }
            }
            "--threads" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    run.settings.threads = v;
                }
            }
            "--chunk" => {
                i += 1;
                if let Some(v) = args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    run.settings.histories_per_chunk = v;
                }
            }
            other => log::warn!("Ignoring unknown argument {}.", other),
        }
        i += 1;
    }

    println!("{} {}", style("->").bold().dim(), style("Transporting photons...").bold().blue());
    let runner = ParallelRunner::new(run.settings);
    match runner.run(&mut run.engine, run.source.as_ref()) {
        Ok(summary) => print_summary(&run.engine, &summary),
        Err(err) => {
            eprintln!("{} {}", style("error:").bold().red(), err);
            std::process::exit(2);
        }
    }
}

fn print_estimates(estimates: &[TallyEstimate]) {
    for e in estimates.iter().filter(|e| e.estimate.samples > 0) {
        let order = e.order.name();
        if e.bin.1.is_finite() {
            println!("     {:<24} {:<18} [{:.0}, {:.0}) eV  {}", e.quantity.name(), order, e.bin.0, e.bin.1, e.estimate);
        } else {
            println!("     {:<24} {:<18} {}", e.quantity.name(), order, e.estimate);
        }
    }
}

fn print_summary(engine: &PhysicsEngine, summary: &RunSummary) {
    println!(
        "{} {} histories in {:.2}s on {} threads: {} absorbed, {} escaped",
        style("->").bold().dim(),
        style(summary.histories).bold(),
        summary.elapsed.as_secs_f64(),
        summary.threads,
        summary.absorbed,
        summary.escaped
    );
    println!(
        "{} energy deposited in grid: {:.6e} eV over {} voxels",
        style("->").bold().dim(),
        summary.total_deposited,
        summary.voxel_deposits.len()
    );

    let histories = engine.histories();
    for tally in engine.get_volume_tallies() {
        println!("{} {}", style("->").bold().dim(), style(tally.to_string()).bold().blue());
        print_estimates(&tally.finalize(histories));
    }
    for tally in engine.get_surface_tallies() {
        println!("{} {}", style("->").bold().dim(), style(tally.to_string()).bold().blue());
        print_estimates(&tally.finalize(histories));
    }
}
