// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run the worker pool and the pipeline together in one process.
//!
//! The pool binds the distribution endpoint first, then the pipeline runs
//! against it exactly as it would against a separately launched
//! `dualfilter-worker`.

use anyhow::{Context, Result};
use clap::Parser;
use dualfilter::config::{load_config, validate_config};
use dualfilter::observability::{init_logging, parse_debug_flags, LogFormat, LoggingOptions};
use dualfilter::pipeline::Pipeline;
use dualfilter::worker::{available_cores, WorkerPool, WorkerPoolConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use tracing::{error, info, warn};

/// Launch the worker pool and the pipeline side by side
#[derive(Parser, Debug)]
#[command(name = "run_local", version, about)]
struct Args {
    /// Input records (JSON)
    input: Option<PathBuf>,

    /// Path to dualfilter.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the pool with a single worker thread
    #[arg(long)]
    single_worker: bool,

    /// Use half of the available cores for the pool
    #[arg(long)]
    half_cpu: bool,

    /// Override both iteration counts, for quick smoke runs
    #[arg(long)]
    iterations: Option<u32>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[PIPELINE] {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse_from(std::env::args().filter(|arg| !arg.starts_with("--debug-")));
    let debug_flags = parse_debug_flags();

    let mut overrides = HashMap::new();
    if let Some(input) = &args.input {
        overrides.insert("pipeline.input".to_string(), input.display().to_string());
    }
    if let Some(output) = &args.output {
        overrides.insert("pipeline.output".to_string(), output.display().to_string());
    }
    if args.single_worker {
        overrides.insert("workers.count".to_string(), "1".to_string());
    }
    if args.half_cpu {
        overrides.insert("workers.half_cpu".to_string(), "true".to_string());
    }
    if let Some(iterations) = args.iterations {
        overrides.insert("compute.reliability_iterations".to_string(), iterations.to_string());
        overrides.insert("workers.stability_iterations".to_string(), iterations.to_string());
    }

    let config = load_config(args.config.as_deref(), Some(&overrides))
        .context("Failed to load configuration")?;

    let logging = LoggingOptions {
        level: config.logging.level.clone(),
        format: config.logging.format.parse::<LogFormat>().unwrap_or_default(),
        log_dir: config.logging.log_dir.clone(),
        file_logging: config.logging.file_logging,
        ..LoggingOptions::default()
    };
    let _log_guard = init_logging(&logging, &debug_flags)?;

    validate_config(&config).context("Invalid configuration")?;

    let pool = WorkerPool::new(WorkerPoolConfig::from_config(&config, available_cores()))?;
    let pool_thread = thread::Builder::new()
        .name("dualfilter-pool".to_string())
        .spawn(move || pool.run())
        .context("Failed to spawn worker pool")?;

    let outcome = Pipeline::new(config).run();

    // The pool only finishes once it has seen the sentinel
    let outcome = outcome?;
    if outcome.summary.distribution.sentinel_sent {
        match pool_thread.join() {
            Ok(Ok(report)) => info!(
                "[WORKER] {}/{} passed on {} workers",
                report.accepted, report.received, report.workers
            ),
            Ok(Err(e)) => error!("[WORKER] Pool failed: {}", e),
            Err(_) => error!("[WORKER] Pool thread panicked"),
        }
    } else {
        warn!("[WORKER] Sentinel never sent, not waiting for the pool");
    }

    if let Some(e) = &outcome.report_error {
        eprintln!("Cannot create output: {}", e);
    }
    let stats = outcome.summary.stats;
    info!(
        "[PIPELINE] total={} filter1={} filter2={} both={} -> {}",
        stats.total,
        stats.filter1,
        stats.filter2,
        stats.both,
        outcome.report_path.display()
    );
    Ok(())
}
