// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `dualfilter-worker` - serve one pipeline run as the filter 2 worker pool

use anyhow::{Context, Result};
use clap::Parser;
use dualfilter_config::{load_config, validate_config};
use dualfilter_observability::{init_logging, CrateDebugFlags, LogFormat, LoggingOptions, DEBUG_ENV};
use dualfilter_worker::{available_cores, WorkerPool, WorkerPoolConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Stability worker pool for the dualfilter pipeline
#[derive(Parser, Debug)]
#[command(name = "dualfilter-worker", version, about, after_help = dualfilter_observability::debug_flags_help())]
struct Args {
    /// Path to dualfilter.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single worker thread (wins over the other sizing flags)
    #[arg(long)]
    single_worker: bool,

    /// Use half of the available cores
    #[arg(long)]
    half_cpu: bool,

    /// Explicit number of worker threads
    #[arg(long)]
    workers: Option<usize>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if self.single_worker {
            overrides.insert("workers.count".to_string(), "1".to_string());
        } else if let Some(count) = self.workers {
            overrides.insert("workers.count".to_string(), count.to_string());
        }
        if self.half_cpu {
            overrides.insert("workers.half_cpu".to_string(), "true".to_string());
        }
        overrides
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[WORKER] {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let (debug_args, cli_args): (Vec<String>, Vec<String>) =
        std::env::args().partition(|arg| arg.starts_with("--debug-"));
    let args = Args::parse_from(cli_args);

    let mut debug_flags = CrateDebugFlags::from_args(debug_args);
    if let Ok(value) = std::env::var(DEBUG_ENV) {
        debug_flags.merge_env_value(&value);
    }

    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
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

    let pool_config = WorkerPoolConfig::from_config(&config, available_cores());
    info!(
        "[WORKER] dualfilter-worker v{}: {} workers, {} iterations, listening on {}",
        env!("CARGO_PKG_VERSION"),
        pool_config.workers,
        pool_config.stability_iterations,
        pool_config.distribution_endpoint
    );

    let report = WorkerPool::new(pool_config)?.run()?;

    info!(
        "[WORKER] Total time: {:.2} seconds ({} received, {} passed, {} sent)",
        report.elapsed.as_secs_f64(),
        report.received,
        report.accepted,
        report.sent
    );

    Ok(())
}
