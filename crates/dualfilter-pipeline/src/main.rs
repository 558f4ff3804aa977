// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! `dualfilter` - run the two-filter scoring pipeline once
//!
//! Exits with status 1 when the configuration is invalid, the input cannot be
//! loaded, or the report cannot be written.

use anyhow::{Context, Result};
use clap::Parser;
use dualfilter_config::{load_config, validate_config};
use dualfilter_observability::{init_logging, CrateDebugFlags, LogFormat, LoggingOptions, DEBUG_ENV};
use dualfilter_pipeline::Pipeline;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Two-filter scoring pipeline
#[derive(Parser, Debug)]
#[command(name = "dualfilter", version, about, after_help = dualfilter_observability::debug_flags_help())]
struct Args {
    /// Input records (JSON); overrides `pipeline.input`
    input: Option<PathBuf>,

    /// Path to dualfilter.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report path; overrides `pipeline.output`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Score Stage A backend: auto, cpu or wgpu
    #[arg(long)]
    backend: Option<String>,

    /// Filter 1 acceptance threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Delay before the first record frame is sent
    #[arg(long)]
    settle_delay_ms: Option<u64>,

    /// Stop collecting when no frame arrives for this long
    #[arg(long)]
    collection_timeout_ms: Option<u64>,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(input) = &self.input {
            overrides.insert("pipeline.input".to_string(), input.display().to_string());
        }
        if let Some(output) = &self.output {
            overrides.insert("pipeline.output".to_string(), output.display().to_string());
        }
        if let Some(backend) = &self.backend {
            overrides.insert("compute.backend".to_string(), backend.clone());
        }
        if let Some(threshold) = self.threshold {
            overrides.insert("pipeline.threshold".to_string(), threshold.to_string());
        }
        if let Some(ms) = self.settle_delay_ms {
            overrides.insert("channels.settle_delay_ms".to_string(), ms.to_string());
        }
        if let Some(ms) = self.collection_timeout_ms {
            overrides.insert("channels.collection_timeout_ms".to_string(), ms.to_string());
        }
        overrides
    }
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
    // --debug-* flags are handled by the logging layer, not clap
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

    info!(
        "[PIPELINE] dualfilter v{} input={} output={}",
        env!("CARGO_PKG_VERSION"),
        config.pipeline.input.display(),
        config.pipeline.output.display()
    );

    let outcome = Pipeline::new(config).run()?;
    if let Some(e) = &outcome.report_error {
        eprintln!("Cannot create output: {}", e);
    }
    let stats = outcome.summary.stats;

    info!(
        "[PIPELINE] Done: total={} filter1={} filter2={} both={} -> {}",
        stats.total,
        stats.filter1,
        stats.filter2,
        stats.both,
        outcome.report_path.display()
    );

    Ok(())
}
