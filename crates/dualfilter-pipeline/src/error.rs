// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline error types
//!
//! Only load, configuration and report failures surface as errors. Stage
//! failures are caught inside the stage and recorded on its report.

use dualfilter_config::ConfigError;
use dualfilter_transports::TransportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record #{index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Duplicate record id {0}")]
    DuplicateId(i32),

    #[error("Input contains no records")]
    Empty,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
