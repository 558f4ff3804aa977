// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dualfilter-observability
//!
//! Logging setup shared by the pipeline and worker binaries, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: JSON run logs under a timestamped folder with retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known dualfilter crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "dualfilter",
    "dualfilter-config",
    "dualfilter-compute",
    "dualfilter-observability",
    "dualfilter-pipeline",
    "dualfilter-protocol",
    "dualfilter-transports",
    "dualfilter-worker",
];
