// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dualfilter-pipeline
//!
//! Two-filter scoring pipeline. Three stages run concurrently over one shared
//! [`ResultTable`]:
//!
//! - **Score Stage A**: local reliability kernel, accepts `score >= threshold`
//! - **Distribution**: pushes 12-byte record frames, then the `0xFF` sentinel
//! - **Collection**: pulls 8-byte result frames from the worker pool until the
//!   sentinel
//!
//! The orchestrator joins all three and renders the text report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dualfilter_config::load_config;
//! use dualfilter_pipeline::Pipeline;
//!
//! let config = load_config(None, None)?;
//! let outcome = Pipeline::new(config).run()?;
//! println!("both filters: {}", outcome.summary.stats.both);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod result_table;
pub mod source;
pub mod stages;

pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{run_stages, Pipeline, PipelineOutcome, RunSummary, StageSet};
pub use record::{Record, RecordFile, ScoreResult};
pub use report::{render_report, write_report};
pub use result_table::{FilterStats, MergeOutcome, ResultTable};
pub use source::{load_records, parse_records};
pub use stages::{
    CollectionReport, CollectionStage, DistributionReport, DistributionStage, ScoreStageA,
    StageAReport,
};
