//! # dualfilter - two-stage scoring pipeline
//!
//! A local compute stage scores a batch of records and keeps those passing a
//! threshold (filter 1). An external worker pool scores the same batch on a
//! different metric and streams results back over ZMQ (filter 2). The report
//! intersects the two.
//!
//! ## Feature Flags
//!
//! - **`gpu`**: WGPU backend for Score Stage A
//! - **`file-logging`**: JSON run logs under `logs/run_YYYYmmdd_HHMMSS/`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dualfilter::prelude::*;
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let outcome = Pipeline::new(config).run()?;
//! println!(
//!     "total={} filter1={} filter2={} both={}",
//!     outcome.summary.stats.total,
//!     outcome.summary.stats.filter1,
//!     outcome.summary.stats.filter2,
//!     outcome.summary.stats.both
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: dualfilter-config, dualfilter-observability│
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  I/O: dualfilter-transports, dualfilter-protocol        │
//! │  (ZMQ PUSH/PULL, 12/8/1-byte frames)                    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Compute: dualfilter-compute                            │
//! │  (reliability + stability kernels, CPU/GPU backends)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Applications: dualfilter-pipeline, dualfilter-worker   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use dualfilter_compute as compute;
pub use dualfilter_config as config;
pub use dualfilter_observability as observability;
pub use dualfilter_pipeline as pipeline;
pub use dualfilter_protocol as protocol;
pub use dualfilter_transports as transports;
pub use dualfilter_worker as worker;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::compute::{BackendConfig, BackendType, ReliabilityBackend, ScoreInput};
    pub use crate::config::{load_config, validate_config, DualfilterConfig};
    pub use crate::pipeline::{
        Pipeline, PipelineError, PipelineOutcome, Record, ResultTable, RunSummary, ScoreResult,
    };
    pub use crate::protocol::{InboundFrame, OutboundFrame, RecordFrame, ResultFrame};
    pub use crate::transports::{Pull, Push, Transport};
    pub use crate::worker::{WorkerPool, WorkerPoolConfig, WorkerPoolReport};
}
