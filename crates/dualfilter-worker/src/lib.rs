// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dualfilter-worker
//!
//! The external worker pool behind the pipeline's distribution and collection
//! channels. It scores every record on the stability metric (filter 2) and
//! streams back the ones that pass, followed by the end-of-stream sentinel.
//!
//! ```rust,no_run
//! use dualfilter_worker::{WorkerPool, WorkerPoolConfig};
//!
//! let pool = WorkerPool::new(WorkerPoolConfig {
//!     workers: 4,
//!     ..WorkerPoolConfig::default()
//! })?;
//! let report = pool.run()?;
//! println!("{}/{} passed", report.accepted, report.received);
//! # Ok::<(), dualfilter_worker::WorkerError>(())
//! ```

pub mod error;
pub mod pool;

pub use error::{WorkerError, WorkerResult};
pub use pool::{WorkerPool, WorkerPoolConfig, WorkerPoolReport};

/// Number of cores as seen by the process, at least 1
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
