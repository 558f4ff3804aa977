/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # dualfilter-compute
//!
//! Scoring kernels plus the data-parallel backends that run the reliability
//! metric over a batch of records.
//!
//! ## Features
//! - `gpu`: WGPU backend (Metal, Vulkan, DirectX 12)

pub mod backend;
pub mod error;
pub mod kernel;

pub use backend::{
    create_backend, is_gpu_available, select_backend, BackendConfig, BackendDecision,
    BackendType, CPUBackend, FilterOutcome, ReliabilityBackend,
};
#[cfg(feature = "gpu")]
pub use backend::WGPUBackend;
pub use error::{ComputeError, ComputeResult};
pub use kernel::{
    reliability_score, stability_score, ScoreInput, RELIABILITY_ITERATIONS, STABILITY_ITERATIONS,
};
