/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Invalid backend: {0}")]
    InvalidBackend(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Shader or pipeline failed validation
    #[error("Kernel build failed: {0}")]
    KernelBuild(String),

    #[error("Kernel execution failed: {0}")]
    Execution(String),
}

pub type ComputeResult<T> = std::result::Result<T, ComputeError>;
