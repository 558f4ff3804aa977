// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use dualfilter_transports::TransportError;
use thiserror::Error;

/// Worker pool errors
///
/// Only setup failures are errors. Problems once the pool is running are
/// logged and end up in the [`crate::WorkerPoolReport`].
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to spawn {thread}: {source}")]
    Spawn {
        thread: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid worker configuration: {0}")]
    InvalidConfig(String),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
