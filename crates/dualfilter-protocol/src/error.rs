// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Frame decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

pub type FrameResult<T> = Result<T, FrameError>;
