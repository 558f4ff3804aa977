// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions
//!
//! Stages are generic over these traits so the same code drives ZMQ sockets in
//! production and in-process channels in tests.

use crate::common::TransportResult;

/// Base transport trait - implemented by all transports
pub trait Transport: Send + Sync {
    /// Bind or connect the underlying endpoint
    fn start(&mut self) -> TransportResult<()>;

    /// Release the underlying endpoint
    fn stop(&mut self) -> TransportResult<()>;

    fn is_running(&self) -> bool;

    /// Get transport name/type
    fn transport_type(&self) -> &str;
}

/// Push-Pull pattern (Push side)
///
/// Fire-and-forget delivery of whole frames to a single PULL peer.
pub trait Push: Transport {
    /// Push a frame, blocking while the send queue is full
    fn push(&self, data: &[u8]) -> TransportResult<()>;

    /// Push with timeout (0 = blocking)
    fn push_timeout(&self, data: &[u8], timeout_ms: u64) -> TransportResult<()>;
}

/// Push-Pull pattern (Pull side)
pub trait Pull: Transport {
    /// Pull the next frame, blocking until one arrives
    fn pull(&self) -> TransportResult<Vec<u8>>;

    /// Pull with timeout (0 = blocking); `TransportError::Timeout` when nothing arrives
    fn pull_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>>;
}
