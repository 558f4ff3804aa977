// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common error types for all transports

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport-agnostic error type
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Bind failed: {0}")]
    BindFailed(String),

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Operation timed out")]
    Timeout,

    /// Peer side of an in-process channel is gone
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Transport is not running")]
    NotRunning,

    #[error("Transport is already running")]
    AlreadyRunning,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Message too large: {size} bytes (max: {max_size})")]
    MessageTooLarge { size: usize, max_size: usize },

    #[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
    #[error("ZMQ error: {0}")]
    Zmq(zmq::Error),

    #[error("Error: {0}")]
    Other(String),
}

#[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
impl From<zmq::Error> for TransportError {
    fn from(err: zmq::Error) -> Self {
        match err {
            zmq::Error::EAGAIN => Self::Timeout,
            _ => Self::Zmq(err),
        }
    }
}

impl From<String> for TransportError {
    fn from(msg: String) -> Self {
        Self::InvalidConfig(msg)
    }
}
