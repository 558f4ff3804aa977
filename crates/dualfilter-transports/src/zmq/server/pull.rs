// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ PULL pattern (server-side push-pull)
//!
//! PULL sockets bind an endpoint and receive frames from connected PUSH clients.

use crate::common::{ServerConfig, TransportError, TransportResult};
use crate::traits::{Pull, Transport};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// ZMQ PULL socket implementation (receiver)
pub struct ZmqPull {
    context: Arc<zmq::Context>,
    config: ServerConfig,
    socket: Arc<Mutex<Option<zmq::Socket>>>,
    running: Arc<Mutex<bool>>,
}

impl ZmqPull {
    /// Create a new PULL socket
    pub fn new(context: Arc<zmq::Context>, config: ServerConfig) -> TransportResult<Self> {
        config.base.validate()?;

        Ok(Self {
            context,
            config,
            socket: Arc::new(Mutex::new(None)),
            running: Arc::new(Mutex::new(false)),
        })
    }

    /// Create with default context
    pub fn with_address(address: impl Into<String>) -> TransportResult<Self> {
        let context = Arc::new(zmq::Context::new());
        let config = ServerConfig::new(address);
        Self::new(context, config)
    }

    pub fn address(&self) -> &str {
        &self.config.base.address
    }
}

impl Transport for ZmqPull {
    fn start(&mut self) -> TransportResult<()> {
        if *self.running.lock() {
            return Err(TransportError::AlreadyRunning);
        }

        let socket = self.context.socket(zmq::PULL)?;

        socket.set_linger(0)?;
        socket.set_rcvhwm(self.config.base.recv_hwm as i32)?;
        if let Some(max_size) = self.config.base.max_message_size {
            socket.set_maxmsgsize(max_size as i64)?;
        }

        socket.bind(&self.config.base.address).map_err(|e| {
            TransportError::BindFailed(format!("{}: {}", self.config.base.address, e))
        })?;

        *self.socket.lock() = Some(socket);
        *self.running.lock() = true;

        info!("[ZMQ-PULL] Listening on {}", self.config.base.address);

        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        *self.running.lock() = false;
        *self.socket.lock() = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        *self.running.lock()
    }

    fn transport_type(&self) -> &str {
        "zmq-pull"
    }
}

impl Pull for ZmqPull {
    fn pull(&self) -> TransportResult<Vec<u8>> {
        self.pull_timeout(0)
    }

    fn pull_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;

        if timeout_ms > 0 {
            let poll_items = &mut [sock.as_poll_item(zmq::POLLIN)];
            zmq::poll(poll_items, timeout_ms.min(i64::MAX as u64) as i64)?;

            if !poll_items[0].is_readable() {
                return Err(TransportError::Timeout);
            }
        }

        let mut msg = zmq::Message::new();
        sock.recv(&mut msg, 0)
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))?;

        Ok(msg.to_vec())
    }
}
