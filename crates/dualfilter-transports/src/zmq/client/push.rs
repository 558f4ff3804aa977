// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ PUSH pattern (client-side push-pull)
//!
//! PUSH sockets connect to a PULL server and stream frames to it.

use crate::common::{ClientConfig, TransportError, TransportResult};
use crate::traits::{Push, Transport};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// ZMQ PUSH socket implementation (sender)
pub struct ZmqPush {
    context: Arc<zmq::Context>,
    config: ClientConfig,
    socket: Arc<Mutex<Option<zmq::Socket>>>,
    running: Arc<Mutex<bool>>,
}

impl ZmqPush {
    /// Create a new PUSH socket
    pub fn new(context: Arc<zmq::Context>, config: ClientConfig) -> TransportResult<Self> {
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
        let config = ClientConfig::new(address);
        Self::new(context, config)
    }

    pub fn address(&self) -> &str {
        &self.config.base.address
    }

    fn connect_with_retries(&self, socket: &zmq::Socket) -> TransportResult<()> {
        let address = &self.config.base.address;
        let mut attempt = 0;
        loop {
            match socket.connect(address) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.connect_retries => {
                    attempt += 1;
                    warn!(
                        "[ZMQ-PUSH] Connect to {} failed ({}), retry {}/{}",
                        address, e, attempt, self.config.connect_retries
                    );
                    thread::sleep(self.config.retry_delay);
                }
                Err(e) => return Err(TransportError::ConnectFailed(format!("{}: {}", address, e))),
            }
        }
    }
}

impl Transport for ZmqPush {
    fn start(&mut self) -> TransportResult<()> {
        if *self.running.lock() {
            return Err(TransportError::AlreadyRunning);
        }

        let socket = self.context.socket(zmq::PUSH)?;

        // Queued frames (the sentinel in particular) must survive an early close
        socket.set_linger(self.config.base.linger_ms())?;
        socket.set_sndhwm(self.config.base.send_hwm as i32)?;
        socket.set_immediate(false)?;

        self.connect_with_retries(&socket)?;

        *self.socket.lock() = Some(socket);
        *self.running.lock() = true;

        info!("[ZMQ-PUSH] Connected to {}", self.config.base.address);

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
        "zmq-push"
    }
}

impl Push for ZmqPush {
    fn push(&self, data: &[u8]) -> TransportResult<()> {
        self.push_timeout(data, 0)
    }

    fn push_timeout(&self, data: &[u8], timeout_ms: u64) -> TransportResult<()> {
        let sock_guard = self.socket.lock();
        let sock = sock_guard.as_ref().ok_or(TransportError::NotRunning)?;

        if let Some(max_size) = self.config.base.max_message_size {
            if data.len() > max_size {
                return Err(TransportError::MessageTooLarge {
                    size: data.len(),
                    max_size,
                });
            }
        }

        let sndtimeo = if timeout_ms > 0 {
            timeout_ms.min(i32::MAX as u64) as i32
        } else {
            -1
        };
        sock.set_sndtimeo(sndtimeo)?;

        sock.send(data, 0).map_err(|e| match e {
            zmq::Error::EAGAIN => TransportError::Timeout,
            other => TransportError::SendFailed(other.to_string()),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_creation() {
        let context = Arc::new(zmq::Context::new());
        let config = ClientConfig::new("tcp://127.0.0.1:31020");
        let push = ZmqPush::new(context, config);
        assert!(push.is_ok());
    }

    #[test]
    fn test_push_start_stop() {
        let mut push = ZmqPush::with_address("tcp://127.0.0.1:31021").unwrap();
        assert!(!push.is_running());

        push.start().unwrap();
        assert!(push.is_running());
        assert!(matches!(push.start(), Err(TransportError::AlreadyRunning)));

        push.stop().unwrap();
        assert!(!push.is_running());
    }

    #[test]
    fn test_push_before_start_is_not_running() {
        let push = ZmqPush::with_address("tcp://127.0.0.1:31022").unwrap();
        assert!(matches!(push.push(&[0xFF]), Err(TransportError::NotRunning)));
    }

    #[test]
    fn test_malformed_address_fails_after_retries() {
        let context = Arc::new(zmq::Context::new());
        let config = ClientConfig::new("not-an-endpoint")
            .with_retries(2, std::time::Duration::from_millis(1));
        let mut push = ZmqPush::new(context, config).unwrap();
        assert!(matches!(push.start(), Err(TransportError::ConnectFailed(_))));
        assert!(!push.is_running());
    }
}
