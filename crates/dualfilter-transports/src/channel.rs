// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-process PUSH/PULL pair backed by a crossbeam channel
//!
//! Frames keep their exact bytes and order, like a single ZMQ PUSH→PULL link,
//! without touching the network.

use crate::common::{TransportError, TransportResult};
use crate::traits::{Pull, Push, Transport};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use std::time::Duration;

/// Sending half of [`channel_pair`]
pub struct ChannelPush {
    sender: Sender<Vec<u8>>,
    running: bool,
}

/// Receiving half of [`channel_pair`]
pub struct ChannelPull {
    receiver: Receiver<Vec<u8>>,
    running: bool,
}

/// Create a connected push/pull pair
///
/// `capacity` bounds the queue like a high water mark; `None` is unbounded.
pub fn channel_pair(capacity: Option<usize>) -> (ChannelPush, ChannelPull) {
    let (sender, receiver) = match capacity {
        Some(cap) => channel::bounded(cap),
        None => channel::unbounded(),
    };
    (
        ChannelPush {
            sender,
            running: false,
        },
        ChannelPull {
            receiver,
            running: false,
        },
    )
}

impl Transport for ChannelPush {
    fn start(&mut self) -> TransportResult<()> {
        if self.running {
            return Err(TransportError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn transport_type(&self) -> &str {
        "channel-push"
    }
}

impl Push for ChannelPush {
    fn push(&self, data: &[u8]) -> TransportResult<()> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        self.sender
            .send(data.to_vec())
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn push_timeout(&self, data: &[u8], timeout_ms: u64) -> TransportResult<()> {
        if timeout_ms == 0 {
            return self.push(data);
        }
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        self.sender
            .send_timeout(data.to_vec(), Duration::from_millis(timeout_ms))
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => TransportError::Timeout,
                SendTimeoutError::Disconnected(_) => TransportError::ConnectionClosed,
            })
    }
}

impl Transport for ChannelPull {
    fn start(&mut self) -> TransportResult<()> {
        if self.running {
            return Err(TransportError::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn transport_type(&self) -> &str {
        "channel-pull"
    }
}

impl Pull for ChannelPull {
    fn pull(&self) -> TransportResult<Vec<u8>> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        self.receiver
            .recv()
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn pull_timeout(&self, timeout_ms: u64) -> TransportResult<Vec<u8>> {
        if timeout_ms == 0 {
            return self.pull();
        }
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        self.receiver
            .recv_timeout(Duration::from_millis(timeout_ms))
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => TransportError::Timeout,
                RecvTimeoutError::Disconnected => TransportError::ConnectionClosed,
            })
    }
}
