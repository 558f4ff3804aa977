// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ transport implementations
//!
//! **Push-Pull**: PULL (server, binds) ↔ PUSH (client, connects)
//!
//! ## Feature Flags
//!
//! - `zmq-server`: PULL
//! - `zmq-client`: PUSH
//! - `zmq`: both
//!
//! ## Example
//!
//! ```no_run
//! use dualfilter_transports::zmq::{ZmqPull, ZmqPush};
//! use dualfilter_transports::traits::{Pull, Push, Transport};
//!
//! let mut pull = ZmqPull::with_address("tcp://127.0.0.1:5558")?;
//! pull.start()?;
//!
//! let mut push = ZmqPush::with_address("tcp://127.0.0.1:5558")?;
//! push.start()?;
//! push.push(&[0xFF])?;
//!
//! let frame = pull.pull_timeout(1000)?;
//! assert_eq!(frame, vec![0xFF]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "zmq-server")]
pub mod server;

#[cfg(feature = "zmq-client")]
pub mod client;

#[cfg(feature = "zmq-server")]
pub use server::ZmqPull;

#[cfg(feature = "zmq-client")]
pub use client::ZmqPush;
