// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dualfilter-transports
//!
//! Transport layer between the scoring pipeline and the worker pool.
//!
//! ## Transports
//!
//! ### ZMQ (ZeroMQ)
//! - **Server**: PULL (binds, receives)
//! - **Client**: PUSH (connects, sends)
//!
//! ### Channel
//! - In-process PUSH/PULL pair on a crossbeam channel, for tests and
//!   single-process runs
//!
//! ## Feature Flags
//!
//! - `zmq-server`: ZMQ PULL
//! - `zmq-client`: ZMQ PUSH
//! - `zmq`: both ZMQ roles
//! - `channel`: in-process transport
//! - `full`: everything
//!
//! ## Example: in-process pair
//!
//! ```
//! # #[cfg(feature = "channel")]
//! # {
//! use dualfilter_transports::channel::channel_pair;
//! use dualfilter_transports::traits::{Pull, Push, Transport};
//!
//! let (mut push, mut pull) = channel_pair(None);
//! push.start().unwrap();
//! pull.start().unwrap();
//!
//! push.push(b"frame").unwrap();
//! assert_eq!(pull.pull().unwrap(), b"frame".to_vec());
//! # }
//! ```
//!
//! Stage code depends only on [`traits::Push`] and [`traits::Pull`], so the
//! transport can be swapped without touching it.

pub mod common;
pub mod traits;

#[cfg(any(feature = "zmq-server", feature = "zmq-client"))]
pub mod zmq;

#[cfg(feature = "channel")]
pub mod channel;

pub use common::{ClientConfig, ServerConfig, TransportConfig, TransportError, TransportResult};

pub use traits::{Pull, Push, Transport};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::traits::*;

    #[cfg(feature = "zmq-server")]
    pub use crate::zmq::server::*;

    #[cfg(feature = "zmq-client")]
    pub use crate::zmq::client::*;

    #[cfg(feature = "channel")]
    pub use crate::channel::*;
}
