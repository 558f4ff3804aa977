// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ client-side (connect) sockets

pub mod push;

pub use push::ZmqPush;
