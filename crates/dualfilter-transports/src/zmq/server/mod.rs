// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ server-side (bind) sockets

pub mod pull;

pub use pull::ZmqPull;
