// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common types shared by all transports

pub mod config;
pub mod error;

pub use config::{ClientConfig, ServerConfig, TransportConfig};
pub use error::{TransportError, TransportResult};
