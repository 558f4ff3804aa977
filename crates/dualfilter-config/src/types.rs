// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to one section of `dualfilter.toml`. Missing sections and
//! keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DualfilterConfig {
    pub pipeline: PipelineConfig,
    pub channels: ChannelsConfig,
    pub compute: ComputeConfig,
    pub workers: WorkersConfig,
    pub logging: LoggingConfig,
}

/// Input/output locations and the filter 1 threshold
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Score Stage A accepts records whose reliability is `>= threshold`
    pub threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/servers.json"),
            output: PathBuf::from("results/output.txt"),
            threshold: 50.0,
        }
    }
}

/// Worker channel endpoints and socket tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Outbound record frames (pipeline connects PUSH, worker pool binds PULL)
    pub distribution_endpoint: String,
    /// Inbound result frames (pipeline binds PULL, worker pool connects PUSH)
    pub collection_endpoint: String,
    /// Delay before the first record frame is sent
    pub settle_delay_ms: u64,
    /// Upper bound on how long collection waits for the next frame.
    /// Unset means block until the sentinel arrives.
    pub collection_timeout_ms: Option<u64>,
    pub linger_ms: u64,
    pub send_hwm: usize,
    pub recv_hwm: usize,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            distribution_endpoint: "tcp://127.0.0.1:5557".to_string(),
            collection_endpoint: "tcp://127.0.0.1:5558".to_string(),
            settle_delay_ms: 500,
            collection_timeout_ms: None,
            linger_ms: 1000,
            send_hwm: 1000,
            recv_hwm: 1000,
        }
    }
}

impl ChannelsConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn collection_timeout(&self) -> Option<Duration> {
        self.collection_timeout_ms.map(Duration::from_millis)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }
}

/// Score Stage A compute backend
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// `auto`, `cpu` or `wgpu`
    pub backend: String,
    pub reliability_iterations: u32,
    /// Auto-selection only considers the GPU for batches at least this large
    pub gpu_record_threshold: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            reliability_iterations: 4_000_000,
            gpu_record_threshold: 256,
        }
    }
}

/// Worker pool (filter 2)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// 0 = derive from available cores
    pub count: usize,
    pub half_cpu: bool,
    pub stability_iterations: u32,
    pub stability_threshold: f64,
    pub connect_retries: u32,
    pub connect_retry_delay_ms: u64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            count: 0,
            half_cpu: false,
            stability_iterations: 600_000,
            stability_threshold: 50.0,
            connect_retries: 30,
            connect_retry_delay_ms: 1000,
        }
    }
}

impl WorkersConfig {
    /// Resolve the number of worker threads for a machine with `available_cores`
    pub fn resolved_count(&self, available_cores: usize) -> usize {
        if self.count > 0 {
            return self.count;
        }
        let cores = available_cores.max(1);
        if self.half_cpu {
            (cores / 2).max(1)
        } else {
            cores.saturating_sub(1).max(1)
        }
    }
}

/// Logging output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            format: "text".to_string(),
        }
    }
}
