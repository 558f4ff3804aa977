/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Compute Backend Abstraction
//!
//! One interface over CPU and GPU execution of the reliability kernel, so
//! Score Stage A does not care where the batch runs.

mod cpu;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use cpu::CPUBackend;
#[cfg(feature = "gpu")]
pub use wgpu_backend::WGPUBackend;

use crate::error::{ComputeError, ComputeResult};
use crate::kernel::{ScoreInput, RELIABILITY_ITERATIONS};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Records that passed the threshold in one batch
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// `(id, score)` in input order
    pub accepted: Vec<(i32, f32)>,
    pub total: usize,
    /// Kernel time including upload and readback
    pub elapsed: Duration,
}

/// Compute backend trait - abstracts CPU vs GPU execution
pub trait ReliabilityBackend: Send + Sync {
    /// Get backend type name for logging/debugging
    fn backend_name(&self) -> &str;

    /// Score every input; the result has the same length and order
    fn compute_scores(&mut self, inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>>;

    /// Score the batch and keep records with `score >= threshold`
    fn filter(&mut self, inputs: &[ScoreInput], threshold: f32) -> ComputeResult<FilterOutcome> {
        let start = Instant::now();
        let scores = self.compute_scores(inputs)?;
        let elapsed = start.elapsed();

        if scores.len() != inputs.len() {
            return Err(ComputeError::Execution(format!(
                "{} returned {} scores for {} inputs",
                self.backend_name(),
                scores.len(),
                inputs.len()
            )));
        }

        let accepted = inputs
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score >= threshold)
            .map(|(input, score)| (input.id, score))
            .collect();

        Ok(FilterOutcome {
            accepted,
            total: inputs.len(),
            elapsed,
        })
    }
}

/// Backend type enum for construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    /// rayon over all cores
    CPU,

    /// GPU via WGPU (Metal/Vulkan/DirectX)
    WGPU,

    /// Auto-select based on batch size and hardware availability
    #[default]
    Auto,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::CPU => write!(f, "CPU"),
            BackendType::WGPU => write!(f, "WGPU"),
            BackendType::Auto => write!(f, "Auto"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = ComputeError;

    fn from_str(s: &str) -> ComputeResult<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(BackendType::CPU),
            "wgpu" | "gpu" => Ok(BackendType::WGPU),
            "auto" => Ok(BackendType::Auto),
            _ => Err(ComputeError::InvalidBackend(s.to_string())),
        }
    }
}

/// Configuration for backend construction and auto-selection
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Kernel loop length per record
    pub iterations: u32,

    /// Minimum batch size to consider the GPU (default: 256, one workgroup)
    pub gpu_record_threshold: usize,

    /// Force CPU even if GPU would be beneficial
    pub force_cpu: bool,

    /// Force GPU even if CPU would be better (for testing)
    pub force_gpu: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            iterations: RELIABILITY_ITERATIONS,
            gpu_record_threshold: 256,
            force_cpu: false,
            force_gpu: false,
        }
    }
}

/// Backend selection decision with rationale
#[derive(Debug, Clone)]
pub struct BackendDecision {
    pub backend_type: BackendType,
    pub reason: String,
    pub estimated_speedup: f32,
}

/// Auto-select a backend for a batch of `record_count` records
pub fn select_backend(record_count: usize, config: &BackendConfig) -> BackendDecision {
    if config.force_cpu {
        return BackendDecision {
            backend_type: BackendType::CPU,
            reason: "Forced CPU via configuration".to_string(),
            estimated_speedup: 1.0,
        };
    }

    if config.force_gpu {
        if is_gpu_available() {
            return BackendDecision {
                backend_type: BackendType::WGPU,
                reason: "Forced GPU via configuration".to_string(),
                estimated_speedup: estimate_gpu_speedup(record_count, config.iterations),
            };
        }
        return BackendDecision {
            backend_type: BackendType::CPU,
            reason: "GPU forced but not available, falling back to CPU".to_string(),
            estimated_speedup: 1.0,
        };
    }

    if record_count >= config.gpu_record_threshold && is_gpu_available() {
        let speedup = estimate_gpu_speedup(record_count, config.iterations);

        // Only use GPU if speedup is meaningful (>1.5x)
        if speedup > 1.5 {
            return BackendDecision {
                backend_type: BackendType::WGPU,
                reason: format!("Large batch ({} records) benefits from GPU", record_count),
                estimated_speedup: speedup,
            };
        }
    }

    BackendDecision {
        backend_type: BackendType::CPU,
        reason: format!(
            "Small batch ({} records, GPU threshold {}) or GPU not available",
            record_count, config.gpu_record_threshold
        ),
        estimated_speedup: 1.0,
    }
}

/// Check if a GPU adapter can be acquired
#[cfg(feature = "gpu")]
pub fn is_gpu_available() -> bool {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .is_some()
}

/// Always false without the `gpu` feature
#[cfg(not(feature = "gpu"))]
pub fn is_gpu_available() -> bool {
    false
}

/// Estimate GPU speedup for one batch
///
/// Every record is independent and the loop is pure ALU work, so the model is
/// lanes in flight versus cores, minus a fixed dispatch and readback cost.
fn estimate_gpu_speedup(record_count: usize, iterations: u32) -> f32 {
    let records = record_count as f32;
    let work = records * iterations as f32;

    let cpu_cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1) as f32;
    let cpu_iters_per_us = 50.0 * cpu_cores;

    // One lane per record, capped by a mid-range GPU's concurrent lanes
    let gpu_lanes = records.min(4096.0);
    let gpu_iters_per_us = 5.0 * gpu_lanes;
    let overhead_us = 2_000.0;

    let cpu_us = work / cpu_iters_per_us;
    let gpu_us = work / gpu_iters_per_us + overhead_us;

    (cpu_us / gpu_us).clamp(0.1, 100.0)
}

/// Create backend based on type
///
/// An explicit `WGPU` request fails with `BackendUnavailable` when no GPU can
/// be used; `Auto` falls back to CPU instead.
pub fn create_backend(
    backend_type: BackendType,
    record_count: usize,
    config: &BackendConfig,
) -> ComputeResult<Box<dyn ReliabilityBackend>> {
    match backend_type {
        BackendType::CPU => {
            info!("[SCORE-A] Using CPU backend (rayon)");
            Ok(Box::new(CPUBackend::new(config.iterations)))
        }
        BackendType::WGPU => {
            let backend = create_gpu_backend(config)?;
            info!("[SCORE-A] Using {} backend", backend.backend_name());
            Ok(backend)
        }
        BackendType::Auto => {
            let decision = select_backend(record_count, config);
            info!(
                "[SCORE-A] Backend auto-selection: {} ({})",
                decision.backend_type, decision.reason
            );
            if decision.estimated_speedup > 1.0 {
                info!("[SCORE-A]    Estimated speedup: {:.1}x", decision.estimated_speedup);
            }
            if decision.backend_type == BackendType::WGPU {
                match create_gpu_backend(config) {
                    Ok(backend) => return Ok(backend),
                    Err(e) => warn!("[SCORE-A] GPU backend failed ({}), falling back to CPU", e),
                }
            }
            Ok(Box::new(CPUBackend::new(config.iterations)))
        }
    }
}

#[cfg(feature = "gpu")]
fn create_gpu_backend(config: &BackendConfig) -> ComputeResult<Box<dyn ReliabilityBackend>> {
    Ok(Box::new(WGPUBackend::new(config.iterations)?))
}

#[cfg(not(feature = "gpu"))]
fn create_gpu_backend(_config: &BackendConfig) -> ComputeResult<Box<dyn ReliabilityBackend>> {
    Err(ComputeError::BackendUnavailable(
        "built without the `gpu` feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScores(Vec<f32>);

    impl ReliabilityBackend for FixedScores {
        fn backend_name(&self) -> &str {
            "fixed"
        }

        fn compute_scores(&mut self, _inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    fn inputs(n: i32) -> Vec<ScoreInput> {
        (1..=n).map(|id| ScoreInput::new(id, 10, 1.0)).collect()
    }

    #[test]
    fn test_filter_threshold_is_inclusive() {
        let mut backend = FixedScores(vec![49.999, 50.0, 50.001]);
        let outcome = backend.filter(&inputs(3), 50.0).unwrap();
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.accepted, vec![(2, 50.0), (3, 50.001)]);
    }

    #[test]
    fn test_filter_rejects_short_score_vector() {
        let mut backend = FixedScores(vec![60.0]);
        assert!(matches!(
            backend.filter(&inputs(2), 50.0),
            Err(ComputeError::Execution(_))
        ));
    }

    #[test]
    fn test_backend_type_parse_and_display() {
        assert_eq!("CPU".parse::<BackendType>().unwrap(), BackendType::CPU);
        assert_eq!("gpu".parse::<BackendType>().unwrap(), BackendType::WGPU);
        assert_eq!("auto".parse::<BackendType>().unwrap(), BackendType::Auto);
        assert!("tpu".parse::<BackendType>().is_err());
        assert_eq!(BackendType::WGPU.to_string(), "WGPU");
        assert_eq!(BackendType::default(), BackendType::Auto);
    }

    #[test]
    fn test_small_batch_selects_cpu() {
        let decision = select_backend(3, &BackendConfig::default());
        assert_eq!(decision.backend_type, BackendType::CPU);
        assert_eq!(decision.estimated_speedup, 1.0);
    }

    #[test]
    fn test_force_cpu_wins() {
        let config = BackendConfig {
            force_cpu: true,
            force_gpu: true,
            ..BackendConfig::default()
        };
        let decision = select_backend(1_000_000, &config);
        assert_eq!(decision.backend_type, BackendType::CPU);
        assert!(decision.reason.contains("Forced CPU"));
    }

    #[test]
    fn test_auto_always_yields_a_backend() {
        let config = BackendConfig {
            iterations: 10,
            ..BackendConfig::default()
        };
        let mut backend = create_backend(BackendType::Auto, 2, &config).unwrap();
        let scores = backend.compute_scores(&inputs(2)).unwrap();
        assert_eq!(scores.len(), 2);
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn test_explicit_gpu_without_feature_is_unavailable() {
        let result = create_backend(BackendType::WGPU, 10, &BackendConfig::default());
        assert!(matches!(result, Err(ComputeError::BackendUnavailable(_))));
    }
}
