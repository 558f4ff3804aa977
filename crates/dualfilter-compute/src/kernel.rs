/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Scoring Kernels
//!
//! Scalar reference versions of both metrics. The CPU backend maps
//! [`reliability_score`] over a batch; the WGSL shader mirrors it line for line.

/// Default iteration count for the reliability metric
pub const RELIABILITY_ITERATIONS: u32 = 4_000_000;

/// Default iteration count for the stability metric
pub const STABILITY_ITERATIONS: u32 = 600_000;

/// One record as the reliability kernel sees it
///
/// `#[repr(C)]` with three 4-byte fields so the GPU backend can upload a slice
/// of these directly (12-byte stride).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct ScoreInput {
    pub id: i32,
    pub uptime: i32,
    pub load: f32,
}

impl ScoreInput {
    pub fn new(id: i32, uptime: i32, load: f32) -> Self {
        Self { id, uptime, load }
    }
}

/// Reliability metric (metric A), in `[0, 100]`
///
/// ```text
/// r = 0.5
/// for i in 0..N: r = |sin(r + sin(uptime/1000 * i) - cos(load * i))|
/// score = r * 100
/// ```
pub fn reliability_score(uptime: i32, load: f32, iterations: u32) -> f32 {
    let uptime_scale = uptime as f32 / 1000.0;
    let mut reliability = 0.5f32;

    for i in 0..iterations {
        let step = i as f32;
        let factor1 = (uptime_scale * step).sin();
        let factor2 = (load * step).cos();
        reliability = (reliability + factor1 - factor2).sin().abs();
    }

    reliability * 100.0
}

/// Stability metric (metric B, computed by the worker pool), in `[0, 100]`
///
/// Seeded per record from `id mod 10`; accumulates in f64.
pub fn stability_score(id: i32, uptime: i32, load: f32, iterations: u32) -> f64 {
    let load_factor = load as f64 * 0.001;
    let uptime_factor = uptime as f64 / 10_000.0;
    let mut stability = 0.5 + id.rem_euclid(10) as f64 * 0.01;

    for i in 0..iterations {
        let step = i as f64;
        let factor1 = (load_factor * step).cos();
        let factor2 = (uptime_factor * step).sin();
        let factor3 = if stability.abs() < 100.0 {
            (stability * 0.01).tan()
        } else {
            0.0
        };
        stability = (stability + factor1 * factor2 - factor3 * 0.001).sin().abs();
    }

    stability * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliability_zero_iterations_is_seed() {
        assert_eq!(reliability_score(10, 40.0, 0), 50.0);
    }

    #[test]
    fn test_reliability_single_iteration() {
        // i = 0: sin(0) = 0, cos(0) = 1, r = |sin(0.5 - 1)|
        let expected = (0.5f32 - 1.0).sin().abs() * 100.0;
        assert!((reliability_score(10, 40.0, 1) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_reliability_stays_in_range() {
        for (uptime, load) in [(0, 0.0), (10, 40.0), (5, 90.0), (99_999, 0.01), (1, -3.5)] {
            let score = reliability_score(uptime, load, 500);
            assert!((0.0..=100.0).contains(&score), "{} out of range", score);
        }
    }

    #[test]
    fn test_stability_seed_depends_on_id() {
        assert!((stability_score(1, 10, 40.0, 0) - 51.0).abs() < 1e-9);
        assert!((stability_score(13, 10, 40.0, 0) - 53.0).abs() < 1e-9);
        // Negative ids wrap like a floored modulo
        assert!((stability_score(-1, 10, 40.0, 0) - 59.0).abs() < 1e-9);
    }

    #[test]
    fn test_stability_single_iteration() {
        let seed = 0.51f64;
        let expected = (seed + 1.0 * 0.0 - (seed * 0.01).tan() * 0.001).sin().abs() * 100.0;
        assert!((stability_score(1, 10, 40.0, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_stability_is_deterministic() {
        let a = stability_score(7, 1234, 55.5, 2_000);
        let b = stability_score(7, 1234, 55.5, 2_000);
        assert_eq!(a.to_bits(), b.to_bits());
        assert!((0.0..=100.0).contains(&a));
    }
}
