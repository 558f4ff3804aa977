/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # CPU Backend
//!
//! Data-parallel map of the scalar kernel over the batch using rayon.

use super::ReliabilityBackend;
use crate::error::ComputeResult;
use crate::kernel::{reliability_score, ScoreInput};
use rayon::prelude::*;

/// CPU backend using all rayon worker threads
pub struct CPUBackend {
    /// Backend name for logging
    name: String,
    iterations: u32,
}

impl CPUBackend {
    /// Create a new CPU backend
    pub fn new(iterations: u32) -> Self {
        Self {
            name: format!("CPU (rayon, {} threads)", rayon::current_num_threads()),
            iterations,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl ReliabilityBackend for CPUBackend {
    fn backend_name(&self) -> &str {
        &self.name
    }

    fn compute_scores(&mut self, inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>> {
        let iterations = self.iterations;
        Ok(inputs
            .par_iter()
            .map(|input| reliability_score(input.uptime, input.load, iterations))
            .collect())
    }
}
