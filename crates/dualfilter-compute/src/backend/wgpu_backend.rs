/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # WGPU Backend
//!
//! GPU-accelerated backend using WGPU (cross-platform GPU compute library).
//! Supports Metal (macOS), Vulkan (Linux), DirectX 12 (Windows).
//!
//! Per batch: upload inputs, dispatch one 256-wide workgroup per 256 records,
//! copy scores into a staging buffer and map it back.

use super::ReliabilityBackend;
use crate::error::{ComputeError, ComputeResult};
use crate::kernel::ScoreInput;
use tracing::debug;
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 256;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    count: u32,
    iterations: u32,
    _pad0: u32,
    _pad1: u32,
}

/// WGPU backend for GPU acceleration
pub struct WGPUBackend {
    /// Backend name for logging
    name: String,

    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,

    iterations: u32,
}

impl WGPUBackend {
    /// Acquire a GPU and build the reliability pipeline
    ///
    /// # Errors
    ///
    /// `BackendUnavailable` when no adapter or device can be acquired,
    /// `KernelBuild` when the shader or pipeline fails validation
    pub fn new(iterations: u32) -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| ComputeError::BackendUnavailable("Failed to find WGPU adapter".to_string()))?;

        let adapter_info = adapter.get_info();
        let name = format!("WGPU ({} - {:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("dualfilter reliability device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|e| ComputeError::BackendUnavailable(format!("Failed to create device: {}", e)))?;

        let (pipeline, bind_group_layout) = Self::build_pipeline(&device)?;

        Ok(Self {
            name,
            device,
            queue,
            pipeline,
            bind_group_layout,
            iterations,
        })
    }

    fn build_pipeline(
        device: &wgpu::Device,
    ) -> ComputeResult<(wgpu::ComputePipeline, wgpu::BindGroupLayout)> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Reliability Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/reliability.wgsl").into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Reliability Bind Group Layout"),
            entries: &[
                // Inputs (read-only)
                storage(0, true),
                // Scores (write)
                storage(1, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Reliability Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Reliability Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "reliability_main",
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ComputeError::KernelBuild(error.to_string()));
        }

        Ok((pipeline, bind_group_layout))
    }

    fn read_back(&self, staging: &wgpu::Buffer) -> ComputeResult<Vec<f32>> {
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::Execution("Readback callback dropped".to_string()))?
            .map_err(|e| ComputeError::Execution(format!("Failed to map staging buffer: {}", e)))?;

        let scores = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&data).to_vec()
        };
        staging.unmap();

        Ok(scores)
    }
}

impl ReliabilityBackend for WGPUBackend {
    fn backend_name(&self) -> &str {
        &self.name
    }

    fn compute_scores(&mut self, inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let count = u32::try_from(inputs.len())
            .map_err(|_| ComputeError::Execution(format!("Batch too large: {}", inputs.len())))?;
        let output_size = (inputs.len() * std::mem::size_of::<f32>()) as u64;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let input_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Score Inputs"),
            contents: bytemuck::cast_slice(inputs),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let params = Params {
            count,
            iterations: self.iterations,
            _pad0: 0,
            _pad1: 0,
        };
        let params_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Reliability Params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Reliability Scores"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Reliability Staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Reliability Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let workgroup_count = count.div_ceil(WORKGROUP_SIZE);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Reliability Encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Reliability Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        self.queue.submit(Some(encoder.finish()));

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::Execution(error.to_string()));
        }

        debug!(
            "[SCORE-A] Dispatched {} workgroups for {} records",
            workgroup_count, count
        );

        self.read_back(&staging_buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::reliability_score;

    #[test]
    fn test_wgpu_backend_matches_cpu_when_available() {
        // This test requires a GPU - may not work in CI
        let Ok(mut backend) = WGPUBackend::new(64) else {
            return;
        };
        assert!(backend.backend_name().contains("WGPU"));

        let inputs: Vec<ScoreInput> = (0..300)
            .map(|i| ScoreInput::new(i, i * 7, (i % 30) as f32 * 0.1))
            .collect();
        let scores = backend.compute_scores(&inputs).unwrap();

        assert_eq!(scores.len(), inputs.len());
        for (input, score) in inputs.iter().zip(&scores) {
            let expected = reliability_score(input.uptime, input.load, 64);
            // GPU transcendentals are not bit-exact
            assert!((score - expected).abs() < 1.0, "{} vs {}", score, expected);
        }
    }
}
