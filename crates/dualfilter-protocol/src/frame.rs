// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Record and result frames
//!
//! All fields are little-endian at fixed offsets. Layouts never depend on
//! native struct packing.

use crate::error::{FrameError, FrameResult};

/// Size of an outbound record frame: id(4) + load(4) + uptime(4)
pub const RECORD_FRAME_LEN: usize = 12;

/// Size of an inbound result frame: id(4) + metric(4)
pub const RESULT_FRAME_LEN: usize = 8;

/// End-of-stream marker byte
pub const SENTINEL: u8 = 0xFF;

/// End-of-stream frame, sent as exactly one byte
pub const SENTINEL_FRAME: [u8; 1] = [SENTINEL];

const ID_OFFSET: usize = 0;
const RECORD_LOAD_OFFSET: usize = 4;
const RECORD_UPTIME_OFFSET: usize = 8;
const RESULT_METRIC_OFFSET: usize = 4;

/// True for the one-byte `0xFF` frame
pub fn is_sentinel(bytes: &[u8]) -> bool {
    bytes == SENTINEL_FRAME
}

fn word(bytes: &[u8], offset: usize) -> [u8; 4] {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    buf
}

fn check_len(bytes: &[u8], expected: usize) -> FrameResult<()> {
    if bytes.len() != expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Record sent to the worker pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordFrame {
    pub id: i32,
    pub load: f32,
    pub uptime: i32,
}

impl RecordFrame {
    pub fn new(id: i32, load: f32, uptime: i32) -> Self {
        Self { id, load, uptime }
    }

    pub fn encode(&self) -> [u8; RECORD_FRAME_LEN] {
        let mut bytes = [0u8; RECORD_FRAME_LEN];
        bytes[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&self.id.to_le_bytes());
        bytes[RECORD_LOAD_OFFSET..RECORD_LOAD_OFFSET + 4].copy_from_slice(&self.load.to_le_bytes());
        bytes[RECORD_UPTIME_OFFSET..RECORD_UPTIME_OFFSET + 4]
            .copy_from_slice(&self.uptime.to_le_bytes());
        bytes
    }

    /// Decode a record frame; any length other than 12 is rejected
    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        check_len(bytes, RECORD_FRAME_LEN)?;
        Ok(Self {
            id: i32::from_le_bytes(word(bytes, ID_OFFSET)),
            load: f32::from_le_bytes(word(bytes, RECORD_LOAD_OFFSET)),
            uptime: i32::from_le_bytes(word(bytes, RECORD_UPTIME_OFFSET)),
        })
    }
}

/// Metric returned by the worker pool for one accepted record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultFrame {
    pub id: i32,
    pub metric_b: f32,
}

impl ResultFrame {
    pub fn new(id: i32, metric_b: f32) -> Self {
        Self { id, metric_b }
    }

    pub fn encode(&self) -> [u8; RESULT_FRAME_LEN] {
        let mut bytes = [0u8; RESULT_FRAME_LEN];
        bytes[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&self.id.to_le_bytes());
        bytes[RESULT_METRIC_OFFSET..RESULT_METRIC_OFFSET + 4]
            .copy_from_slice(&self.metric_b.to_le_bytes());
        bytes
    }

    /// Decode a result frame; any length other than 8 is rejected
    pub fn decode(bytes: &[u8]) -> FrameResult<Self> {
        check_len(bytes, RESULT_FRAME_LEN)?;
        Ok(Self {
            id: i32::from_le_bytes(word(bytes, ID_OFFSET)),
            metric_b: f32::from_le_bytes(word(bytes, RESULT_METRIC_OFFSET)),
        })
    }
}

/// A frame as seen by the collection side
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboundFrame {
    Result(ResultFrame),
    Sentinel,
    /// Wrong size; carries the observed length
    Malformed(usize),
}

impl InboundFrame {
    pub fn classify(bytes: &[u8]) -> Self {
        if is_sentinel(bytes) {
            return InboundFrame::Sentinel;
        }
        match ResultFrame::decode(bytes) {
            Ok(frame) => InboundFrame::Result(frame),
            Err(_) => InboundFrame::Malformed(bytes.len()),
        }
    }
}

/// A frame as seen by the worker pool's receiver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutboundFrame {
    Record(RecordFrame),
    Sentinel,
    Malformed(usize),
}

impl OutboundFrame {
    pub fn classify(bytes: &[u8]) -> Self {
        if is_sentinel(bytes) {
            return OutboundFrame::Sentinel;
        }
        match RecordFrame::decode(bytes) {
            Ok(frame) => OutboundFrame::Record(frame),
            Err(_) => OutboundFrame::Malformed(bytes.len()),
        }
    }
}
