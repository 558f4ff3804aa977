// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input records and the per-record merged result

use dualfilter_compute::ScoreInput;
use dualfilter_protocol::RecordFrame;
use serde::{Deserialize, Serialize};

/// One input record, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i32,
    pub location: String,
    pub uptime: i32,
    pub load: f32,
}

impl Record {
    pub fn new(id: i32, location: impl Into<String>, uptime: i32, load: f32) -> Self {
        Self {
            id,
            location: location.into(),
            uptime,
            load,
        }
    }

    /// Kernel view used by Score Stage A
    pub fn score_input(&self) -> ScoreInput {
        ScoreInput::new(self.id, self.uptime, self.load)
    }

    /// Wire view used by the Distribution Stage
    pub fn record_frame(&self) -> RecordFrame {
        RecordFrame::new(self.id, self.load, self.uptime)
    }
}

/// Top-level shape of the input JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFile {
    pub servers: Vec<Record>,
}

/// Merged outcome of both filters for one record
///
/// `has_a` is written only by Score Stage A and `has_b` only by the Collection
/// Stage; both only ever go from false to true.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub id: i32,
    pub location: String,
    pub uptime: i32,
    pub load: f32,
    pub metric_a: f32,
    pub metric_b: f32,
    pub has_a: bool,
    pub has_b: bool,
}

impl ScoreResult {
    pub fn passed_both(&self) -> bool {
        self.has_a && self.has_b
    }
}

impl From<&Record> for ScoreResult {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            location: record.location.clone(),
            uptime: record.uptime,
            load: record.load,
            metric_a: 0.0,
            metric_b: 0.0,
            has_a: false,
            has_b: false,
        }
    }
}
