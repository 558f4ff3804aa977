// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Shared result table.

One entry per record id, created at load time and never removed. Score Stage A
and the Collection Stage merge into it concurrently; every operation takes the
internal lock for its whole duration and the lock is never handed out.
*/

use crate::record::{Record, ScoreResult};
use ahash::AHashMap;
use parking_lot::Mutex;

/// Outcome of merging one metric B value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First value for this id
    Merged,
    /// The id already had a value; it was overwritten
    Updated,
    /// No such id; the table is unchanged
    UnknownId,
}

/// Aggregate counts for the report header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub filter1: usize,
    pub filter2: usize,
    pub both: usize,
}

/// id → merged result, guarded by a single lock
pub struct ResultTable {
    entries: Mutex<AHashMap<i32, ScoreResult>>,
}

impl ResultTable {
    /// Build the table with one unflagged entry per record
    pub fn from_records(records: &[Record]) -> Self {
        let entries = records
            .iter()
            .map(|record| (record.id, ScoreResult::from(record)))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Record a metric A acceptance; false if the id is unknown
    pub fn merge_metric_a(&self, id: i32, metric_a: f32) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(&id) {
            Some(entry) => {
                entry.metric_a = metric_a;
                entry.has_a = true;
                true
            }
            None => false,
        }
    }

    /// Merge a whole batch of acceptances under one lock acquisition
    ///
    /// Returns how many ids were present in the table.
    pub fn merge_metric_a_batch(&self, accepted: &[(i32, f32)]) -> usize {
        let mut entries = self.entries.lock();
        let mut merged = 0;
        for &(id, metric_a) in accepted {
            if let Some(entry) = entries.get_mut(&id) {
                entry.metric_a = metric_a;
                entry.has_a = true;
                merged += 1;
            }
        }
        merged
    }

    /// Record a metric B value from the worker pool
    pub fn merge_metric_b(&self, id: i32, metric_b: f32) -> MergeOutcome {
        let mut entries = self.entries.lock();
        match entries.get_mut(&id) {
            Some(entry) => {
                let outcome = if entry.has_b {
                    MergeOutcome::Updated
                } else {
                    MergeOutcome::Merged
                };
                entry.metric_b = metric_b;
                entry.has_b = true;
                outcome
            }
            None => MergeOutcome::UnknownId,
        }
    }

    /// Copy of one entry
    pub fn get(&self, id: i32) -> Option<ScoreResult> {
        self.entries.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> FilterStats {
        let entries = self.entries.lock();
        entries.values().fold(
            FilterStats {
                total: entries.len(),
                ..FilterStats::default()
            },
            |mut stats, entry| {
                stats.filter1 += usize::from(entry.has_a);
                stats.filter2 += usize::from(entry.has_b);
                stats.both += usize::from(entry.passed_both());
                stats
            },
        )
    }

    /// All entries ordered by id
    pub fn snapshot(&self) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> = self.entries.lock().values().cloned().collect();
        results.sort_by_key(|result| result.id);
        results
    }

    /// Entries that passed both filters, ordered by id
    pub fn intersection(&self) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> = self
            .entries
            .lock()
            .values()
            .filter(|entry| entry.passed_both())
            .cloned()
            .collect();
        results.sort_by_key(|result| result.id);
        results
    }
}
