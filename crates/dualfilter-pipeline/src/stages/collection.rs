// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collection Stage
//!
//! Binds the inbound PULL channel and merges 8-byte result frames into the
//! table until the 1-byte `0xFF` sentinel arrives. Unknown ids and frames of
//! any other length are counted and dropped; neither breaks the loop.

use crate::result_table::{MergeOutcome, ResultTable};
use dualfilter_protocol::InboundFrame;
use dualfilter_transports::{Pull, TransportError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    /// Result frames whose id was in the table (first value per id)
    pub merged: usize,
    /// Result frames for an id that already had a value
    pub duplicates: usize,
    pub unknown_ids: usize,
    pub malformed: usize,
    pub sentinel_received: bool,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl CollectionReport {
    /// Every well-formed result frame, including unknown ids
    pub fn result_frames(&self) -> usize {
        self.merged + self.duplicates + self.unknown_ids
    }
}

#[derive(Default)]
pub struct CollectionStage {
    /// Give up when no frame arrives within this window; `None` waits for the sentinel
    timeout: Option<Duration>,
}

impl CollectionStage {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Start `pull`, drain it until the sentinel, then stop it
    pub fn run<Q: Pull>(&self, pull: &mut Q, table: &ResultTable) -> CollectionReport {
        let mut report = CollectionReport::default();

        if let Err(e) = pull.start() {
            error!("[COLLECTION] Failed to open {}: {}", pull.transport_type(), e);
            report.error = Some(e.to_string());
            return report;
        }

        let timeout_ms = pull_timeout_ms(self.timeout);

        loop {
            let bytes = match pull.pull_timeout(timeout_ms) {
                Ok(bytes) => bytes,
                Err(TransportError::Timeout) => {
                    warn!(
                        "[COLLECTION] No frame within {:?}, stopping without sentinel",
                        self.timeout.unwrap_or_default()
                    );
                    report.timed_out = true;
                    break;
                }
                Err(e) => {
                    error!("[COLLECTION] Receive failed: {}", e);
                    report.error = Some(e.to_string());
                    break;
                }
            };

            match InboundFrame::classify(&bytes) {
                InboundFrame::Sentinel => {
                    report.sentinel_received = true;
                    break;
                }
                InboundFrame::Result(frame) => match table.merge_metric_b(frame.id, frame.metric_b) {
                    MergeOutcome::Merged => report.merged += 1,
                    MergeOutcome::Updated => {
                        debug!("[COLLECTION] Repeated result for id {}", frame.id);
                        report.duplicates += 1;
                    }
                    MergeOutcome::UnknownId => {
                        debug!("[COLLECTION] Ignoring result for unknown id {}", frame.id);
                        report.unknown_ids += 1;
                    }
                },
                InboundFrame::Malformed(len) => {
                    debug!("[COLLECTION] Ignoring {}-byte frame", len);
                    report.malformed += 1;
                }
            }
        }

        info!("[COLLECTION] Merged {} results", report.merged);
        debug!(
            "[COLLECTION] duplicates={} unknown_ids={} malformed={}",
            report.duplicates, report.unknown_ids, report.malformed
        );

        if let Err(e) = pull.stop() {
            debug!("[COLLECTION] Stop failed: {}", e);
        }

        report
    }
}

/// Window for `pull_timeout`: 0 blocks, anything else is at least 1 ms
fn pull_timeout_ms(timeout: Option<Duration>) -> u64 {
    timeout
        .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX).max(1))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use dualfilter_protocol::{ResultFrame, SENTINEL_FRAME};
    use dualfilter_transports::channel::channel_pair;
    use dualfilter_transports::{Push, Transport};

    fn table() -> ResultTable {
        ResultTable::from_records(&[
            Record::new(1, "A", 10, 40.0),
            Record::new(2, "B", 5, 90.0),
            Record::new(3, "C", 20, 60.0),
        ])
    }

    #[test]
    fn test_sentinel_alone_ends_collection() {
        let (mut push, mut pull) = channel_pair(None);
        push.start().unwrap();
        push.push(&SENTINEL_FRAME).unwrap();

        let table = table();
        let report = CollectionStage::default().run(&mut pull, &table);

        assert!(report.sentinel_received);
        assert_eq!(report.merged, 0);
        assert_eq!(table.stats().filter2, 0);
    }

    #[test]
    fn test_short_frame_does_not_desynchronize() {
        let (mut push, mut pull) = channel_pair(None);
        push.start().unwrap();
        push.push(&[1, 2, 3, 4, 5]).unwrap();
        push.push(&ResultFrame::new(2, 77.25).encode()).unwrap();
        push.push(&SENTINEL_FRAME).unwrap();

        let table = table();
        let report = CollectionStage::default().run(&mut pull, &table);

        assert_eq!(report.malformed, 1);
        assert_eq!(report.merged, 1);
        let entry = table.get(2).unwrap();
        assert!(entry.has_b);
        assert_eq!(entry.metric_b, 77.25);
    }

    #[test]
    fn test_unknown_ids_are_counted_not_inserted() {
        let (mut push, mut pull) = channel_pair(None);
        push.start().unwrap();
        push.push(&ResultFrame::new(404, 90.0).encode()).unwrap();
        push.push(&ResultFrame::new(1, 60.0).encode()).unwrap();
        push.push(&ResultFrame::new(1, 61.0).encode()).unwrap();
        push.push(&SENTINEL_FRAME).unwrap();

        let table = table();
        let report = CollectionStage::default().run(&mut pull, &table);

        assert_eq!(report.unknown_ids, 1);
        assert_eq!(report.merged, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.result_frames(), 3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).unwrap().metric_b, 61.0);
    }

    #[test]
    fn test_timeout_stops_without_sentinel() {
        let (mut push, mut pull) = channel_pair(None);
        push.start().unwrap();
        push.push(&ResultFrame::new(3, 55.0).encode()).unwrap();

        let table = table();
        let report = CollectionStage::new(Some(Duration::from_millis(30))).run(&mut pull, &table);

        assert!(report.timed_out);
        assert!(!report.sentinel_received);
        assert_eq!(report.merged, 1);
    }

    #[test]
    fn test_closed_sender_ends_with_error() {
        let (push, mut pull) = channel_pair(None);
        drop(push);

        let report = CollectionStage::default().run(&mut pull, &table());

        assert!(!report.sentinel_received);
        assert!(report.error.is_some());
    }

    #[test]
    fn test_timeout_window_saturates() {
        assert_eq!(pull_timeout_ms(None), 0);
        assert_eq!(pull_timeout_ms(Some(Duration::ZERO)), 1);
        assert_eq!(pull_timeout_ms(Some(Duration::from_millis(250))), 250);
        assert_eq!(pull_timeout_ms(Some(Duration::MAX)), u64::MAX);
    }
}
