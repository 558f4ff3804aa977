// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Distribution Stage
//!
//! Waits the settle delay, pushes one 12-byte record frame per record in list
//! order, then exactly one sentinel. No acks and no retries.

use crate::record::Record;
use dualfilter_protocol::SENTINEL_FRAME;
use dualfilter_transports::{Push, TransportResult};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default pause before the first frame, so the pool's PULL side is listening
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct DistributionReport {
    pub frames_sent: usize,
    pub sentinel_sent: bool,
    pub error: Option<String>,
}

pub struct DistributionStage {
    settle_delay: Duration,
}

impl Default for DistributionStage {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl DistributionStage {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Start `push`, stream the records and the sentinel, then stop it
    pub fn run<P: Push>(&self, push: &mut P, records: &[Record]) -> DistributionReport {
        let mut report = DistributionReport::default();

        if let Err(e) = push.start() {
            error!("[DISTRIBUTION] Failed to open {}: {}", push.transport_type(), e);
            report.error = Some(e.to_string());
            return report;
        }

        if let Err(e) = self.send_all(&*push, records, &mut report) {
            error!(
                "[DISTRIBUTION] Send failed after {} frames: {}",
                report.frames_sent, e
            );
            report.error = Some(e.to_string());
        } else {
            info!(
                "[DISTRIBUTION] Sent {} record frames and the end-of-stream sentinel",
                report.frames_sent
            );
        }

        // Linger on the socket flushes what is still queued
        if let Err(e) = push.stop() {
            debug!("[DISTRIBUTION] Stop failed: {}", e);
        }

        report
    }

    fn send_all<P: Push>(
        &self,
        push: &P,
        records: &[Record],
        report: &mut DistributionReport,
    ) -> TransportResult<()> {
        if !self.settle_delay.is_zero() {
            debug!("[DISTRIBUTION] Settling for {:?}", self.settle_delay);
            thread::sleep(self.settle_delay);
        }

        for record in records {
            push.push(&record.record_frame().encode())?;
            report.frames_sent += 1;
        }

        push.push(&SENTINEL_FRAME)?;
        report.sentinel_sent = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualfilter_protocol::{OutboundFrame, RecordFrame};
    use dualfilter_transports::channel::channel_pair;
    use dualfilter_transports::{Pull, Transport, TransportError};

    fn records() -> Vec<Record> {
        vec![
            Record::new(1, "A", 10, 40.0),
            Record::new(2, "B", 5, 90.0),
            Record::new(3, "C", 20, 60.0),
        ]
    }

    #[test]
    fn test_frames_in_order_then_one_sentinel() {
        let (mut push, mut pull) = channel_pair(None);
        pull.start().unwrap();

        let report = DistributionStage::new(Duration::ZERO).run(&mut push, &records());

        assert_eq!(report.frames_sent, 3);
        assert!(report.sentinel_sent);
        assert!(report.error.is_none());

        for expected in records() {
            let frame = pull.pull_timeout(100).unwrap();
            assert_eq!(frame.len(), 12);
            assert_eq!(
                OutboundFrame::classify(&frame),
                OutboundFrame::Record(RecordFrame::new(expected.id, expected.load, expected.uptime))
            );
        }
        assert_eq!(pull.pull_timeout(100).unwrap(), vec![0xFF]);
        assert!(matches!(pull.pull_timeout(20), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_empty_list_sends_only_sentinel() {
        let (mut push, mut pull) = channel_pair(None);
        pull.start().unwrap();

        let report = DistributionStage::new(Duration::ZERO).run(&mut push, &[]);

        assert_eq!(report.frames_sent, 0);
        assert!(report.sentinel_sent);
        assert_eq!(pull.pull_timeout(100).unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_closed_peer_ends_stage_with_error() {
        let (mut push, pull) = channel_pair(None);
        drop(pull);

        let report = DistributionStage::new(Duration::ZERO).run(&mut push, &records());

        assert_eq!(report.frames_sent, 0);
        assert!(!report.sentinel_sent);
        assert!(report.error.is_some());
        assert!(!push.is_running());
    }

    #[test]
    fn test_settle_delay_is_honoured() {
        let (mut push, mut pull) = channel_pair(None);
        pull.start().unwrap();

        let start = std::time::Instant::now();
        DistributionStage::new(Duration::from_millis(50)).run(&mut push, &records()[..1]);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(pull.pull_timeout(100).unwrap().len(), 12);
    }

    #[test]
    fn test_default_settle_delay() {
        assert_eq!(DistributionStage::default().settle_delay(), Duration::from_millis(500));
    }
}
