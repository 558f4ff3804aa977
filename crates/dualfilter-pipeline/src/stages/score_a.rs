// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Score Stage A (filter 1)
//!
//! Runs the reliability kernel over the full record list on the selected
//! backend and merges every accepted record into the table in one batch.
//! Backend failures end the stage with zero acceptances.

use crate::record::Record;
use crate::result_table::ResultTable;
use dualfilter_compute::{
    create_backend, BackendConfig, BackendType, ComputeResult, ReliabilityBackend,
};
use std::time::Duration;
use tracing::{error, info};

/// Builds the backend once the batch size is known
pub type BackendFactory =
    Box<dyn FnOnce(usize) -> ComputeResult<Box<dyn ReliabilityBackend>> + Send>;

/// What Score Stage A did
#[derive(Debug, Clone, Default)]
pub struct StageAReport {
    pub backend: String,
    pub total: usize,
    pub accepted: usize,
    pub elapsed: Duration,
    /// Set when the backend could not be built or the kernel failed
    pub error: Option<String>,
}

pub struct ScoreStageA {
    factory: BackendFactory,
    threshold: f32,
}

impl ScoreStageA {
    pub fn new(factory: BackendFactory, threshold: f32) -> Self {
        Self { factory, threshold }
    }

    /// Backend chosen by [`create_backend`] at run time
    pub fn from_config(backend_type: BackendType, config: BackendConfig, threshold: f32) -> Self {
        Self::new(
            Box::new(move |record_count: usize| create_backend(backend_type, record_count, &config)),
            threshold,
        )
    }

    /// Use an already constructed backend
    pub fn with_backend(backend: Box<dyn ReliabilityBackend>, threshold: f32) -> Self {
        Self::new(
            Box::new(move |_: usize| -> ComputeResult<Box<dyn ReliabilityBackend>> { Ok(backend) }),
            threshold,
        )
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn run(self, records: &[Record], table: &ResultTable) -> StageAReport {
        let total = records.len();

        let mut backend = match (self.factory)(total) {
            Ok(backend) => backend,
            Err(e) => {
                error!("[SCORE-A] Compute backend unavailable: {}", e);
                return StageAReport {
                    total,
                    error: Some(e.to_string()),
                    ..StageAReport::default()
                };
            }
        };
        let backend_name = backend.backend_name().to_string();

        let inputs: Vec<_> = records.iter().map(Record::score_input).collect();
        let outcome = match backend.filter(&inputs, self.threshold) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[SCORE-A] Kernel failed on {}: {}", backend_name, e);
                return StageAReport {
                    backend: backend_name,
                    total,
                    error: Some(e.to_string()),
                    ..StageAReport::default()
                };
            }
        };

        let accepted = table.merge_metric_a_batch(&outcome.accepted);

        info!(
            "[SCORE-A] Accepted {}/{} records (threshold {}) in {:.3}s on {}",
            accepted,
            total,
            self.threshold,
            outcome.elapsed.as_secs_f64(),
            backend_name
        );

        StageAReport {
            backend: backend_name,
            total,
            accepted,
            elapsed: outcome.elapsed,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualfilter_compute::{ComputeError, ScoreInput};

    struct FixedScores(Vec<f32>);

    impl ReliabilityBackend for FixedScores {
        fn backend_name(&self) -> &str {
            "fixed"
        }

        fn compute_scores(&mut self, _inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl ReliabilityBackend for Broken {
        fn backend_name(&self) -> &str {
            "broken"
        }

        fn compute_scores(&mut self, _inputs: &[ScoreInput]) -> ComputeResult<Vec<f32>> {
            Err(ComputeError::Execution("device lost".to_string()))
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new(1, "A", 10, 40.0),
            Record::new(2, "B", 5, 90.0),
            Record::new(3, "C", 20, 60.0),
        ]
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let records = records();
        let table = ResultTable::from_records(&records);
        let stage = ScoreStageA::with_backend(Box::new(FixedScores(vec![49.99, 50.0, 75.0])), 50.0);

        let report = stage.run(&records, &table);

        assert_eq!(report.accepted, 2);
        assert_eq!(report.backend, "fixed");
        assert!(report.error.is_none());
        assert!(!table.get(1).unwrap().has_a);
        assert_eq!(table.get(2).unwrap().metric_a, 50.0);
        assert!(table.get(3).unwrap().has_a);
    }

    #[test]
    fn test_kernel_failure_accepts_nothing() {
        let records = records();
        let table = ResultTable::from_records(&records);
        let report = ScoreStageA::with_backend(Box::new(Broken), 50.0).run(&records, &table);

        assert_eq!(report.accepted, 0);
        assert!(report.error.unwrap().contains("device lost"));
        assert_eq!(table.stats().filter1, 0);
    }

    #[test]
    fn test_unavailable_backend_accepts_nothing() {
        let records = records();
        let table = ResultTable::from_records(&records);
        let stage = ScoreStageA::new(
            Box::new(|_: usize| -> ComputeResult<Box<dyn ReliabilityBackend>> {
                Err(ComputeError::BackendUnavailable("no adapter".to_string()))
            }),
            50.0,
        );

        let report = stage.run(&records, &table);

        assert_eq!(report.total, 3);
        assert_eq!(report.accepted, 0);
        assert!(report.backend.is_empty());
        assert!(report.error.is_some());
    }

    #[test]
    fn test_cpu_backend_matches_kernel() {
        let records = records();
        let table = ResultTable::from_records(&records);
        let stage = ScoreStageA::from_config(
            BackendType::CPU,
            BackendConfig {
                iterations: 200,
                ..BackendConfig::default()
            },
            50.0,
        );

        let report = stage.run(&records, &table);

        for record in &records {
            let score = dualfilter_compute::reliability_score(record.uptime, record.load, 200);
            let entry = table.get(record.id).unwrap();
            assert_eq!(entry.has_a, score >= 50.0);
        }
        assert_eq!(report.accepted, table.stats().filter1);
    }
}
