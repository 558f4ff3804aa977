// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Orchestrator: spawns the three stages, joins them, reports.

```text
load ──► table ──┬─► [SCORE-A]      merge metric A ─┐
                 ├─► [DISTRIBUTION] PUSH frames     ├─► join ──► report
                 └─► [COLLECTION]   PULL + merge B ─┘
```

The stages borrow the records and the table from a `thread::scope`, so
neither has to outlive the run. A stage that fails or panics is logged and
degrades its filter; it never aborts the other two.
*/

use crate::error::PipelineResult;
use crate::record::Record;
use crate::report::{render_report, write_report};
use crate::result_table::{FilterStats, ResultTable};
use crate::source::load_records;
use crate::stages::{
    CollectionReport, CollectionStage, DistributionReport, DistributionStage, ScoreStageA,
    StageAReport,
};
use dualfilter_compute::{BackendConfig, BackendType, ComputeResult, ReliabilityBackend};
use dualfilter_config::DualfilterConfig;
use dualfilter_transports::zmq::{ZmqPull, ZmqPush};
use dualfilter_transports::{ClientConfig, Pull, Push, ServerConfig};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Everything the three stages need, moved into their threads
pub struct StageSet<P, Q> {
    pub score_a: ScoreStageA,
    pub distribution: DistributionStage,
    pub push: P,
    pub collection: CollectionStage,
    pub pull: Q,
}

/// Per-stage reports plus the table statistics after the join
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub score_a: StageAReport,
    pub distribution: DistributionReport,
    pub collection: CollectionReport,
    pub stats: FilterStats,
    pub elapsed: Duration,
}

/// Run the three stages concurrently over `table` and wait for all of them
pub fn run_stages<P, Q>(records: &[Record], table: &ResultTable, stages: StageSet<P, Q>) -> RunSummary
where
    P: Push,
    Q: Pull,
{
    let start = Instant::now();
    let StageSet {
        score_a,
        distribution,
        mut push,
        collection,
        mut pull,
    } = stages;

    let (score_a, distribution, collection) = thread::scope(|s| {
        let collection_handle = spawn_stage(s, "dualfilter-collection", move || {
            collection.run(&mut pull, table)
        });
        let distribution_handle = spawn_stage(s, "dualfilter-distribution", move || {
            distribution.run(&mut push, records)
        });
        let score_a_handle = spawn_stage(s, "dualfilter-score-a", move || score_a.run(records, table));

        (
            join_stage("SCORE-A", score_a_handle, |reason| StageAReport {
                total: records.len(),
                error: Some(reason),
                ..StageAReport::default()
            }),
            join_stage("DISTRIBUTION", distribution_handle, |reason| DistributionReport {
                error: Some(reason),
                ..DistributionReport::default()
            }),
            join_stage("COLLECTION", collection_handle, |reason| CollectionReport {
                error: Some(reason),
                ..CollectionReport::default()
            }),
        )
    });

    let stats = table.stats();
    info!(
        "[PIPELINE] All stages joined in {:.3}s: total={} filter1={} filter2={} both={}",
        start.elapsed().as_secs_f64(),
        stats.total,
        stats.filter1,
        stats.filter2,
        stats.both
    );

    RunSummary {
        score_a,
        distribution,
        collection,
        stats,
        elapsed: start.elapsed(),
    }
}

fn spawn_stage<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: &str,
    f: F,
) -> std::io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new().name(name.to_string()).spawn_scoped(scope, f)
}

fn join_stage<T>(
    tag: &str,
    handle: std::io::Result<ScopedJoinHandle<'_, T>>,
    failed: impl FnOnce(String) -> T,
) -> T {
    match handle {
        Ok(handle) => match handle.join() {
            Ok(report) => report,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!("[{}] Stage panicked: {}", tag, reason);
                failed(format!("panicked: {}", reason))
            }
        },
        Err(e) => {
            error!("[{}] Failed to spawn stage thread: {}", tag, e);
            failed(format!("spawn failed: {}", e))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub summary: RunSummary,
    pub report_path: PathBuf,
    /// Set when the report could not be written; the run itself still counts
    pub report_error: Option<String>,
}

impl PipelineOutcome {
    pub fn report_written(&self) -> bool {
        self.report_error.is_none()
    }
}

/// Production wiring: ZMQ transports and a compute backend from configuration
pub struct Pipeline {
    config: DualfilterConfig,
}

impl Pipeline {
    pub fn new(config: DualfilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DualfilterConfig {
        &self.config
    }

    /// Load, run all stages, write the report
    ///
    /// # Errors
    ///
    /// Load failures (before any stage starts) and transport configuration
    /// failures. Stage failures are not errors; they show up in
    /// [`RunSummary`]. A report that cannot be written is logged and left in
    /// [`PipelineOutcome::report_error`].
    pub fn run(&self) -> PipelineResult<PipelineOutcome> {
        let records = load_records(&self.config.pipeline.input)?;
        let table = ResultTable::from_records(&records);

        let stages = self.build_stages()?;
        let summary = run_stages(&records, &table, stages);
        log_stage_failures(&summary);

        let report = render_report(&records, &table);
        let report_path = self.config.pipeline.output.clone();
        let report_error = match write_report(&report_path, &report) {
            Ok(()) => None,
            Err(e) => {
                error!("[PIPELINE] Cannot create output: {}", e);
                Some(e.to_string())
            }
        };

        Ok(PipelineOutcome {
            summary,
            report_path,
            report_error,
        })
    }

    fn build_stages(&self) -> PipelineResult<StageSet<ZmqPush, ZmqPull>> {
        let channels = &self.config.channels;
        let context = Arc::new(zmq::Context::new());

        let mut push_config = ClientConfig::new(channels.distribution_endpoint.clone());
        push_config.base = push_config
            .base
            .with_send_hwm(channels.send_hwm)
            .with_linger(channels.linger());
        let push = ZmqPush::new(Arc::clone(&context), push_config)?;

        let mut pull_config = ServerConfig::new(channels.collection_endpoint.clone());
        pull_config.base = pull_config.base.with_recv_hwm(channels.recv_hwm);
        let pull = ZmqPull::new(context, pull_config)?;

        Ok(StageSet {
            score_a: self.build_score_stage(),
            distribution: DistributionStage::new(channels.settle_delay()),
            push,
            collection: CollectionStage::new(channels.collection_timeout()),
            pull,
        })
    }

    fn build_score_stage(&self) -> ScoreStageA {
        let compute = &self.config.compute;
        let backend_config = BackendConfig {
            iterations: compute.reliability_iterations,
            gpu_record_threshold: compute.gpu_record_threshold,
            ..BackendConfig::default()
        };
        let threshold = self.config.pipeline.threshold;

        match compute.backend.parse::<BackendType>() {
            Ok(backend_type) => ScoreStageA::from_config(backend_type, backend_config, threshold),
            // Validation rejects unknown names; keep the failure inside the stage regardless
            Err(e) => ScoreStageA::new(
                Box::new(move |_: usize| -> ComputeResult<Box<dyn ReliabilityBackend>> { Err(e) }),
                threshold,
            ),
        }
    }
}

fn log_stage_failures(summary: &RunSummary) {
    if let Some(e) = &summary.score_a.error {
        warn!("[PIPELINE] Filter 1 degraded: {}", e);
    }
    if let Some(e) = &summary.distribution.error {
        warn!("[PIPELINE] Distribution incomplete: {}", e);
    }
    if let Some(e) = &summary.collection.error {
        warn!("[PIPELINE] Filter 2 degraded: {}", e);
    } else if summary.collection.timed_out {
        warn!("[PIPELINE] Collection timed out before the sentinel");
    }
}
