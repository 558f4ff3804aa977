// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline and worker pool together: in-process channels and real ZMQ

use dualfilter::compute::{reliability_score, stability_score, BackendConfig, BackendType};
use dualfilter::config::DualfilterConfig;
use dualfilter::pipeline::{
    render_report, run_stages, CollectionStage, DistributionStage, Pipeline, Record, ResultTable,
    ScoreStageA, StageSet,
};
use dualfilter::transports::channel::channel_pair;
use dualfilter::worker::{WorkerPool, WorkerPoolConfig};
use std::collections::BTreeSet;
use std::thread;
use std::time::Duration;

const ITERATIONS: u32 = 300;

fn records() -> Vec<Record> {
    (1..=24)
        .map(|id| {
            Record::new(
                id,
                format!("site-{:02}", id),
                (id * 1_337) % 50_000,
                (id * 7 % 100) as f32 + 0.5,
            )
        })
        .collect()
}

fn expected_filter1(records: &[Record]) -> BTreeSet<i32> {
    records
        .iter()
        .filter(|r| reliability_score(r.uptime, r.load, ITERATIONS) >= 50.0)
        .map(|r| r.id)
        .collect()
}

fn expected_filter2(records: &[Record]) -> BTreeSet<i32> {
    records
        .iter()
        .filter(|r| stability_score(r.id, r.uptime, r.load, ITERATIONS) >= 50.0)
        .map(|r| r.id)
        .collect()
}

#[test]
fn test_in_process_pipeline_with_worker_pool() {
    let records = records();
    let table = ResultTable::from_records(&records);

    let (pipeline_push, pool_pull) = channel_pair(None);
    let (pool_push, pipeline_pull) = channel_pair(None);

    let pool = WorkerPool::new(WorkerPoolConfig {
        workers: 3,
        stability_iterations: ITERATIONS,
        ..WorkerPoolConfig::default()
    })
    .unwrap();
    let pool_thread = thread::spawn(move || pool.run_with(pool_pull, pool_push).unwrap());

    let stages = StageSet {
        score_a: ScoreStageA::from_config(
            BackendType::CPU,
            BackendConfig {
                iterations: ITERATIONS,
                ..BackendConfig::default()
            },
            50.0,
        ),
        distribution: DistributionStage::new(Duration::from_millis(20)),
        push: pipeline_push,
        collection: CollectionStage::default(),
        pull: pipeline_pull,
    };
    let summary = run_stages(&records, &table, stages);
    let pool_report = pool_thread.join().unwrap();

    let filter1 = expected_filter1(&records);
    let filter2 = expected_filter2(&records);
    let both: BTreeSet<i32> = filter1.intersection(&filter2).copied().collect();

    assert_eq!(pool_report.received, records.len());
    assert_eq!(pool_report.sent, filter2.len());
    assert_eq!(summary.stats.total, records.len());
    assert_eq!(summary.stats.filter1, filter1.len());
    assert_eq!(summary.stats.filter2, filter2.len());
    assert_eq!(summary.stats.both, both.len());

    let reported: BTreeSet<i32> = table.intersection().iter().map(|r| r.id).collect();
    assert_eq!(reported, both);

    // Metric B arrives as f32 over the wire
    for result in table.intersection() {
        let record = records.iter().find(|r| r.id == result.id).unwrap();
        let stability = stability_score(record.id, record.uptime, record.load, ITERATIONS) as f32;
        assert_eq!(result.metric_b, stability);
    }

    let report = render_report(&records, &table);
    assert!(report.contains(&format!(
        "  Total: {}, Filter1: {}, Filter2: {}, Both: {}",
        records.len(),
        filter1.len(),
        filter2.len(),
        both.len()
    )));
}

#[test]
fn test_pipeline_and_pool_over_zmq() {
    let dir = tempfile::tempdir().unwrap();
    let records = records();

    let input = dir.path().join("data").join("servers.json");
    std::fs::create_dir_all(input.parent().unwrap()).unwrap();
    std::fs::write(
        &input,
        serde_json::to_string(&serde_json::json!({ "servers": records })).unwrap(),
    )
    .unwrap();

    let mut config = DualfilterConfig::default();
    config.pipeline.input = input;
    config.pipeline.output = dir.path().join("results").join("output.txt");
    config.channels.distribution_endpoint = "tcp://127.0.0.1:31301".to_string();
    config.channels.collection_endpoint = "tcp://127.0.0.1:31302".to_string();
    config.channels.settle_delay_ms = 300;
    config.channels.collection_timeout_ms = Some(30_000);
    config.compute.backend = "cpu".to_string();
    config.compute.reliability_iterations = ITERATIONS;
    config.workers.count = 2;
    config.workers.stability_iterations = ITERATIONS;
    config.workers.connect_retry_delay_ms = 10;

    let pool = WorkerPool::new(WorkerPoolConfig::from_config(&config, 4)).unwrap();
    let pool_thread = thread::spawn(move || pool.run().unwrap());

    let outcome = Pipeline::new(config).run().unwrap();
    let pool_report = pool_thread.join().unwrap();

    let filter1 = expected_filter1(&records);
    let filter2 = expected_filter2(&records);
    let both = filter1.intersection(&filter2).count();

    assert!(outcome.summary.collection.sentinel_received);
    assert!(!outcome.summary.collection.timed_out);
    assert!(pool_report.sentinel_forwarded);
    assert_eq!(outcome.summary.stats.filter1, filter1.len());
    assert_eq!(outcome.summary.stats.filter2, filter2.len());
    assert_eq!(outcome.summary.stats.both, both);

    let report = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.starts_with(&"=".repeat(80)));
    assert!(report.contains("FILTERED RESULTS (passed both filters)"));
    assert!(report.contains("site-01"));
}
