// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Worker pool over real ZMQ sockets on loopback

use dualfilter_compute::stability_score;
use dualfilter_protocol::{InboundFrame, RecordFrame, SENTINEL_FRAME};
use dualfilter_transports::zmq::{ZmqPull, ZmqPush};
use dualfilter_transports::{Pull, Push, Transport, TransportError};
use dualfilter_worker::{WorkerPool, WorkerPoolConfig};
use std::thread;
use std::time::Duration;

fn pool_config(distribution_port: u16, collection_port: u16) -> WorkerPoolConfig {
    WorkerPoolConfig {
        distribution_endpoint: format!("tcp://127.0.0.1:{}", distribution_port),
        collection_endpoint: format!("tcp://127.0.0.1:{}", collection_port),
        workers: 3,
        stability_iterations: 200,
        stability_threshold: 50.0,
        connect_retries: 2,
        connect_retry_delay: Duration::from_millis(10),
        linger: Duration::from_millis(500),
        ..WorkerPoolConfig::default()
    }
}

#[test]
fn test_pool_round_trip() {
    let config = pool_config(31201, 31202);

    // Pipeline side: collection PULL binds, distribution PUSH connects
    let mut results = ZmqPull::with_address(config.collection_endpoint.clone()).unwrap();
    results.start().unwrap();

    let pool = WorkerPool::new(config.clone()).unwrap();
    let pool_thread = thread::spawn(move || pool.run().unwrap());

    let mut records = ZmqPush::with_address(config.distribution_endpoint.clone()).unwrap();
    records.start().unwrap();
    thread::sleep(Duration::from_millis(200));

    let inputs: Vec<RecordFrame> = (1..=20)
        .map(|id| RecordFrame::new(id, (id * 3) as f32, id * 250))
        .collect();
    for frame in &inputs {
        records.push(&frame.encode()).unwrap();
    }
    records.push(&SENTINEL_FRAME).unwrap();

    let mut received = Vec::new();
    loop {
        let bytes = results.pull_timeout(10_000).unwrap();
        match InboundFrame::classify(&bytes) {
            InboundFrame::Result(frame) => received.push(frame),
            InboundFrame::Sentinel => break,
            InboundFrame::Malformed(len) => panic!("pool sent a {}-byte frame", len),
        }
    }

    let report = pool_thread.join().unwrap();

    let expected: Vec<i32> = inputs
        .iter()
        .filter(|f| stability_score(f.id, f.uptime, f.load, 200) >= 50.0)
        .map(|f| f.id)
        .collect();

    let mut ids: Vec<i32> = received.iter().map(|f| f.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, expected);

    for frame in &received {
        let input = inputs.iter().find(|f| f.id == frame.id).unwrap();
        let score = stability_score(input.id, input.uptime, input.load, 200) as f32;
        assert_eq!(frame.metric_b, score);
    }

    assert_eq!(report.received, 20);
    assert_eq!(report.processed, 20);
    assert_eq!(report.accepted, expected.len());
    assert_eq!(report.sent, expected.len());
    assert!(report.sentinel_forwarded);

    // Nothing follows the sentinel
    assert!(matches!(results.pull_timeout(100), Err(TransportError::Timeout)));
}

#[test]
fn test_pool_fails_when_endpoint_taken() {
    let config = pool_config(31203, 31204);

    let mut squatter = ZmqPull::with_address(config.distribution_endpoint.clone()).unwrap();
    squatter.start().unwrap();

    let result = WorkerPool::new(config).unwrap().run();
    assert!(result.is_err());
}
