// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Stability worker pool (filter 2).

```text
PULL (bind) ──► receiver ──► tasks ──► worker 1..N ──► results ──► sender ──► PUSH (connect)
  12-byte frames            crossbeam      stability     crossbeam    8-byte frames + sentinel
```

The receiver closes the task channel when the sentinel arrives, workers exit
when it drains, and the sender forwards the sentinel once every worker has
dropped its result handle.
*/

use crate::error::{WorkerError, WorkerResult};
use crossbeam::channel::{self, Receiver, Sender};
use dualfilter_compute::{stability_score, STABILITY_ITERATIONS};
use dualfilter_config::DualfilterConfig;
use dualfilter_protocol::{OutboundFrame, RecordFrame, ResultFrame, SENTINEL_FRAME};
use dualfilter_transports::zmq::{ZmqPull, ZmqPush};
use dualfilter_transports::{ClientConfig, Pull, Push, ServerConfig, Transport};
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Worker pool settings
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Bound by the receiver
    pub distribution_endpoint: String,
    /// Connected to by the sender
    pub collection_endpoint: String,
    pub workers: usize,
    pub stability_iterations: u32,
    /// Keep results with `stability >= stability_threshold`
    pub stability_threshold: f64,
    pub connect_retries: u32,
    pub connect_retry_delay: Duration,
    pub linger: Duration,
    pub send_hwm: usize,
    pub recv_hwm: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            distribution_endpoint: "tcp://127.0.0.1:5557".to_string(),
            collection_endpoint: "tcp://127.0.0.1:5558".to_string(),
            workers: 1,
            stability_iterations: STABILITY_ITERATIONS,
            stability_threshold: 50.0,
            connect_retries: 30,
            connect_retry_delay: Duration::from_secs(1),
            linger: Duration::from_millis(1000),
            send_hwm: 1000,
            recv_hwm: 1000,
        }
    }
}

impl WorkerPoolConfig {
    /// Derive pool settings from the shared configuration
    pub fn from_config(config: &DualfilterConfig, available_cores: usize) -> Self {
        Self {
            distribution_endpoint: config.channels.distribution_endpoint.clone(),
            collection_endpoint: config.channels.collection_endpoint.clone(),
            workers: config.workers.resolved_count(available_cores),
            stability_iterations: config.workers.stability_iterations,
            stability_threshold: config.workers.stability_threshold,
            connect_retries: config.workers.connect_retries,
            connect_retry_delay: Duration::from_millis(config.workers.connect_retry_delay_ms),
            linger: config.channels.linger(),
            send_hwm: config.channels.send_hwm,
            recv_hwm: config.channels.recv_hwm,
        }
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.workers == 0 {
            return Err(WorkerError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.stability_iterations == 0 {
            return Err(WorkerError::InvalidConfig(
                "stability_iterations must be > 0".to_string(),
            ));
        }
        if !self.stability_threshold.is_finite() {
            return Err(WorkerError::InvalidConfig(format!(
                "stability_threshold must be finite, got {}",
                self.stability_threshold
            )));
        }
        Ok(())
    }
}

/// Counters for one pool run
#[derive(Debug, Clone, Default)]
pub struct WorkerPoolReport {
    pub workers: usize,
    /// Record frames decoded by the receiver
    pub received: usize,
    /// Frames the receiver skipped
    pub malformed: usize,
    pub processed: usize,
    pub accepted: usize,
    /// Result frames pushed (sentinel not included)
    pub sent: usize,
    pub sentinel_forwarded: bool,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct ReceiverStats {
    received: usize,
    malformed: usize,
}

#[derive(Debug, Default)]
struct WorkerStats {
    processed: usize,
    accepted: usize,
}

#[derive(Debug, Default)]
struct SenderStats {
    sent: usize,
    sentinel_forwarded: bool,
}

pub struct WorkerPool {
    config: WorkerPoolConfig,
}

impl WorkerPool {
    pub fn new(config: WorkerPoolConfig) -> WorkerResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    /// Bind and connect the ZMQ sockets, then serve one stream until its sentinel
    pub fn run(&self) -> WorkerResult<WorkerPoolReport> {
        let context = Arc::new(zmq::Context::new());

        let mut pull_config = ServerConfig::new(self.config.distribution_endpoint.clone());
        pull_config.base = pull_config.base.with_recv_hwm(self.config.recv_hwm);
        let pull = ZmqPull::new(Arc::clone(&context), pull_config)?;

        let mut push_config = ClientConfig::new(self.config.collection_endpoint.clone())
            .with_retries(self.config.connect_retries, self.config.connect_retry_delay);
        push_config.base = push_config
            .base
            .with_send_hwm(self.config.send_hwm)
            .with_linger(self.config.linger);
        let push = ZmqPush::new(context, push_config)?;

        self.run_with(pull, push)
    }

    /// Serve one stream over the given transports
    ///
    /// Both transports are started before any thread is spawned, so bind and
    /// connect failures are returned instead of leaving half a pool running.
    pub fn run_with<Q, P>(&self, mut pull: Q, mut push: P) -> WorkerResult<WorkerPoolReport>
    where
        Q: Pull,
        P: Push,
    {
        pull.start()?;
        if let Err(e) = push.start() {
            let _ = pull.stop();
            return Err(e.into());
        }

        info!(
            "[WORKER] Pool ready: {} workers, {} iterations, threshold {}",
            self.config.workers, self.config.stability_iterations, self.config.stability_threshold
        );

        let start = Instant::now();
        let outcome = thread::scope(|s| self.spawn_and_join(s, &pull, &push));

        let _ = push.stop();
        let _ = pull.stop();

        let (receiver, workers, sender) = outcome?;
        let report = WorkerPoolReport {
            workers: self.config.workers,
            received: receiver.received,
            malformed: receiver.malformed,
            processed: workers.processed,
            accepted: workers.accepted,
            sent: sender.sent,
            sentinel_forwarded: sender.sentinel_forwarded,
            elapsed: start.elapsed(),
        };

        info!(
            "[WORKER] {}/{} passed, {} sent in {} ms",
            report.accepted,
            report.received,
            report.sent,
            report.elapsed.as_millis()
        );

        Ok(report)
    }

    fn spawn_and_join<'scope, Q, P>(
        &'scope self,
        s: &'scope Scope<'scope, '_>,
        pull: &'scope Q,
        push: &'scope P,
    ) -> WorkerResult<(ReceiverStats, WorkerStats, SenderStats)>
    where
        Q: Pull,
        P: Push,
    {
        let (task_tx, task_rx) = channel::unbounded::<RecordFrame>();
        let (result_tx, result_rx) = channel::unbounded::<ResultFrame>();

        // Consumers first: if a later spawn fails, dropping the channel ends them
        let mut worker_handles = Vec::with_capacity(self.config.workers);
        for worker_id in 1..=self.config.workers {
            let tasks = task_rx.clone();
            let results = result_tx.clone();
            let handle = spawn(s, format!("dualfilter-worker-{}", worker_id), move || {
                self.worker_loop(worker_id, tasks, results)
            })?;
            worker_handles.push(handle);
        }
        drop(task_rx);
        drop(result_tx);

        let sender_handle = spawn(s, "dualfilter-sender".to_string(), move || {
            sender_loop(push, result_rx)
        })?;
        let receiver_handle = spawn(s, "dualfilter-receiver".to_string(), move || {
            receiver_loop(pull, task_tx)
        })?;

        let receiver = join_or_default(receiver_handle, "receiver");
        let mut workers = WorkerStats::default();
        for handle in worker_handles {
            let stats = join_or_default(handle, "worker");
            workers.processed += stats.processed;
            workers.accepted += stats.accepted;
        }
        let sender = join_or_default(sender_handle, "sender");

        Ok((receiver, workers, sender))
    }

    fn worker_loop(
        &self,
        worker_id: usize,
        tasks: Receiver<RecordFrame>,
        results: Sender<ResultFrame>,
    ) -> WorkerStats {
        let mut stats = WorkerStats::default();

        for task in tasks.iter() {
            let stability = stability_score(
                task.id,
                task.uptime,
                task.load,
                self.config.stability_iterations,
            );
            stats.processed += 1;

            if stability >= self.config.stability_threshold {
                stats.accepted += 1;
                if results.send(ResultFrame::new(task.id, stability as f32)).is_err() {
                    warn!("[WORKER-{}] Sender gone, dropping result for id {}", worker_id, task.id);
                }
            }
        }

        info!(
            "[WORKER-{}] Done: {}/{} passed",
            worker_id, stats.accepted, stats.processed
        );
        stats
    }
}

fn receiver_loop<Q: Pull>(pull: &Q, tasks: Sender<RecordFrame>) -> ReceiverStats {
    let mut stats = ReceiverStats::default();

    loop {
        let bytes = match pull.pull() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("[WORKER] Receive failed: {}", e);
                break;
            }
        };

        match OutboundFrame::classify(&bytes) {
            OutboundFrame::Record(frame) => {
                stats.received += 1;
                if tasks.send(frame).is_err() {
                    error!("[WORKER] All workers gone, stopping receiver");
                    break;
                }
            }
            OutboundFrame::Sentinel => break,
            OutboundFrame::Malformed(len) => {
                warn!("[WORKER] Skipping {}-byte frame", len);
                stats.malformed += 1;
            }
        }
    }

    info!("[WORKER] Received {} records", stats.received);
    // Dropping `tasks` here lets the workers drain and exit
    stats
}

fn sender_loop<P: Push>(push: &P, results: Receiver<ResultFrame>) -> SenderStats {
    let mut stats = SenderStats::default();
    let mut failed = false;

    for result in results.iter() {
        if failed {
            continue;
        }
        match push.push(&result.encode()) {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                error!("[WORKER] Send failed after {} results: {}", stats.sent, e);
                failed = true;
            }
        }
    }

    if !failed {
        match push.push(&SENTINEL_FRAME) {
            Ok(()) => stats.sentinel_forwarded = true,
            Err(e) => error!("[WORKER] Failed to forward sentinel: {}", e),
        }
    }

    debug!("[WORKER] Sender finished: {} results", stats.sent);
    stats
}

fn spawn<'scope, T, F>(
    s: &'scope Scope<'scope, '_>,
    name: String,
    f: F,
) -> WorkerResult<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn_scoped(s, f)
        .map_err(|source| WorkerError::Spawn { thread: name, source })
}

fn join_or_default<T: Default>(handle: ScopedJoinHandle<'_, T>, role: &str) -> T {
    handle.join().unwrap_or_else(|_| {
        error!("[WORKER] {} thread panicked", role);
        T::default()
    })
}
