//! Push driver
//!
//! One background task per driver that repeats
//! collect -> map -> chunk -> send on a fixed cadence until closed.
//!
//! Cadence is measured from cycle start, so a cycle that takes `d` is
//! followed by a sleep of `interval - d` (never negative). A failure aborts
//! the rest of the current cycle only; the loop is never terminated by a
//! cycle error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::batcher::batches;
use super::driver::MetricsDriver;
use super::error::DriverError;
use super::export::ExportAdapter;
use super::mapper::{Clock, PayloadMapper, SystemClock};
use crate::core::config::DriverConfig;
use crate::data::exporters::ExportClient;
use crate::domain::metrics::{Collector, DriverStats};

enum DriverState {
    Created,
    Running(JoinHandle<()>),
    Stopped,
}

/// Outcome of a successful cycle
#[derive(Debug, Clone, Copy)]
struct CycleReport {
    metrics: usize,
    records: usize,
    chunks: usize,
}

struct DriverLoop {
    config: DriverConfig,
    collector: Arc<dyn Collector>,
    mapper: PayloadMapper,
    exporter: ExportAdapter,
    stats: Arc<DriverStats>,
    cancel: CancellationToken,
}

pub struct PushDriver {
    inner: Arc<DriverLoop>,
    state: Mutex<DriverState>,
}

impl PushDriver {
    pub fn new(
        config: DriverConfig,
        collector: Arc<dyn Collector>,
        client: Arc<dyn ExportClient>,
        stats: Arc<DriverStats>,
    ) -> Self {
        Self::with_clock(config, collector, client, stats, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: DriverConfig,
        collector: Arc<dyn Collector>,
        client: Arc<dyn ExportClient>,
        stats: Arc<DriverStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mapper = PayloadMapper::new(config.base_dimensions.clone(), client.profile(), clock);
        let exporter = ExportAdapter::new(client, config.namespace.clone());
        Self {
            inner: Arc::new(DriverLoop {
                config,
                collector,
                mapper,
                exporter,
                stats,
                cancel: CancellationToken::new(),
            }),
            state: Mutex::new(DriverState::Created),
        }
    }

    pub fn stats(&self) -> &Arc<DriverStats> {
        &self.inner.stats
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), DriverState::Running(_))
    }
}

#[async_trait]
impl MetricsDriver for PushDriver {
    fn name(&self) -> &str {
        &self.inner.config.name
    }

    fn initialize(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        match *state {
            DriverState::Created => {}
            DriverState::Running(_) => return Err(DriverError::AlreadyStarted(self.name().into())),
            DriverState::Stopped => return Err(DriverError::Stopped(self.name().into())),
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| DriverError::NoRuntime(self.name().into()))?;
        let handle = runtime.spawn(Arc::clone(&self.inner).run());
        *state = DriverState::Running(handle);
        Ok(())
    }

    async fn close(&self) {
        let running = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, DriverState::Stopped) {
                DriverState::Running(handle) => Some(handle),
                DriverState::Created => None,
                DriverState::Stopped => return,
            }
        };

        let name = self.name();
        tracing::info!(driver = name, "Stopping metrics driver");
        self.inner.cancel.cancel();

        // Never started: nothing to wait for, but the driver is now terminal
        let Some(mut handle) = running else {
            return;
        };

        let grace = self.inner.config.shutdown_grace();
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(())) => tracing::debug!(driver = name, "Metrics driver stopped"),
            Ok(Err(e)) => tracing::warn!(driver = name, error = %e, "Metrics driver task ended abnormally"),
            Err(_) => {
                tracing::warn!(
                    driver = name,
                    grace_secs = grace.as_secs(),
                    "Metrics driver did not stop within grace period, aborting"
                );
                handle.abort();
            }
        }
    }
}

impl DriverLoop {
    async fn run(self: Arc<Self>) {
        let interval = self.config.push_interval();
        tracing::info!(
            driver = %self.config.name,
            namespace = self.exporter.namespace(),
            interval_secs = interval.as_secs(),
            "Metrics driver started"
        );

        loop {
            let started = Instant::now();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                result = self.run_cycle() => self.finish_cycle(result, started.elapsed()),
            }

            let remaining = interval.saturating_sub(started.elapsed());
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(remaining) => {}
            }
        }

        tracing::debug!(driver = %self.config.name, "Metrics driver loop exited");
    }

    async fn run_cycle(&self) -> Result<CycleReport, DriverError> {
        let snapshot = self.collector.collect().await?;
        let records = self.mapper.map_snapshot(&snapshot)?;

        let mut report = CycleReport {
            metrics: snapshot.len(),
            records: records.len(),
            chunks: 0,
        };
        for chunk in batches(&records, self.exporter.profile().max_chunk_size) {
            self.exporter.send_chunk(chunk).await?;
            self.stats.record_chunk(chunk.len());
            report.chunks += 1;
        }
        Ok(report)
    }

    fn finish_cycle(&self, result: Result<CycleReport, DriverError>, elapsed: Duration) {
        self.stats.observe_cycle(elapsed);
        let name = self.config.name.as_str();
        let threshold = self.config.failure_warn_threshold;

        match result {
            Ok(report) => {
                let ended_streak = self.stats.record_success();
                if threshold > 0 && ended_streak >= threshold {
                    tracing::info!(
                        driver = name,
                        failed_cycles = ended_streak,
                        "Metrics export recovered"
                    );
                }
                tracing::debug!(
                    driver = name,
                    metrics = report.metrics,
                    records = report.records,
                    chunks = report.chunks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Export cycle complete"
                );
            }
            Err(e) => {
                let streak = self.stats.record_failure();
                tracing::error!(
                    driver = name,
                    error = %e,
                    "An error occurred whilst exporting metrics"
                );
                if threshold > 0 && streak == threshold {
                    tracing::warn!(
                        driver = name,
                        consecutive_failures = streak,
                        "Metrics export has been failing repeatedly"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::exporters::{
        BackendError, BackendProfile, BackendRecord, CLOUDWATCH_PROFILE, Dimension,
    };
    use crate::domain::drivers::mapper::FixedClock;
    use crate::domain::metrics::{CollectionError, Metric, Snapshot};
    use chrono::{TimeZone, Utc};

    const INTERVAL_SECS: u64 = 60;

    fn config() -> DriverConfig {
        DriverConfig {
            name: "cloudwatch".to_string(),
            push_interval_secs: INTERVAL_SECS,
            namespace: "Minecraft".to_string(),
            base_dimensions: vec![Dimension::new("server", "lobby-1")],
            failure_warn_threshold: 2,
            shutdown_grace_secs: 5,
        }
    }

    /// Collector that records pull times and can be scripted to fail or stall
    struct ScriptedCollector {
        metrics: usize,
        delay: Duration,
        fail_on_pull: Option<usize>,
        hang: bool,
        pulls: Mutex<Vec<Instant>>,
    }

    impl ScriptedCollector {
        fn new(metrics: usize) -> Self {
            Self {
                metrics,
                delay: Duration::ZERO,
                fail_on_pull: None,
                hang: false,
                pulls: Mutex::new(Vec::new()),
            }
        }

        fn pull_count(&self) -> usize {
            self.pulls.lock().len()
        }
    }

    #[async_trait]
    impl Collector for ScriptedCollector {
        async fn collect(&self) -> Result<Snapshot, CollectionError> {
            let pull = {
                let mut pulls = self.pulls.lock();
                pulls.push(Instant::now());
                pulls.len()
            };
            if self.hang {
                std::future::pending::<()>().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on_pull == Some(pull) {
                return Err(CollectionError::failed("scripted", "tick data unavailable"));
            }
            Ok((0..self.metrics)
                .map(|i| Metric::gauge(format!("gauge_{i}"), i as f64))
                .collect())
        }
    }

    enum FailMode {
        Never,
        Always,
        OnCall(usize),
    }

    struct FakeClient {
        mode: FailMode,
        calls: Mutex<Vec<usize>>,
    }

    impl FakeClient {
        fn new(mode: FailMode) -> Self {
            Self {
                mode,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn sizes(&self) -> Vec<usize> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ExportClient for FakeClient {
        fn profile(&self) -> &'static BackendProfile {
            &CLOUDWATCH_PROFILE
        }

        async fn send(&self, _namespace: &str, records: &[BackendRecord]) -> Result<(), BackendError> {
            let call = {
                let mut calls = self.calls.lock();
                calls.push(records.len());
                calls.len()
            };
            let fail = match self.mode {
                FailMode::Never => false,
                FailMode::Always => true,
                FailMode::OnCall(n) => n == call,
            };
            if fail {
                return Err(BackendError::Throttled {
                    backend: "fake",
                    message: "Rate exceeded".to_string(),
                });
            }
            Ok(())
        }
    }

    fn driver(collector: Arc<ScriptedCollector>, client: Arc<FakeClient>) -> PushDriver {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 14, 8, 0, 0).unwrap());
        PushDriver::with_clock(
            config(),
            collector,
            client,
            Arc::new(DriverStats::new()),
            Arc::new(clock),
        )
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulls_are_spaced_by_interval_from_cycle_start() {
        let collector = Arc::new(ScriptedCollector {
            delay: Duration::from_secs(5),
            ..ScriptedCollector::new(3)
        });
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector.clone(), client.clone());

        driver.initialize().unwrap();
        advance(130).await;
        driver.close().await;

        let pulls = collector.pulls.lock().clone();
        assert_eq!(pulls.len(), 3);
        for pair in pulls.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(INTERVAL_SECS));
        }
        assert_eq!(client.sizes(), vec![3, 3, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failures_never_stop_the_loop() {
        let collector = Arc::new(ScriptedCollector::new(1));
        let client = Arc::new(FakeClient::new(FailMode::Always));
        let driver = driver(collector.clone(), client.clone());

        driver.initialize().unwrap();
        advance(150).await;
        driver.close().await;

        assert_eq!(collector.pull_count(), 3);
        assert_eq!(client.sizes().len(), 3);

        let stats = driver.stats().snapshot();
        assert_eq!(stats.failed_cycles, 3);
        assert_eq!(stats.consecutive_failures, 3);
        assert_eq!(stats.records_sent, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collection_failure_is_counted_and_skips_only_that_cycle() {
        let collector = Arc::new(ScriptedCollector {
            fail_on_pull: Some(2),
            ..ScriptedCollector::new(4)
        });
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector.clone(), client.clone());

        driver.initialize().unwrap();
        advance(150).await;
        driver.close().await;

        assert_eq!(collector.pull_count(), 3);
        assert_eq!(client.sizes(), vec![4, 4]);

        let stats = driver.stats().snapshot();
        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_sent_in_backend_sized_chunks() {
        let collector = Arc::new(ScriptedCollector::new(320));
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector, client.clone());

        driver.initialize().unwrap();
        advance(1).await;
        driver.close().await;

        assert_eq!(client.sizes(), vec![150, 150, 20]);
        let stats = driver.stats().snapshot();
        assert_eq!(stats.chunks_sent, 3);
        assert_eq!(stats.records_sent, 320);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunk_failure_skips_rest_of_cycle_and_retries_next_cycle() {
        let collector = Arc::new(ScriptedCollector::new(320));
        let client = Arc::new(FakeClient::new(FailMode::OnCall(2)));
        let driver = driver(collector, client.clone());

        driver.initialize().unwrap();
        advance(INTERVAL_SECS + 1).await;
        driver.close().await;

        // Cycle one stops after the failed second chunk, cycle two sends everything
        assert_eq!(client.sizes(), vec![150, 150, 150, 150, 20]);
        let stats = driver.stats().snapshot();
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.records_sent, 150 + 320);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_snapshot_sends_nothing() {
        let collector = Arc::new(ScriptedCollector::new(0));
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector.clone(), client.clone());

        driver.initialize().unwrap();
        advance(1).await;
        driver.close().await;

        assert_eq!(collector.pull_count(), 1);
        assert!(client.sizes().is_empty());
        assert_eq!(driver.stats().snapshot().failed_cycles, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pulls_after_close() {
        let collector = Arc::new(ScriptedCollector::new(1));
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector.clone(), client);

        driver.initialize().unwrap();
        advance(10).await;
        driver.close().await;
        assert!(!driver.is_running());

        advance(INTERVAL_SECS * 5).await;
        assert_eq!(collector.pull_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_interrupts_stalled_cycle() {
        let collector = Arc::new(ScriptedCollector {
            hang: true,
            ..ScriptedCollector::new(1)
        });
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector.clone(), client.clone());

        driver.initialize().unwrap();
        advance(1).await;

        let started = Instant::now();
        driver.close().await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(client.sizes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_guards() {
        let collector = Arc::new(ScriptedCollector::new(1));
        let client = Arc::new(FakeClient::new(FailMode::Never));
        let driver = driver(collector, client);

        driver.initialize().unwrap();
        assert!(driver.is_running());
        assert!(matches!(
            driver.initialize(),
            Err(DriverError::AlreadyStarted(_))
        ));

        driver.close().await;
        driver.close().await;
        assert!(matches!(driver.initialize(), Err(DriverError::Stopped(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_initialize_stops_driver() {
        let collector = Arc::new(ScriptedCollector::new(1));
        let driver = driver(collector.clone(), Arc::new(FakeClient::new(FailMode::Never)));

        driver.close().await;
        assert!(!driver.is_running());
        assert!(matches!(driver.initialize(), Err(DriverError::Stopped(_))));

        advance(INTERVAL_SECS * 2 + 1).await;
        assert_eq!(collector.pull_count(), 0);
        driver.close().await;
    }

    #[test]
    fn test_initialize_outside_runtime_fails() {
        let driver = driver(
            Arc::new(ScriptedCollector::new(1)),
            Arc::new(FakeClient::new(FailMode::Never)),
        );
        assert!(matches!(
            driver.initialize(),
            Err(DriverError::NoRuntime(_))
        ));
    }
}
