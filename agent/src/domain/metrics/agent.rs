//! Agent self-collector
//!
//! Reports the agent's own uptime and the export statistics of every
//! registered driver. Used by the `unimetrics` binary; embedding hosts supply
//! their own [`Collector`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::collector::{CollectionError, Collector};
use super::model::{HistogramMetric, Labels, Metric, Snapshot};
use super::stats::DriverStats;

pub const METRIC_UPTIME: &str = "unimetrics_uptime_seconds";
pub const METRIC_CYCLES: &str = "unimetrics_export_cycles_total";
pub const METRIC_FAILED_CYCLES: &str = "unimetrics_export_failed_cycles_total";
pub const METRIC_RECORDS_SENT: &str = "unimetrics_export_records_total";
pub const METRIC_CHUNKS_SENT: &str = "unimetrics_export_requests_total";
pub const METRIC_CONSECUTIVE_FAILURES: &str = "unimetrics_export_consecutive_failures";
pub const METRIC_CYCLE_DURATION: &str = "unimetrics_export_cycle_seconds";

/// Label carrying the driver name
pub const DRIVER_LABEL: &str = "driver";

pub struct AgentCollector {
    started_at: Instant,
    drivers: Vec<(String, Arc<DriverStats>)>,
}

impl AgentCollector {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            drivers: Vec::new(),
        }
    }

    /// Track the statistics of a driver under its name
    pub fn register(&mut self, driver: impl Into<String>, stats: Arc<DriverStats>) {
        self.drivers.push((driver.into(), stats));
    }

    fn driver_metrics(name: &str, stats: &DriverStats, out: &mut Vec<Metric>) {
        let s = stats.snapshot();
        let scalar = [
            Metric::counter(METRIC_CYCLES, s.cycles as f64),
            Metric::counter(METRIC_FAILED_CYCLES, s.failed_cycles as f64),
            Metric::counter(METRIC_RECORDS_SENT, s.records_sent as f64),
            Metric::counter(METRIC_CHUNKS_SENT, s.chunks_sent as f64),
            Metric::gauge(METRIC_CONSECUTIVE_FAILURES, s.consecutive_failures as f64),
        ];
        out.extend(
            scalar
                .into_iter()
                .map(|metric| metric.with_label(DRIVER_LABEL, name)),
        );

        let mut labels = Labels::new();
        labels.insert(DRIVER_LABEL.to_string(), name.to_string());
        out.push(Metric::Histogram(HistogramMetric {
            name: METRIC_CYCLE_DURATION.to_string(),
            labels,
            sample_count: s.duration_count,
            sample_sum: s.duration_sum_secs,
            buckets: s.duration_buckets,
        }));
    }
}

impl Default for AgentCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for AgentCollector {
    async fn collect(&self) -> Result<Snapshot, CollectionError> {
        let mut metrics = Vec::with_capacity(1 + self.drivers.len() * 6);
        metrics.push(Metric::gauge(
            METRIC_UPTIME,
            self.started_at.elapsed().as_secs() as f64,
        ));
        for (name, stats) in &self.drivers {
            Self::driver_metrics(name, stats, &mut metrics);
        }
        Ok(Snapshot::new(metrics))
    }
}
