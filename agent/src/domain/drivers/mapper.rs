//! Payload mapping
//!
//! Pure translation from a snapshot into backend records, driven by the
//! backend's capability table.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use super::error::MappingError;
use crate::data::exporters::{BackendProfile, BackendRecord, Dimension, KindSupport};
use crate::domain::metrics::{HistogramMetric, Labels, Metric, Snapshot};

/// Dimension added to expanded histogram bucket records
pub const BUCKET_BOUND_DIMENSION: &str = "le";

/// Source of mapping timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock truncated to whole seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0)
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct PayloadMapper {
    base_dimensions: Vec<Dimension>,
    profile: &'static BackendProfile,
    clock: Arc<dyn Clock>,
}

impl PayloadMapper {
    pub fn new(
        base_dimensions: Vec<Dimension>,
        profile: &'static BackendProfile,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            base_dimensions,
            profile,
            clock,
        }
    }

    /// Map every supported metric in snapshot order.
    ///
    /// All records of one call share a single timestamp taken at mapping time.
    pub fn map_snapshot(&self, snapshot: &Snapshot) -> Result<Vec<BackendRecord>, MappingError> {
        let timestamp = self.clock.now();
        let mut records = Vec::with_capacity(snapshot.len());

        for metric in snapshot {
            if metric.name().is_empty() {
                tracing::trace!(kind = metric.kind().as_str(), "Skipping metric without a name");
                continue;
            }

            match (self.profile.support(metric.kind()), metric) {
                (KindSupport::Value, Metric::Counter(m) | Metric::Gauge(m)) => {
                    records.push(self.record(&m.name, m.value, &m.labels, timestamp));
                }
                (KindSupport::ExpandBuckets, Metric::Histogram(h)) => {
                    self.expand_histogram(h, timestamp, &mut records);
                }
                (support, metric) => {
                    tracing::trace!(
                        backend = self.profile.name,
                        metric = metric.name(),
                        kind = metric.kind().as_str(),
                        ?support,
                        "Metric kind not exported by backend"
                    );
                }
            }
        }

        Ok(records)
    }

    fn dimensions(&self, labels: &Labels) -> Vec<Dimension> {
        let mut dimensions = Vec::with_capacity(self.base_dimensions.len() + labels.len());
        dimensions.extend(self.base_dimensions.iter().cloned());
        dimensions.extend(labels.iter().map(|(k, v)| Dimension::new(k, v)));
        dimensions
    }

    fn record(
        &self,
        name: &str,
        value: f64,
        labels: &Labels,
        timestamp: DateTime<Utc>,
    ) -> BackendRecord {
        BackendRecord {
            metric_name: name.to_string(),
            value,
            dimensions: self.dimensions(labels),
            timestamp,
        }
    }

    fn expand_histogram(
        &self,
        histogram: &HistogramMetric,
        timestamp: DateTime<Utc>,
        out: &mut Vec<BackendRecord>,
    ) {
        let name = &histogram.name;
        out.push(self.record(
            &format!("{name}_count"),
            histogram.sample_count as f64,
            &histogram.labels,
            timestamp,
        ));
        out.push(self.record(
            &format!("{name}_sum"),
            histogram.sample_sum,
            &histogram.labels,
            timestamp,
        ));

        let bucket_name = format!("{name}_bucket");
        for bucket in &histogram.buckets {
            let mut record = self.record(
                &bucket_name,
                bucket.cumulative_count as f64,
                &histogram.labels,
                timestamp,
            );
            record.dimensions.push(Dimension::new(
                BUCKET_BOUND_DIMENSION,
                format_bound(bucket.upper_bound),
            ));
            out.push(record);
        }
    }
}

fn format_bound(bound: f64) -> String {
    if bound.is_infinite() && bound.is_sign_positive() {
        "+Inf".to_string()
    } else {
        bound.to_string()
    }
}
