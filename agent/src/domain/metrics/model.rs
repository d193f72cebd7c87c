//! Metric model consumed by drivers
//!
//! A snapshot is an ordered list of typed, labeled measurements produced by a
//! [`Collector`](super::Collector) at pull time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Label set attached to a metric (unique keys, iterated in key order)
pub type Labels = BTreeMap<String, String>;

/// Kind of a metric, used as the key of backend capability tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
        }
    }
}

/// Counter or gauge measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarMetric {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    pub value: f64,
}

/// Histogram bucket (cumulative count of samples <= upper_bound)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

/// Histogram measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramMetric {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
    pub sample_count: u64,
    pub sample_sum: f64,
    /// Ordered by ascending upper bound
    pub buckets: Vec<Bucket>,
}

/// A single measurement in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    Counter(ScalarMetric),
    Gauge(ScalarMetric),
    Histogram(HistogramMetric),
}

impl Metric {
    pub fn counter(name: impl Into<String>, value: f64) -> Self {
        Self::Counter(ScalarMetric {
            name: name.into(),
            labels: Labels::new(),
            value,
        })
    }

    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Self::Gauge(ScalarMetric {
            name: name.into(),
            labels: Labels::new(),
            value,
        })
    }

    pub fn histogram(
        name: impl Into<String>,
        sample_count: u64,
        sample_sum: f64,
        buckets: Vec<Bucket>,
    ) -> Self {
        Self::Histogram(HistogramMetric {
            name: name.into(),
            labels: Labels::new(),
            sample_count,
            sample_sum,
            buckets,
        })
    }

    /// Add a label, replacing any existing value for the key
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels_mut().insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::Histogram(_) => MetricKind::Histogram,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Counter(m) | Self::Gauge(m) => &m.name,
            Self::Histogram(h) => &h.name,
        }
    }

    pub fn labels(&self) -> &Labels {
        match self {
            Self::Counter(m) | Self::Gauge(m) => &m.labels,
            Self::Histogram(h) => &h.labels,
        }
    }

    fn labels_mut(&mut self) -> &mut Labels {
        match self {
            Self::Counter(m) | Self::Gauge(m) => &mut m.labels,
            Self::Histogram(h) => &mut h.labels,
        }
    }
}

/// Metrics produced by one collection pull
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    metrics: Vec<Metric>,
}

impl Snapshot {
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }
}

impl From<Vec<Metric>> for Snapshot {
    fn from(metrics: Vec<Metric>) -> Self {
        Self::new(metrics)
    }
}

impl FromIterator<Metric> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_as_str() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Gauge.as_str(), "gauge");
        assert_eq!(MetricKind::Histogram.as_str(), "histogram");
    }

    #[test]
    fn test_with_label_replaces_existing_key() {
        let metric = Metric::gauge("tps", 19.8)
            .with_label("world", "nether")
            .with_label("world", "overworld");

        assert_eq!(metric.labels().len(), 1);
        assert_eq!(metric.labels().get("world").unwrap(), "overworld");
    }

    #[test]
    fn test_accessors_cover_all_kinds() {
        let histogram = Metric::histogram("tick_duration", 3, 1.5, Vec::new());
        assert_eq!(histogram.kind(), MetricKind::Histogram);
        assert_eq!(histogram.name(), "tick_duration");
        assert_eq!(Metric::counter("joins", 1.0).kind(), MetricKind::Counter);
    }

    #[test]
    fn test_metric_serde_tagged() {
        let json = r#"{ "type": "counter", "name": "chunks_loaded", "value": 42.0 }"#;
        let metric: Metric = serde_json::from_str(json).unwrap();

        assert_eq!(metric, Metric::counter("chunks_loaded", 42.0));
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let snapshot: Snapshot = vec![
            Metric::gauge("b", 1.0),
            Metric::gauge("a", 2.0),
            Metric::counter("c", 3.0),
        ]
        .into();

        let names: Vec<&str> = snapshot.iter().map(Metric::name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
    }
}
