//! Metric model and collection
//!
//! - `model` - Counter / Gauge / Histogram measurements and snapshots
//! - `collector` - Collector contract consumed by drivers
//! - `stats` - Per-driver export statistics
//! - `agent` - Self-collector reporting agent uptime and driver statistics

mod agent;
mod collector;
mod model;
mod stats;

pub use agent::{
    AgentCollector, DRIVER_LABEL, METRIC_CHUNKS_SENT, METRIC_CONSECUTIVE_FAILURES,
    METRIC_CYCLE_DURATION, METRIC_CYCLES, METRIC_FAILED_CYCLES, METRIC_RECORDS_SENT,
    METRIC_UPTIME,
};
pub use collector::{CollectionError, Collector};
pub use model::{Bucket, HistogramMetric, Labels, Metric, MetricKind, ScalarMetric, Snapshot};
pub use stats::{CYCLE_DURATION_BUCKETS_SECS, DriverStats, DriverStatsSnapshot};
