//! Domain logic for metrics export
//!
//! - `metrics` - Metric model, collector contract and driver statistics
//! - `drivers` - Push drivers and the mapping/batching stages they run

pub mod drivers;
pub mod metrics;

pub use drivers::{MetricsDriver, PushDriver};
pub use metrics::{Collector, Snapshot};
