//! Backend capability tables
//!
//! Each backend declares how every metric kind is exported. Kinds missing from
//! a table are dropped, so new kinds stay invisible to backends until they opt in.

use crate::domain::metrics::MetricKind;

/// Export policy for one metric kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindSupport {
    /// One record carrying the scalar value (counters, gauges)
    Value,
    /// `_count`, `_sum` and one `_bucket` record per bucket with an `le` dimension
    ExpandBuckets,
    /// Silently excluded
    Drop,
}

/// Static description of a backend's limits and metric support
#[derive(Debug)]
pub struct BackendProfile {
    pub name: &'static str,
    /// Maximum records per write request
    pub max_chunk_size: usize,
    pub kinds: &'static [(MetricKind, KindSupport)],
}

impl BackendProfile {
    pub fn support(&self, kind: MetricKind) -> KindSupport {
        self.kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, support)| *support)
            .unwrap_or(KindSupport::Drop)
    }
}
