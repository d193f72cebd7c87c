//! Backend-ready record produced by the payload mapper

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Key/value annotation attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single value reshaped for a backend write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendRecord {
    pub metric_name: String,
    pub value: f64,
    /// Base dimensions first, then metric labels
    pub dimensions: Vec<Dimension>,
    /// Whole seconds, UTC
    pub timestamp: DateTime<Utc>,
}
