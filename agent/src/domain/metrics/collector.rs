//! Collector contract
//!
//! The collector is owned by the host application. Drivers only pull from it.

use async_trait::async_trait;
use thiserror::Error;

use super::model::Snapshot;

/// Snapshot pull failed
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Collector '{source_name}' failed: {message}")]
    Source {
        source_name: String,
        message: String,
    },
}

impl CollectionError {
    pub fn failed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Produces metric snapshots on demand
///
/// Implementations must tolerate repeated and concurrent calls from several
/// drivers without mutating their own collection state.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn collect(&self) -> Result<Snapshot, CollectionError>;
}
