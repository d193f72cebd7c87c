//! Export backend client trait
//!
//! Defines the interface for backend write APIs (CloudWatch, console, etc.)

use async_trait::async_trait;

use super::error::BackendError;
use super::profile::BackendProfile;
use super::record::BackendRecord;

/// Trait for export backends
///
/// All implementations must be thread-safe (Send + Sync) for use in async contexts.
/// A client performs exactly one backend write per `send` call and never retries;
/// the driver's next cycle is the retry.
#[async_trait]
pub trait ExportClient: Send + Sync {
    /// Capability table and request limits of this backend
    fn profile(&self) -> &'static BackendProfile;

    /// Write one chunk of records
    ///
    /// # Arguments
    /// * `namespace` - Backend destination (CloudWatch namespace, console prefix)
    /// * `records` - At most `profile().max_chunk_size` records
    async fn send(&self, namespace: &str, records: &[BackendRecord]) -> Result<(), BackendError>;
}
