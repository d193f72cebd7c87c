//! Driver lifecycle contract

use async_trait::async_trait;

use super::error::DriverError;

/// Host-facing lifecycle of an export driver.
///
/// A driver runs at most once: `initialize` starts its background loop and
/// `close` stops it for good. Both are safe to call from any task.
#[async_trait]
pub trait MetricsDriver: Send + Sync {
    fn name(&self) -> &str;

    /// Start the export loop and return immediately.
    ///
    /// Errors only on lifecycle misuse. Export failures never surface here.
    fn initialize(&self) -> Result<(), DriverError>;

    /// Stop the loop. No backend write starts after this returns.
    ///
    /// Idempotent. The driver is terminal afterwards, even if it was never started.
    async fn close(&self);
}
