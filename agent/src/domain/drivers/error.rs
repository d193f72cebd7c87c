//! Driver error types

use thiserror::Error;

use crate::data::exporters::BackendError;
use crate::domain::metrics::CollectionError;

/// A snapshot could not be translated into backend records.
///
/// Current mapping policy drops what it cannot map, so nothing raises this
/// yet. It keeps the cycle's error surface stable for stricter mappers.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Metric '{name}' could not be mapped: {reason}")]
    Unmappable { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Driver '{0}' is already running")]
    AlreadyStarted(String),

    #[error("Driver '{0}' has been stopped and cannot be restarted")]
    Stopped(String),

    #[error("Driver '{0}' requires a running Tokio runtime")]
    NoRuntime(String),

    #[error("Unknown driver '{name}'. Available drivers: {available}")]
    UnknownDriver { name: String, available: String },

    #[error("Driver '{driver}' is not configured: {message}")]
    NotConfigured { driver: String, message: String },
}
