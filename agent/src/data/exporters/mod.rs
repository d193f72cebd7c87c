//! Export backends
//!
//! - `client` - `ExportClient` trait implemented by every backend
//! - `profile` - Per-backend capability tables and request limits
//! - `record` - Backend-ready record shape
//! - `cloudwatch` - AWS CloudWatch `PutMetricData`
//! - `console` - JSON lines on stdout

mod client;
mod cloudwatch;
mod console;
mod error;
mod profile;
mod record;

pub use client::ExportClient;
pub use cloudwatch::{CLOUDWATCH_PROFILE, CloudwatchExporter};
pub use console::{CONSOLE_PROFILE, ConsoleExporter};
pub use error::BackendError;
pub use profile::{BackendProfile, KindSupport};
pub use record::{BackendRecord, Dimension};
