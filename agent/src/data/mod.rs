//! Data export layer
//!
//! - `exporters` - Backend clients, capability tables and record shapes

pub mod exporters;

pub use exporters::{BackendError, ExportClient};
