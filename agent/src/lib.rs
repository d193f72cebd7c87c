//! Unimetrics agent
//!
//! Periodically pulls a metric snapshot from a host-supplied [`Collector`],
//! reshapes it for each enabled backend and pushes it in backend-sized
//! chunks. Hosts embed the library by building a [`PushDriver`] per backend;
//! the `unimetrics` binary wires the same drivers to its own agent collector.
//!
//! - `core` - CLI, configuration, logging, shutdown
//! - `domain` - Metric model, collectors and export drivers
//! - `data` - Export backends (CloudWatch, console)
//!
//! [`Collector`]: domain::metrics::Collector
//! [`PushDriver`]: domain::drivers::PushDriver

mod app;
pub mod core;
pub mod data;
pub mod domain;
