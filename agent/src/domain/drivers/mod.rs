//! Export drivers
//!
//! - `driver` - Lifecycle contract exposed to hosts
//! - `pipeline` - Push driver loop (collect, map, chunk, send)
//! - `mapper` - Snapshot to backend record translation
//! - `batcher` - Backend-sized chunking
//! - `export` - Namespace-bound export client adapter
//! - `registry` - Driver names and constructors

mod batcher;
mod driver;
mod error;
mod export;
mod mapper;
mod pipeline;
mod registry;

pub use batcher::batches;
pub use driver::MetricsDriver;
pub use error::{DriverError, MappingError};
pub use export::ExportAdapter;
pub use mapper::{BUCKET_BOUND_DIMENSION, Clock, FixedClock, PayloadMapper, SystemClock};
pub use pipeline::PushDriver;
pub use registry::{DriverKind, create_driver};
