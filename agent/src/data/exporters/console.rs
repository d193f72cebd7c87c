//! Console export backend
//!
//! Writes every record as one JSON line. Used for local debugging and for
//! running the agent without cloud credentials.

use std::io::Write;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use super::client::ExportClient;
use super::error::BackendError;
use super::profile::{BackendProfile, KindSupport};
use super::record::BackendRecord;
use crate::domain::metrics::MetricKind;

/// Histograms are expanded into `_count`, `_sum` and cumulative `_bucket`
/// records (Prometheus naming, `le` dimension per bucket).
pub static CONSOLE_PROFILE: BackendProfile = BackendProfile {
    name: "console",
    max_chunk_size: 500,
    kinds: &[
        (MetricKind::Counter, KindSupport::Value),
        (MetricKind::Gauge, KindSupport::Value),
        (MetricKind::Histogram, KindSupport::ExpandBuckets),
    ],
};

#[derive(Serialize)]
struct ConsoleLine<'a> {
    namespace: &'a str,
    #[serde(flatten)]
    record: &'a BackendRecord,
}

/// Writes are synchronous and run on the calling task. The lock is held
/// for a whole chunk (at most 500 lines), so chunks from drivers sharing a
/// writer never interleave.
pub struct ConsoleExporter {
    writer: Mutex<Box<dyn Write + Send>>,
    pretty: bool,
}

impl ConsoleExporter {
    pub fn stdout(pretty: bool) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), pretty)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            pretty,
        }
    }
}

#[async_trait]
impl ExportClient for ConsoleExporter {
    fn profile(&self) -> &'static BackendProfile {
        &CONSOLE_PROFILE
    }

    async fn send(&self, namespace: &str, records: &[BackendRecord]) -> Result<(), BackendError> {
        let mut writer = self.writer.lock();
        for record in records {
            let line = ConsoleLine { namespace, record };
            if self.pretty {
                serde_json::to_writer_pretty(&mut *writer, &line)?;
            } else {
                serde_json::to_writer(&mut *writer, &line)?;
            }
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
