//! Export client adapter
//!
//! Binds an [`ExportClient`] to a namespace and enforces the backend's
//! per-request limit before any bytes go out.

use std::sync::Arc;

use crate::data::exporters::{BackendError, BackendProfile, BackendRecord, ExportClient};

pub struct ExportAdapter {
    client: Arc<dyn ExportClient>,
    namespace: String,
}

impl ExportAdapter {
    pub fn new(client: Arc<dyn ExportClient>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn profile(&self) -> &'static BackendProfile {
        self.client.profile()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Issue exactly one backend write for the chunk
    pub async fn send_chunk(&self, chunk: &[BackendRecord]) -> Result<(), BackendError> {
        let profile = self.profile();
        if chunk.len() > profile.max_chunk_size {
            return Err(BackendError::ChunkTooLarge {
                backend: profile.name,
                len: chunk.len(),
                max: profile.max_chunk_size,
            });
        }
        self.client.send(&self.namespace, chunk).await
    }
}
