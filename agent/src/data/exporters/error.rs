//! Export backend error types

use thiserror::Error;

/// A write call to an export backend failed
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{backend} throttled the request: {message}")]
    Throttled {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} rejected the request: {message}")]
    Rejected {
        backend: &'static str,
        message: String,
    },

    #[error("{backend} transport error: {message}")]
    Transport {
        backend: &'static str,
        message: String,
    },

    #[error("Chunk of {len} records exceeds {backend} limit of {max}")]
    ChunkTooLarge {
        backend: &'static str,
        len: usize,
        max: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    pub fn rejected(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            backend,
            message: message.into(),
        }
    }

    pub fn transport(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            backend,
            message: message.into(),
        }
    }
}
