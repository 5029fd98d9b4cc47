//! Error types for the deploy pipeline.
//!
//! Every failure aborts the deploy. Nothing here is retried or recovered;
//! callers see exactly one of the three kinds below.

use std::path::PathBuf;

use crate::api::ApiError;

/// Result alias used across the crate.
pub type Result<T, E = DeployError> = std::result::Result<T, E>;

/// Top-level deploy failure.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing credentials or an unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote service rejected a request or broke the upload protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DeployError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

/// Failures talking to the remote service.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{operation} response did not include a result")]
    MissingResult { operation: &'static str },

    #[error("upload session requested unknown fingerprint {0}")]
    UnknownFingerprint(String),

    #[error("fingerprint {0} appears in more than one upload batch")]
    DuplicateFingerprint(String),

    #[error("no completion token received after uploading {batches} batch(es)")]
    MissingCompletionToken { batches: usize },
}
