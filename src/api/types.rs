//! API request and response types for the Workers REST endpoints.
//!
//! Every response is wrapped in the v4 envelope
//! (`success`, `errors`, `messages`, `result`); the envelope itself is
//! private to the `api` module.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::assets::Manifest;
use crate::config::AssetServingConfig;

/// Response envelope shared by all endpoints
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
}

/// Single error or informational message from an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

// ============================================================================
// Asset upload session
// ============================================================================

/// Create-upload-session request body
#[derive(Debug, Serialize)]
pub(super) struct CreateUploadSessionRequest<'a> {
    pub manifest: &'a Manifest,
}

/// Create-upload-session result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadSessionResponse {
    /// Authorization token for the batch uploads of this session
    pub jwt: String,
    /// Fingerprints the service still needs, grouped into upload batches
    #[serde(default)]
    pub buckets: Option<Vec<Vec<String>>>,
}

/// Content for one upload-batch call: fingerprint -> base64 file bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPayload {
    pub files: BTreeMap<String, String>,
}

impl BatchPayload {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Upload-batch result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadBatchResponse {
    /// Set once the service holds every fingerprint of the session
    #[serde(default)]
    pub jwt: Option<String>,
}

// ============================================================================
// Script update
// ============================================================================

/// Name of the uploaded module part
pub const MODULE_NAME: &str = "index.js";

/// Content type of the uploaded module part
pub const MODULE_CONTENT_TYPE: &str = "application/javascript+module";

/// Binding declared on the script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Binding {
    Assets { name: String },
}

/// `assets` section of the script metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetsMetadata {
    pub config: AssetServingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

/// Metadata part of the script-update request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_module: Option<String>,
    pub compatibility_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<Vec<Binding>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_assets: Option<bool>,
}

/// Script module uploaded alongside the metadata
#[derive(Clone, PartialEq, Eq)]
pub struct ScriptModule {
    pub name: String,
    pub content: Vec<u8>,
}

impl ScriptModule {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            name: MODULE_NAME.to_string(),
            content,
        }
    }
}

impl fmt::Debug for ScriptModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptModule")
            .field("name", &self.name)
            .field("len", &self.content.len())
            .finish()
    }
}

/// Fully assembled script-update request
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRequest {
    pub script_name: String,
    pub metadata: ScriptMetadata,
    pub module: ScriptModule,
}

// ============================================================================
// Errors
// ============================================================================

/// Rejection reported by the service
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Operation that was rejected
    pub operation: &'static str,
    /// HTTP status code
    pub http_status: u16,
    /// Errors listed in the response envelope
    pub errors: Vec<ApiMessage>,
}

impl ApiError {
    /// Whether the API token was refused
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.http_status, 401 | 403)
    }

    /// Hint shown to the user for this error
    pub fn user_hint(&self) -> Option<&'static str> {
        if self.is_unauthorized() {
            Some("check that the API token is valid and has Workers Scripts edit permission")
        } else {
            None
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rejected (HTTP {})", self.operation, self.http_status)?;
        for (i, err) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}[{}] {}", sep, err.code, err.message)?;
        }
        if let Some(hint) = self.user_hint() {
            write!(f, " ({})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
