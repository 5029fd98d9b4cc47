//! Client for the Workers REST API.
//!
//! `WorkersApi` is the seam between the deploy pipeline and the network:
//! the pipeline only ever talks to this trait, `ApiClient` implements it over
//! HTTP, and tests substitute an in-memory double.

mod batch_upload;
mod client;
mod http;
#[cfg(test)]
pub(crate) mod mock;
mod scripts;
mod token;
mod types;
mod upload_session;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use token::{AuthorizationToken, CompletionToken};
pub use types::{
    ApiError, ApiMessage, AssetsMetadata, BatchPayload, Binding, DeploymentRequest,
    ScriptMetadata, ScriptModule, UploadBatchResponse, UploadSessionResponse, MODULE_CONTENT_TYPE,
    MODULE_NAME,
};

use async_trait::async_trait;

use crate::assets::Manifest;
use crate::error::ProtocolError;

/// Remote operations used by a deploy.
#[async_trait]
pub trait WorkersApi: Send + Sync {
    /// Submit the manifest for `script_name` and receive the upload session.
    async fn create_upload_session(
        &self,
        account_id: &str,
        script_name: &str,
        manifest: &Manifest,
    ) -> Result<UploadSessionResponse, ProtocolError>;

    /// Upload one batch of assets using the session's token as bearer.
    async fn upload_batch(
        &self,
        account_id: &str,
        token: &AuthorizationToken,
        payload: BatchPayload,
    ) -> Result<UploadBatchResponse, ProtocolError>;

    /// Replace the script with the assembled request.
    async fn update_script(
        &self,
        account_id: &str,
        request: DeploymentRequest,
    ) -> Result<(), ProtocolError>;
}

#[async_trait]
impl WorkersApi for ApiClient {
    async fn create_upload_session(
        &self,
        account_id: &str,
        script_name: &str,
        manifest: &Manifest,
    ) -> Result<UploadSessionResponse, ProtocolError> {
        ApiClient::create_upload_session(self, account_id, script_name, manifest).await
    }

    async fn upload_batch(
        &self,
        account_id: &str,
        token: &AuthorizationToken,
        payload: BatchPayload,
    ) -> Result<UploadBatchResponse, ProtocolError> {
        ApiClient::upload_batch(self, account_id, token, payload).await
    }

    async fn update_script(
        &self,
        account_id: &str,
        request: DeploymentRequest,
    ) -> Result<(), ProtocolError> {
        ApiClient::update_script(self, account_id, request).await
    }
}
