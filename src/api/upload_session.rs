use reqwest::Method;
use tracing::debug;

use super::client::{ApiClient, DEFAULT_TIMEOUT_SECS};
use super::http::send;
use super::types::{CreateUploadSessionRequest, UploadSessionResponse};
use crate::assets::Manifest;
use crate::error::ProtocolError;

const OPERATION: &str = "create-upload-session";

impl ApiClient {
    /// Submit the asset manifest and learn which fingerprints must be uploaded.
    pub async fn create_upload_session(
        &self,
        account_id: &str,
        script_name: &str,
        manifest: &Manifest,
    ) -> Result<UploadSessionResponse, ProtocolError> {
        let url = self.endpoint(&[
            "accounts",
            account_id,
            "workers",
            "scripts",
            script_name,
            "assets-upload-session",
        ]);
        debug!("Submitting manifest with {} entries", manifest.len());

        let request = self
            .request(Method::POST, url, &self.api_token, DEFAULT_TIMEOUT_SECS)
            .json(&CreateUploadSessionRequest { manifest });

        send(OPERATION, request)
            .await?
            .ok_or(ProtocolError::MissingResult {
                operation: OPERATION,
            })
    }
}
