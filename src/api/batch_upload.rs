use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::debug;

use super::client::{ApiClient, UPLOAD_TIMEOUT_SECS};
use super::http::send;
use super::token::AuthorizationToken;
use super::types::{BatchPayload, UploadBatchResponse};
use crate::error::ProtocolError;

const OPERATION: &str = "upload-batch";

impl ApiClient {
    /// Upload one batch of base64-encoded assets under a session token.
    ///
    /// Each fingerprint becomes one multipart field. The account API token is
    /// not sent; the session token is the only credential.
    pub async fn upload_batch(
        &self,
        account_id: &str,
        token: &AuthorizationToken,
        payload: BatchPayload,
    ) -> Result<UploadBatchResponse, ProtocolError> {
        let mut url = self.endpoint(&["accounts", account_id, "workers", "assets", "upload"]);
        url.query_pairs_mut().append_pair("base64", "true");
        debug!("Uploading batch of {} assets", payload.len());

        let form = payload
            .files
            .into_iter()
            .fold(Form::new(), |form, (fingerprint, encoded)| {
                let part = Part::text(encoded).file_name(fingerprint.clone());
                form.part(fingerprint, part)
            });

        let request = self
            .request(Method::POST, url, token.as_str(), UPLOAD_TIMEOUT_SECS)
            .multipart(form);

        Ok(send(OPERATION, request).await?.unwrap_or_default())
    }
}
