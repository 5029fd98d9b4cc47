//! In-memory `WorkersApi` double that records every call.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ApiError, AuthorizationToken, BatchPayload, DeploymentRequest, UploadBatchResponse,
    UploadSessionResponse, WorkersApi,
};
use crate::assets::Manifest;
use crate::error::ProtocolError;

/// A call observed by `MockApi`, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateUploadSession {
        account_id: String,
        script_name: String,
        manifest: Manifest,
    },
    UploadBatch {
        account_id: String,
        token: String,
        payload: BatchPayload,
    },
    UpdateScript {
        account_id: String,
        request: DeploymentRequest,
    },
}

#[derive(Default)]
pub(crate) struct MockApi {
    session: UploadSessionResponse,
    batch_tokens: Mutex<VecDeque<Option<String>>>,
    reject_session: bool,
    reject_update: bool,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    /// Service that already holds every asset.
    pub(crate) fn up_to_date() -> Self {
        Self::with_session("session-jwt", Vec::new())
    }

    pub(crate) fn with_session(jwt: &str, buckets: Vec<Vec<String>>) -> Self {
        Self {
            session: UploadSessionResponse {
                jwt: jwt.to_string(),
                buckets: Some(buckets),
            },
            ..Self::default()
        }
    }

    /// Tokens returned by successive upload-batch calls.
    pub(crate) fn batch_tokens(self, tokens: Vec<Option<&str>>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| t.map(str::to_string))
            .collect();
        Self {
            batch_tokens: Mutex::new(tokens),
            ..self
        }
    }

    pub(crate) fn rejecting_session(self) -> Self {
        Self {
            reject_session: true,
            ..self
        }
    }

    pub(crate) fn rejecting_update(self) -> Self {
        Self {
            reject_update: true,
            ..self
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn uploads(&self) -> Vec<(String, BatchPayload)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UploadBatch { token, payload, .. } => Some((token, payload)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn updates(&self) -> Vec<DeploymentRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateScript { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn rejected(operation: &'static str) -> ProtocolError {
    ApiError {
        operation,
        http_status: 400,
        errors: Vec::new(),
    }
    .into()
}

#[async_trait]
impl WorkersApi for MockApi {
    async fn create_upload_session(
        &self,
        account_id: &str,
        script_name: &str,
        manifest: &Manifest,
    ) -> Result<UploadSessionResponse, ProtocolError> {
        self.record(Call::CreateUploadSession {
            account_id: account_id.to_string(),
            script_name: script_name.to_string(),
            manifest: manifest.clone(),
        });
        if self.reject_session {
            return Err(rejected("create-upload-session"));
        }
        Ok(self.session.clone())
    }

    async fn upload_batch(
        &self,
        account_id: &str,
        token: &AuthorizationToken,
        payload: BatchPayload,
    ) -> Result<UploadBatchResponse, ProtocolError> {
        self.record(Call::UploadBatch {
            account_id: account_id.to_string(),
            token: token.as_str().to_string(),
            payload,
        });
        let jwt = self.batch_tokens.lock().unwrap().pop_front().flatten();
        Ok(UploadBatchResponse { jwt })
    }

    async fn update_script(
        &self,
        account_id: &str,
        request: DeploymentRequest,
    ) -> Result<(), ProtocolError> {
        self.record(Call::UpdateScript {
            account_id: account_id.to_string(),
            request,
        });
        if self.reject_update {
            return Err(rejected("update-script"));
        }
        Ok(())
    }
}
