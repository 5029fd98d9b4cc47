use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::types::{ApiError, ApiMessage, Envelope};
use crate::error::ProtocolError;

/// Longest slice of a non-JSON error body kept in an `ApiError`.
const MAX_RAW_ERROR_LEN: usize = 512;

/// Send a request once and unwrap the response envelope.
///
/// Returns the envelope's `result`, which may legitimately be absent.
pub(super) async fn send<T>(
    operation: &'static str,
    request: RequestBuilder,
) -> Result<Option<T>, ProtocolError>
where
    T: DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|source| ProtocolError::Transport { operation, source })?;

    let status = response.status();
    debug!("=== {} response ===", operation);
    debug!("Status: {}", status);

    let body = response
        .text()
        .await
        .map_err(|source| ProtocolError::Transport { operation, source })?;

    let decoded = decode_envelope(operation, status.as_u16(), &body);
    if let Err(ProtocolError::Api(api_error)) = &decoded {
        error!("{}", api_error);
    }
    decoded
}

/// Interpret a response body according to its HTTP status.
pub(super) fn decode_envelope<T>(
    operation: &'static str,
    http_status: u16,
    body: &str,
) -> Result<Option<T>, ProtocolError>
where
    T: DeserializeOwned,
{
    if !(200..300).contains(&http_status) {
        return Err(ApiError {
            operation,
            http_status,
            errors: error_messages(body),
        }
        .into());
    }

    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|source| ProtocolError::Decode { operation, source })?;

    if envelope.success == Some(false) {
        return Err(ApiError {
            operation,
            http_status,
            errors: envelope.errors,
        }
        .into());
    }

    Ok(envelope.result)
}

fn error_messages(body: &str) -> Vec<ApiMessage> {
    if let Ok(envelope) = serde_json::from_str::<Envelope<serde::de::IgnoredAny>>(body) {
        if !envelope.errors.is_empty() {
            return envelope.errors;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let message: String = trimmed.chars().take(MAX_RAW_ERROR_LEN).collect();
    vec![ApiMessage { code: 0, message }]
}
