use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::credentials::Credentials;
use crate::error::{DeployError, Result};

/// Default API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4/";

/// Default request timeout in seconds
pub(super) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Timeout for requests that carry file contents (120 seconds)
pub(super) const UPLOAD_TIMEOUT_SECS: u64 = 120;

/// Crate version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    format!("workers-deploy/{}", DEFAULT_VERSION)
}

/// HTTP client for the Workers REST API.
///
/// Holds the account-level API token. Session tokens are passed per call and
/// never stored here.
pub struct ApiClient {
    client: Client,
    base_url: Url,
    pub(super) api_token: String,
}

impl ApiClient {
    /// Create a client for `base_url` authenticating with `api_token`.
    pub fn new(api_token: String, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DeployError::config(format!("invalid API base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DeployError::config(format!(
                "invalid API base URL {}: not a hierarchical URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(build_user_agent())
            .build()
            .map_err(|e| DeployError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token,
        })
    }

    /// Create a client from resolved credentials.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        Self::new(credentials.api_token.clone(), &credentials.api_base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(super) fn request(
        &self,
        method: Method,
        url: Url,
        bearer: &str,
        timeout_secs: u64,
    ) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!("=== API Request ===");
        debug!("{} {} (request id {})", method, url, request_id);

        self.client
            .request(method, url)
            .timeout(Duration::from_secs(timeout_secs))
            .bearer_auth(bearer)
            .header("x-request-id", request_id)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_agent() {
        let ua = build_user_agent();
        assert!(ua.starts_with("workers-deploy/"));
    }

    #[test]
    fn test_endpoint_with_and_without_trailing_slash() {
        let client = ApiClient::new("t".to_string(), "https://api.example.com/client/v4/").unwrap();
        let url = client.endpoint(&["accounts", "acc", "workers", "scripts", "my-worker"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.com/client/v4/accounts/acc/workers/scripts/my-worker"
        );

        let client = ApiClient::new("t".to_string(), "https://api.example.com/client/v4").unwrap();
        let url = client.endpoint(&["accounts", "acc"]);
        assert_eq!(url.as_str(), "https://api.example.com/client/v4/accounts/acc");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new("t".to_string(), DEFAULT_API_BASE_URL).unwrap();
        let url = client.endpoint(&["accounts", "a/b", "workers", "scripts", "x y"]);
        assert!(url.as_str().ends_with("/accounts/a%2Fb/workers/scripts/x%20y"));
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let err = ApiClient::new("t".to_string(), "not a url").unwrap_err();
        assert!(err.is_configuration());

        let err = ApiClient::new("t".to_string(), "mailto:ops@example.com").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ApiClient::new("secret-token-123".to_string(), DEFAULT_API_BASE_URL).unwrap();
        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret-token-123"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
