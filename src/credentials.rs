//! Credential resolution.
//!
//! Explicit caller values win; anything left unset is looked up through a
//! `CredentialProvider`. The default provider reads the process environment.

use std::collections::HashMap;

use tracing::debug;

use crate::api::DEFAULT_API_BASE_URL;
use crate::config::DeployOptions;
use crate::error::{DeployError, Result};

/// Environment variable holding the API token
pub const API_TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Environment variable holding the account identifier
pub const ACCOUNT_ID_ENV: &str = "CLOUDFLARE_ACCOUNT_ID";

/// Environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "CLOUDFLARE_API_BASE_URL";

/// Key-value lookup used as the credential fallback.
pub trait CredentialProvider {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads credentials from environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl CredentialProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Resolved credentials for one deploy.
#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
    pub account_id: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"[REDACTED]")
            .field("account_id", &self.account_id)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn pick<P>(explicit: Option<&String>, provider: &P, name: &str) -> Option<String>
where
    P: CredentialProvider + ?Sized,
{
    non_empty(explicit.cloned()).or_else(|| {
        let value = non_empty(provider.get(name));
        if value.is_some() {
            debug!("Using {} from credential provider", name);
        }
        value
    })
}

impl Credentials {
    /// Resolve credentials from `options`, falling back to `provider`.
    ///
    /// Fails if the API token or the account id is still missing.
    pub fn resolve<P>(options: &DeployOptions, provider: &P) -> Result<Self>
    where
        P: CredentialProvider + ?Sized,
    {
        let api_token = pick(options.api_token.as_ref(), provider, API_TOKEN_ENV);
        let account_id = pick(options.account_id.as_ref(), provider, ACCOUNT_ID_ENV);
        let api_base_url = pick(options.api_base_url.as_ref(), provider, API_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        match (api_token, account_id) {
            (Some(api_token), Some(account_id)) => Ok(Self {
                api_token,
                account_id,
                api_base_url,
            }),
            (api_token, account_id) => {
                let missing: Vec<&str> = [
                    api_token.is_none().then_some(API_TOKEN_ENV),
                    account_id.is_none().then_some(ACCOUNT_ID_ENV),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(DeployError::config(format!(
                    "missing credentials: set {} or pass them explicitly",
                    missing.join(" and ")
                )))
            }
        }
    }
}
