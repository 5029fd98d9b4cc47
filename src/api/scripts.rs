use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::IgnoredAny;
use tracing::debug;

use super::client::{ApiClient, UPLOAD_TIMEOUT_SECS};
use super::http::send;
use super::types::{DeploymentRequest, ScriptMetadata, MODULE_CONTENT_TYPE};
use crate::error::ProtocolError;

const OPERATION: &str = "update-script";

/// Loggable summary of `metadata`; the completion token is reported only as present or absent.
fn describe_metadata(metadata: &ScriptMetadata) -> String {
    format!(
        "main_module={:?} compatibility_date={} bindings={} assets={} jwt={} keep_assets={:?}",
        metadata.main_module,
        metadata.compatibility_date,
        metadata.bindings.as_ref().map_or(0, Vec::len),
        metadata.assets.is_some(),
        if metadata.assets.as_ref().is_some_and(|a| a.jwt.is_some()) {
            "[REDACTED]"
        } else {
            "none"
        },
        metadata.keep_assets
    )
}

impl ApiClient {
    /// Upload the script module and its metadata.
    pub async fn update_script(
        &self,
        account_id: &str,
        request: DeploymentRequest,
    ) -> Result<(), ProtocolError> {
        let url = self.endpoint(&[
            "accounts",
            account_id,
            "workers",
            "scripts",
            &request.script_name,
        ]);

        let metadata = serde_json::to_string(&request.metadata).map_err(|source| {
            ProtocolError::Encode {
                operation: OPERATION,
                source,
            }
        })?;
        debug!("Script metadata: {}", describe_metadata(&request.metadata));

        let transport = |source: reqwest::Error| ProtocolError::Transport {
            operation: OPERATION,
            source,
        };
        let metadata_part = Part::text(metadata)
            .mime_str("application/json")
            .map_err(transport)?;
        let module_name = request.module.name;
        let module_part = Part::bytes(request.module.content)
            .file_name(module_name.clone())
            .mime_str(MODULE_CONTENT_TYPE)
            .map_err(transport)?;

        let form = Form::new()
            .part("metadata", metadata_part)
            .part(module_name, module_part);

        let request = self
            .request(Method::PUT, url, &self.api_token, UPLOAD_TIMEOUT_SECS)
            .multipart(form);

        send::<IgnoredAny>(OPERATION, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssetsMetadata, Binding};
    use crate::config::AssetServingConfig;

    #[test]
    fn test_describe_metadata_hides_completion_token() {
        let metadata = ScriptMetadata {
            main_module: Some("index.js".to_string()),
            compatibility_date: "2024-09-23".to_string(),
            bindings: Some(vec![Binding::Assets {
                name: "ASSETS".to_string(),
            }]),
            assets: Some(AssetsMetadata {
                config: AssetServingConfig::default(),
                jwt: Some("SECRET-COMPLETION-JWT".to_string()),
            }),
            keep_assets: Some(false),
        };

        let summary = describe_metadata(&metadata);
        assert!(!summary.contains("SECRET-COMPLETION-JWT"));
        assert!(summary.contains("jwt=[REDACTED]"));
        assert!(summary.contains("keep_assets=Some(false)"));
    }

    #[test]
    fn test_describe_metadata_without_assets() {
        let metadata = ScriptMetadata {
            main_module: Some("index.js".to_string()),
            compatibility_date: "2024-09-23".to_string(),
            bindings: None,
            assets: None,
            keep_assets: None,
        };
        assert!(describe_metadata(&metadata).contains("jwt=none"));
    }
}
