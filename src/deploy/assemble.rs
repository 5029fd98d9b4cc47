//! Script-update request assembly.

use crate::api::{
    AssetsMetadata, Binding, CompletionToken, DeploymentRequest, ScriptMetadata, ScriptModule,
    MODULE_NAME,
};
use crate::config::{AssetsConfig, DeployConfig, DeployPlan};

fn assets_metadata(assets: &AssetsConfig, completion: Option<&CompletionToken>) -> AssetsMetadata {
    AssetsMetadata {
        config: assets.serving.clone(),
        jwt: completion.map(|t| t.as_str().to_string()),
    }
}

fn asset_bindings(assets: &AssetsConfig) -> Vec<Binding> {
    assets
        .binding
        .iter()
        .map(|name| Binding::Assets { name: name.clone() })
        .collect()
}

/// Build the script-update request for `plan`.
///
/// `script` is the module source for plans with a script. `completion` is
/// the token from the asset upload; without one the service is told to keep
/// the assets it already has. Returns `None` for `DeployPlan::Empty`.
pub fn assemble_request(
    config: &DeployConfig,
    plan: DeployPlan<'_>,
    script: Option<Vec<u8>>,
    completion: Option<CompletionToken>,
) -> Option<DeploymentRequest> {
    let compatibility_date = config.compatibility_date.clone();
    let keep_assets = Some(completion.is_none());

    let metadata = match plan {
        DeployPlan::Empty => return None,
        DeployPlan::ScriptOnly { .. } => ScriptMetadata {
            main_module: Some(MODULE_NAME.to_string()),
            compatibility_date,
            bindings: None,
            assets: None,
            keep_assets: None,
        },
        DeployPlan::AssetsOnly { assets } => ScriptMetadata {
            main_module: None,
            compatibility_date,
            bindings: None,
            assets: Some(assets_metadata(assets, completion.as_ref())),
            keep_assets,
        },
        DeployPlan::ScriptAndAssets { assets, .. } => ScriptMetadata {
            main_module: Some(MODULE_NAME.to_string()),
            compatibility_date,
            bindings: Some(asset_bindings(assets)),
            assets: Some(assets_metadata(assets, completion.as_ref())),
            keep_assets,
        },
    };

    Some(DeploymentRequest {
        script_name: config.name.clone(),
        metadata,
        module: ScriptModule::new(script.unwrap_or_default()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetServingConfig, HtmlHandling};
    use serde_json::json;
    use std::path::PathBuf;

    fn config(main: bool, binding: Option<&str>, assets: bool) -> DeployConfig {
        DeployConfig {
            name: "site".to_string(),
            compatibility_date: "2024-09-23".to_string(),
            main: main.then(|| PathBuf::from("dist/index.js")),
            assets: assets.then(|| AssetsConfig {
                directory: PathBuf::from("public"),
                binding: binding.map(str::to_string),
                serving: AssetServingConfig {
                    html_handling: Some(HtmlHandling::AutoTrailingSlash),
                    ..AssetServingConfig::default()
                },
            }),
        }
    }

    fn token(value: &str) -> Option<CompletionToken> {
        CompletionToken::from_response(Some(value.to_string()))
    }

    #[test]
    fn test_script_only_has_no_asset_section() {
        let cfg = config(true, None, false);
        let request = assemble_request(&cfg, cfg.plan(), Some(b"export {}".to_vec()), None).unwrap();

        assert_eq!(request.script_name, "site");
        assert_eq!(request.module.content, b"export {}");
        assert_eq!(
            serde_json::to_value(&request.metadata).unwrap(),
            json!({ "main_module": "index.js", "compatibility_date": "2024-09-23" })
        );
    }

    #[test]
    fn test_updated_assets_carry_completion_token() {
        let cfg = config(true, Some("ASSETS"), true);
        let request =
            assemble_request(&cfg, cfg.plan(), Some(b"export {}".to_vec()), token("done")).unwrap();

        assert_eq!(
            serde_json::to_value(&request.metadata).unwrap(),
            json!({
                "main_module": "index.js",
                "compatibility_date": "2024-09-23",
                "bindings": [{ "type": "assets", "name": "ASSETS" }],
                "assets": {
                    "config": { "html_handling": "auto-trailing-slash" },
                    "jwt": "done"
                },
                "keep_assets": false
            })
        );
    }

    #[test]
    fn test_unchanged_assets_keep_existing() {
        let cfg = config(true, Some("ASSETS"), true);
        let request = assemble_request(&cfg, cfg.plan(), Some(Vec::new()), None).unwrap();

        let metadata = request.metadata;
        assert_eq!(metadata.keep_assets, Some(true));
        assert!(metadata.assets.unwrap().jwt.is_none());
        assert_eq!(
            metadata.bindings,
            Some(vec![Binding::Assets {
                name: "ASSETS".to_string()
            }])
        );
    }

    #[test]
    fn test_no_binding_configured_sends_empty_list() {
        let cfg = config(true, None, true);
        let request = assemble_request(&cfg, cfg.plan(), Some(Vec::new()), token("t")).unwrap();
        assert_eq!(request.metadata.bindings, Some(Vec::new()));
    }

    #[test]
    fn test_assets_only_has_no_main_module() {
        let cfg = config(false, Some("ASSETS"), true);
        let request = assemble_request(&cfg, cfg.plan(), None, token("done")).unwrap();

        assert!(request.metadata.main_module.is_none());
        assert!(request.metadata.bindings.is_none());
        assert_eq!(request.metadata.keep_assets, Some(false));
        assert!(request.module.content.is_empty());
        assert_eq!(request.module.name, MODULE_NAME);
    }

    #[test]
    fn test_empty_plan_builds_nothing() {
        let cfg = config(false, None, false);
        assert!(assemble_request(&cfg, cfg.plan(), None, None).is_none());
    }
}
