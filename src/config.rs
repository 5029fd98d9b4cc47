//! Deploy configuration.
//!
//! `DeployConfig` is what the caller describes; `DeployPlan` is the shape the
//! pipeline actually branches on.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, Result};

/// Format accepted for `compatibility_date`
const COMPATIBILITY_DATE_FORMAT: &str = "%Y-%m-%d";

/// How requests for HTML paths are matched against asset files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlHandling {
    AutoTrailingSlash,
    ForceTrailingSlash,
    DropTrailingSlash,
    None,
}

/// What to serve when no asset matches a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotFoundHandling {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "404-page")]
    NotFoundPage,
    #[serde(rename = "single-page-application")]
    SinglePageApplication,
}

/// Asset-serving options, passed through to the service unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetServingConfig {
    /// Contents of a `_headers` rules file
    #[serde(rename = "_headers", skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    /// Contents of a `_redirects` rules file
    #[serde(rename = "_redirects", skip_serializing_if = "Option::is_none")]
    pub redirects: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_handling: Option<HtmlHandling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_found_handling: Option<NotFoundHandling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_worker_first: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serve_directly: Option<bool>,
}

/// Static assets to deploy with the script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Root of the asset tree
    pub directory: PathBuf,
    /// Name of the binding that exposes assets to the script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    #[serde(flatten)]
    pub serving: AssetServingConfig,
}

/// Everything needed to deploy one script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Script name on the platform
    pub name: String,
    /// Runtime compatibility date (`YYYY-MM-DD`)
    pub compatibility_date: String,
    /// Path to the script module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetsConfig>,
}

/// Caller-supplied overrides; unset values fall back to the credential provider.
#[derive(Clone, Default)]
pub struct DeployOptions {
    pub api_token: Option<String>,
    pub account_id: Option<String>,
    pub api_base_url: Option<String>,
}

impl std::fmt::Debug for DeployOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployOptions")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("account_id", &self.account_id)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// What a deploy will do, by which parts are configured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeployPlan<'a> {
    ScriptOnly {
        main: &'a Path,
    },
    AssetsOnly {
        assets: &'a AssetsConfig,
    },
    ScriptAndAssets {
        main: &'a Path,
        assets: &'a AssetsConfig,
    },
    /// Neither script nor assets: the deploy is a no-op.
    Empty,
}

impl<'a> DeployPlan<'a> {
    pub fn main(&self) -> Option<&'a Path> {
        match *self {
            DeployPlan::ScriptOnly { main } | DeployPlan::ScriptAndAssets { main, .. } => {
                Some(main)
            }
            DeployPlan::AssetsOnly { .. } | DeployPlan::Empty => None,
        }
    }

    pub fn assets(&self) -> Option<&'a AssetsConfig> {
        match *self {
            DeployPlan::AssetsOnly { assets } | DeployPlan::ScriptAndAssets { assets, .. } => {
                Some(assets)
            }
            DeployPlan::ScriptOnly { .. } | DeployPlan::Empty => None,
        }
    }
}

impl DeployConfig {
    /// Load a JSON config file.
    ///
    /// Relative `main` and `assets.directory` paths are resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DeployError::io(path, e))?;
        let mut config: DeployConfig = serde_json::from_str(&content).map_err(|e| {
            DeployError::config(format!("invalid config file {}: {}", path.display(), e))
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(main) = self.main.as_mut() {
            if main.is_relative() {
                *main = base.join(&*main);
            }
        }
        if let Some(assets) = self.assets.as_mut() {
            if assets.directory.is_relative() {
                assets.directory = base.join(&assets.directory);
            }
        }
    }

    /// Check fields the service would otherwise reject late.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DeployError::config("script name must not be empty"));
        }

        NaiveDate::parse_from_str(&self.compatibility_date, COMPATIBILITY_DATE_FORMAT).map_err(
            |e| {
                DeployError::config(format!(
                    "compatibility_date {:?} is not a YYYY-MM-DD date: {}",
                    self.compatibility_date, e
                ))
            },
        )?;

        if let Some(binding) = self.assets.as_ref().and_then(|a| a.binding.as_deref()) {
            if binding.trim().is_empty() {
                return Err(DeployError::config("assets binding name must not be empty"));
            }
        }

        Ok(())
    }

    pub fn plan(&self) -> DeployPlan<'_> {
        match (self.main.as_deref(), self.assets.as_ref()) {
            (Some(main), Some(assets)) => DeployPlan::ScriptAndAssets { main, assets },
            (Some(main), None) => DeployPlan::ScriptOnly { main },
            (None, Some(assets)) => DeployPlan::AssetsOnly { assets },
            (None, None) => DeployPlan::Empty,
        }
    }
}
