//! Deploy entry points.
//!
//! `deploy` resolves credentials, syncs assets when configured and finishes
//! with a single script update. Any failure aborts the whole deploy; nothing
//! is retried and nothing is rolled back.

mod assemble;

pub use assemble::assemble_request;

use std::path::Path;

use tracing::{info, warn};

use crate::api::{ApiClient, WorkersApi};
use crate::assets::{sync_assets, AssetSync};
use crate::config::{DeployConfig, DeployOptions};
use crate::credentials::{CredentialProvider, Credentials, EnvCredentials};
use crate::error::{DeployError, Result};

/// Summary of a finished deploy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployReport {
    /// Files in the asset manifest
    pub asset_files: usize,
    /// Distinct files uploaded
    pub uploaded_files: usize,
    /// Upload-batch calls made
    pub batches: usize,
    /// The service was told to keep its current assets
    pub assets_kept: bool,
    /// An update-script request was sent
    pub script_updated: bool,
}

/// Deploy `config`, taking unset credentials from the environment.
pub async fn deploy(config: &DeployConfig, options: DeployOptions) -> Result<DeployReport> {
    deploy_with_provider(config, &options, &EnvCredentials).await
}

/// Deploy `config`, taking unset credentials from `provider`.
///
/// Credentials are resolved before anything touches the network.
pub async fn deploy_with_provider<P>(
    config: &DeployConfig,
    options: &DeployOptions,
    provider: &P,
) -> Result<DeployReport>
where
    P: CredentialProvider + ?Sized,
{
    config.validate()?;
    let credentials = Credentials::resolve(options, provider)?;
    let client = ApiClient::from_credentials(&credentials)?;
    deploy_with_api(&client, &credentials.account_id, config).await
}

/// Deploy `config` through an already authenticated `api`.
pub async fn deploy_with_api<A>(
    api: &A,
    account_id: &str,
    config: &DeployConfig,
) -> Result<DeployReport>
where
    A: WorkersApi + ?Sized,
{
    let plan = config.plan();

    let script = match plan.main() {
        Some(main) => Some(read_script(main).await?),
        None => None,
    };

    let mut report = DeployReport::default();
    let completion = match plan.assets() {
        Some(assets) => {
            let AssetSync {
                files,
                uploaded,
                batches,
                completion,
            } = sync_assets(api, account_id, &config.name, &assets.directory).await?;
            report.asset_files = files;
            report.uploaded_files = uploaded;
            report.batches = batches;
            report.assets_kept = completion.is_none();
            completion
        }
        None => None,
    };

    match assemble_request(config, plan, script, completion) {
        Some(request) => {
            info!("🚀 Updating script {}...", config.name);
            api.update_script(account_id, request).await?;
            report.script_updated = true;
            info!("✅ Deployed {}", config.name);
        }
        None => {
            warn!(
                "Nothing to deploy for {}: neither main nor assets is configured",
                config.name
            );
        }
    }

    Ok(report)
}

async fn read_script(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| DeployError::io(path, e))
}
