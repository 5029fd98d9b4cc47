//! Static asset synchronization.
//!
//! Fingerprint the asset tree, tell the service what the tree looks like,
//! upload only the content it is missing and collect the completion token
//! the script update needs.
//!
//! Scan → manifest → upload session → batches → completion token.

mod fingerprint;
mod manifest;
mod session;
mod upload;

pub use fingerprint::{
    compute_fingerprint, logical_path, scan_assets, FileEntry, ScannedFile, FINGERPRINT_LEN,
    MAX_ASSET_SIZE,
};
pub use manifest::{build_bundle, AssetBundle, ContentStore, Manifest, ManifestEntry};
pub use session::{negotiate, UploadSession};
pub use upload::upload_batches;

use std::path::Path;

use tracing::info;

use crate::api::{CompletionToken, WorkersApi};
use crate::error::{DeployError, Result};

/// Outcome of syncing an asset directory
#[derive(Debug)]
pub struct AssetSync {
    /// Logical paths in the manifest
    pub files: usize,
    /// Distinct fingerprints uploaded
    pub uploaded: usize,
    /// Upload-batch calls made
    pub batches: usize,
    /// Present when anything was uploaded; `None` means the service already
    /// had every asset
    pub completion: Option<CompletionToken>,
}

/// Fingerprint `directory` on a blocking thread.
pub async fn collect_bundle(directory: &Path) -> Result<AssetBundle> {
    let root = directory.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let metadata = std::fs::metadata(&root).map_err(|e| DeployError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(DeployError::config(format!(
                "assets directory {} is not a directory",
                root.display()
            )));
        }
        build_bundle(scan_assets(&root))
    })
    .await
    .map_err(|e| DeployError::io(directory, std::io::Error::other(e)))?
}

/// Bring the service's copy of `directory` up to date for `script_name`.
pub async fn sync_assets<A>(
    api: &A,
    account_id: &str,
    script_name: &str,
    directory: &Path,
) -> Result<AssetSync>
where
    A: WorkersApi + ?Sized,
{
    info!("🔄 Scanning assets in {}...", directory.display());
    let bundle = collect_bundle(directory).await?;
    info!(
        "Found {} files ({} distinct, {} bytes)",
        bundle.manifest.len(),
        bundle.store.len(),
        bundle.manifest.total_size()
    );

    let session = negotiate(api, account_id, script_name, &bundle).await?;
    if session.is_complete() {
        info!("✅ All assets already uploaded");
        return Ok(AssetSync {
            files: bundle.manifest.len(),
            uploaded: 0,
            batches: 0,
            completion: None,
        });
    }

    let uploaded = session.required_count();
    let batches = session.batch_count();
    let completion = upload_batches(api, account_id, session, &bundle.store).await?;
    info!("✅ Uploaded {} file(s) in {} batch(es)", uploaded, batches);

    Ok(AssetSync {
        files: bundle.manifest.len(),
        uploaded,
        batches,
        completion: Some(completion),
    })
}
