//! Content fingerprints for an asset directory.
//!
//! Walks the tree (symlinks are not followed and never reported), reads each
//! regular file once and derives a fingerprint from its bytes.

use std::fs;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{DeployError, Result};

/// Hex characters kept from the SHA-256 digest. The service expects exactly this length.
pub const FINGERPRINT_LEN: usize = 32;

/// Largest single asset the platform accepts (25 MiB).
pub const MAX_ASSET_SIZE: u64 = 25 * 1024 * 1024;

/// One regular file of the asset tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Root-relative path with forward slashes and a leading `/`
    pub logical_path: String,
    pub fingerprint: String,
    pub size: u64,
}

/// A fingerprinted file together with the bytes that were hashed
#[derive(Debug)]
pub struct ScannedFile {
    pub entry: FileEntry,
    pub contents: Vec<u8>,
}

/// Truncated hex SHA-256 of `content`.
pub fn compute_fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = format!("{:x}", digest);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Logical path of `path` below `root`, e.g. `/css/site.css`.
///
/// Components are joined with `/` as-is, so a backslash inside a Unix file
/// name stays part of that name. Non-UTF-8 names are rejected.
pub fn logical_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        DeployError::config(format!(
            "{} is outside the asset directory {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut logical = String::new();
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return Err(DeployError::config(format!(
                "unexpected path component in {}",
                path.display()
            )));
        };
        let name = name.to_str().ok_or_else(|| {
            DeployError::config(format!("asset file name is not UTF-8: {}", path.display()))
        })?;
        logical.push('/');
        logical.push_str(name);
    }

    if logical.is_empty() {
        return Err(DeployError::config(format!(
            "{} is the asset directory itself",
            path.display()
        )));
    }
    Ok(logical)
}

/// Lazily fingerprint every regular file under `root`.
///
/// Order follows the directory walk and is not meaningful. The first error
/// ends the deploy; callers stop at it.
pub fn scan_assets(root: &Path) -> impl Iterator<Item = Result<ScannedFile>> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    return Some(Err(DeployError::io(path, e.into())));
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            Some(fingerprint_file(root, entry.path()))
        })
}

fn fingerprint_file(root: &Path, path: &Path) -> Result<ScannedFile> {
    let metadata = fs::metadata(path).map_err(|e| DeployError::io(path, e))?;
    if metadata.len() > MAX_ASSET_SIZE {
        return Err(DeployError::config(format!(
            "asset {} is {} bytes; the limit is {} bytes",
            path.display(),
            metadata.len(),
            MAX_ASSET_SIZE
        )));
    }

    let contents = fs::read(path).map_err(|e| DeployError::io(path, e))?;
    let logical_path = logical_path(root, path)?;

    let entry = FileEntry {
        logical_path,
        fingerprint: compute_fingerprint(&contents),
        size: contents.len() as u64,
    };
    debug!("{} -> {} ({} bytes)", entry.logical_path, entry.fingerprint, entry.size);

    Ok(ScannedFile { entry, contents })
}
