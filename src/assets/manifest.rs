//! Manifest and content store built from a scan.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::fingerprint::ScannedFile;
use crate::api::BatchPayload;
use crate::error::{DeployError, ProtocolError, Result};

/// Fingerprint and size of one logical path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub hash: String,
    pub size: u64,
}

/// Logical path -> content, the desired state of the asset tree.
///
/// Several paths may share one fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, ManifestEntry>);

impl Manifest {
    /// Insert `entry`, returning the entry previously stored at `logical_path`.
    pub fn insert(&mut self, logical_path: String, entry: ManifestEntry) -> Option<ManifestEntry> {
        self.0.insert(logical_path, entry)
    }

    pub fn get(&self, logical_path: &str) -> Option<&ManifestEntry> {
        self.0.get(logical_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.0.iter()
    }

    pub fn total_size(&self) -> u64 {
        self.0.values().map(|e| e.size).sum()
    }
}

/// Fingerprint -> base64 file contents. One entry per distinct fingerprint.
#[derive(Default)]
pub struct ContentStore(HashMap<String, String>);

impl ContentStore {
    /// Record the encoded contents for `fingerprint`.
    ///
    /// A fingerprint seen before keeps its first encoding; identical
    /// fingerprints mean identical bytes.
    pub fn insert(&mut self, fingerprint: String, contents: &[u8]) {
        self.0
            .entry(fingerprint)
            .or_insert_with(|| STANDARD.encode(contents));
    }

    pub fn get(&self, fingerprint: &str) -> Option<&str> {
        self.0.get(fingerprint).map(String::as_str)
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.0.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Payload holding exactly the fingerprints of one batch.
    pub fn select(&self, batch: &[String]) -> Result<BatchPayload, ProtocolError> {
        let files = batch
            .iter()
            .map(|fingerprint| {
                self.get(fingerprint)
                    .map(|encoded| (fingerprint.clone(), encoded.to_string()))
                    .ok_or_else(|| ProtocolError::UnknownFingerprint(fingerprint.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(BatchPayload { files })
    }
}

impl fmt::Debug for ContentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStore")
            .field("fingerprints", &self.0.len())
            .finish()
    }
}

/// Manifest and content store for one deploy
#[derive(Debug, Default)]
pub struct AssetBundle {
    pub manifest: Manifest,
    pub store: ContentStore,
}

/// Consume a scan, stopping at the first error.
///
/// Two files mapping to the same logical path is a configuration error.
pub fn build_bundle<I>(files: I) -> Result<AssetBundle>
where
    I: IntoIterator<Item = Result<ScannedFile>>,
{
    files
        .into_iter()
        .try_fold(AssetBundle::default(), |mut bundle, file| {
            let ScannedFile { entry, contents } = file?;
            if bundle.manifest.get(&entry.logical_path).is_some() {
                return Err(DeployError::config(format!(
                    "more than one asset maps to {}",
                    entry.logical_path
                )));
            }

            bundle.store.insert(entry.fingerprint.clone(), &contents);
            bundle.manifest.insert(
                entry.logical_path,
                ManifestEntry {
                    hash: entry.fingerprint,
                    size: entry.size,
                },
            );
            Ok(bundle)
        })
}
