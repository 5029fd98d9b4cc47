//! Upload session negotiation.

use std::collections::HashSet;

use tracing::{debug, info};

use super::manifest::{AssetBundle, ContentStore};
use crate::api::{AuthorizationToken, UploadSessionResponse, WorkersApi};
use crate::error::{ProtocolError, Result};

/// Batches the service still needs, plus the token that authorizes them.
///
/// Batches partition the missing fingerprints: every one is known locally and
/// none appears twice.
#[derive(Debug)]
pub struct UploadSession {
    token: AuthorizationToken,
    batches: Vec<Vec<String>>,
}

impl UploadSession {
    /// Validate a create-upload-session result against the local content.
    pub fn from_response(
        response: UploadSessionResponse,
        store: &ContentStore,
    ) -> Result<Self, ProtocolError> {
        let batches: Vec<Vec<String>> = response
            .buckets
            .unwrap_or_default()
            .into_iter()
            // An empty bucket needs no upload call. Clients that post it anyway
            // then demand a jwt; here `[[]]` means nothing is missing.
            .filter(|batch| !batch.is_empty())
            .collect();

        let mut seen = HashSet::new();
        for fingerprint in batches.iter().flatten() {
            if !store.contains(fingerprint) {
                return Err(ProtocolError::UnknownFingerprint(fingerprint.clone()));
            }
            if !seen.insert(fingerprint.as_str()) {
                return Err(ProtocolError::DuplicateFingerprint(fingerprint.clone()));
            }
        }

        Ok(Self {
            token: AuthorizationToken::new(response.jwt),
            batches,
        })
    }

    /// True when the service already holds every asset.
    pub fn is_complete(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Number of fingerprints to upload across all batches.
    pub fn required_count(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn batches(&self) -> &[Vec<String>] {
        &self.batches
    }

    pub(crate) fn into_parts(self) -> (AuthorizationToken, Vec<Vec<String>>) {
        (self.token, self.batches)
    }
}

/// Submit the manifest and open an upload session.
pub async fn negotiate<A>(
    api: &A,
    account_id: &str,
    script_name: &str,
    bundle: &AssetBundle,
) -> Result<UploadSession>
where
    A: WorkersApi + ?Sized,
{
    debug!(
        "Negotiating upload session for {} ({} paths, {} distinct files)",
        script_name,
        bundle.manifest.len(),
        bundle.store.len()
    );

    let response = api
        .create_upload_session(account_id, script_name, &bundle.manifest)
        .await?;
    let session = UploadSession::from_response(response, &bundle.store)?;

    info!(
        "📊 Upload session: {} of {} files missing, {} batch(es)",
        session.required_count(),
        bundle.store.len(),
        session.batch_count()
    );
    Ok(session)
}
