//! Sequential batch upload.
//!
//! Batches go out one at a time, in session order. The completion token is
//! the most recent non-empty token any batch response carried.

use futures_util::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info};

use super::manifest::ContentStore;
use super::session::UploadSession;
use crate::api::{CompletionToken, WorkersApi};
use crate::error::{DeployError, ProtocolError, Result};

/// Upload every batch of `session` and return the completion token.
///
/// Consumes the session, so its authorization token is released on return.
/// Fails if no batch response ever carried a token.
pub async fn upload_batches<A>(
    api: &A,
    account_id: &str,
    session: UploadSession,
    store: &ContentStore,
) -> Result<CompletionToken>
where
    A: WorkersApi + ?Sized,
{
    let (token, batches) = session.into_parts();
    let batch_count = batches.len();

    info!("📤 Uploading {} batch(es)...", batch_count);

    let latest = stream::iter(batches.iter().enumerate())
        .map(Ok::<_, DeployError>)
        .try_fold(None, |latest: Option<CompletionToken>, (index, batch)| {
            let token = &token;
            async move {
                let payload = store.select(batch)?;
                debug!(
                    "Batch {}/{}: {} file(s)",
                    index + 1,
                    batch_count,
                    payload.len()
                );

                let response = api.upload_batch(account_id, token, payload).await?;
                Ok::<_, DeployError>(CompletionToken::from_response(response.jwt).or(latest))
            }
        })
        .await?;

    latest.ok_or_else(|| {
        ProtocolError::MissingCompletionToken {
            batches: batch_count,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockApi;
    use crate::api::UploadSessionResponse;
    use crate::assets::fingerprint::compute_fingerprint;

    fn fixture(contents: &[&str]) -> (ContentStore, Vec<String>) {
        let mut store = ContentStore::default();
        let mut fingerprints = Vec::new();
        for c in contents {
            let fp = compute_fingerprint(c.as_bytes());
            store.insert(fp.clone(), c.as_bytes());
            fingerprints.push(fp);
        }
        (store, fingerprints)
    }

    fn session(buckets: Vec<Vec<String>>, store: &ContentStore) -> UploadSession {
        UploadSession::from_response(
            UploadSessionResponse {
                jwt: "session-jwt".to_string(),
                buckets: Some(buckets),
            },
            store,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_last_batch_token_is_used() {
        let (store, fps) = fixture(&["a", "b", "c"]);
        let buckets = vec![vec![fps[0].clone()], vec![fps[1].clone()], vec![fps[2].clone()]];
        let api = MockApi::default().batch_tokens(vec![None, Some(""), Some("final")]);

        let token = upload_batches(&api, "acc", session(buckets, &store), &store)
            .await
            .unwrap();
        assert_eq!(token.as_str(), "final");
        assert_eq!(api.uploads().len(), 3);
    }

    #[tokio::test]
    async fn test_most_recent_token_wins() {
        let (store, fps) = fixture(&["a", "b", "c"]);
        let buckets = vec![vec![fps[0].clone()], vec![fps[1].clone()], vec![fps[2].clone()]];
        let api = MockApi::default().batch_tokens(vec![Some("first"), Some("second"), None]);

        let token = upload_batches(&api, "acc", session(buckets, &store), &store)
            .await
            .unwrap();
        assert_eq!(token.as_str(), "second");
    }

    #[tokio::test]
    async fn test_no_token_is_protocol_error() {
        let (store, fps) = fixture(&["a", "b"]);
        let buckets = vec![vec![fps[0].clone()], vec![fps[1].clone()]];
        let api = MockApi::default().batch_tokens(vec![None, None]);

        let err = upload_batches(&api, "acc", session(buckets, &store), &store)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::Protocol(ProtocolError::MissingCompletionToken { batches: 2 })
        ));
    }

    #[tokio::test]
    async fn test_batches_use_session_token_in_order() {
        let (store, fps) = fixture(&["a", "b", "c"]);
        let buckets = vec![vec![fps[2].clone(), fps[0].clone()], vec![fps[1].clone()]];
        let api = MockApi::default().batch_tokens(vec![None, Some("done")]);

        upload_batches(&api, "acc", session(buckets, &store), &store)
            .await
            .unwrap();

        let uploads = api.uploads();
        assert_eq!(uploads.len(), 2);
        assert!(uploads.iter().all(|(token, _)| token == "session-jwt"));

        let first: Vec<&str> = uploads[0].1.fingerprints().collect();
        let mut expected = vec![fps[0].as_str(), fps[2].as_str()];
        expected.sort();
        assert_eq!(first, expected);
        assert_eq!(uploads[1].1.fingerprints().collect::<Vec<_>>(), vec![fps[1].as_str()]);
    }
}
