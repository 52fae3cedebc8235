//! Whole-store push and pull over a `RemoteFileStore`.
//!
//! # Responsibility
//! - Encode the store as base64 JSON and write it with the current token.
//! - Decode the remote document back into a `ProjectStore`.
//!
//! # Invariants
//! - A missing remote file is never an error; it means "create on push".
//! - Push performs exactly one fetch followed by at most one put.

use super::remote::{PutFileRequest, RemoteFileStore};
use super::{SyncError, SyncResult};
use crate::store::ProjectStore;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use std::time::Instant;

/// Result of a successful push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// `true` when the remote file did not exist before this push.
    pub created: bool,
}

/// Base64-encodes a JSON document for the remote body.
pub fn encode_content(json: &str) -> String {
    B64.encode(json.as_bytes())
}

/// Decodes a remote base64 body, tolerating embedded line breaks.
pub fn decode_content(content: &str) -> SyncResult<String> {
    let compact = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect::<String>();
    let bytes = B64
        .decode(compact.as_bytes())
        .map_err(|err| SyncError::InvalidDocument(format!("base64: {err}")))?;
    String::from_utf8(bytes).map_err(|err| SyncError::InvalidDocument(format!("utf-8: {err}")))
}

/// Pushes one serialized store snapshot.
///
/// Steps: fetch the current version token, encode the body, then put with
/// the token when present (update) or without it (create). No retries.
pub fn push_store(
    remote: &dyn RemoteFileStore,
    snapshot_json: &str,
    now: DateTime<Utc>,
) -> SyncResult<PushOutcome> {
    let started_at = Instant::now();
    info!("event=sync_push module=sync status=start bytes={}", snapshot_json.len());

    let result = fetch_token(remote).and_then(|sha| {
        let created = sha.is_none();
        let request = PutFileRequest {
            message: format!(
                "Update story cards data - {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            content: encode_content(snapshot_json),
            branch: remote.branch().to_string(),
            sha,
        };
        remote.put(&request)?;
        Ok(PushOutcome { created })
    });

    match &result {
        Ok(outcome) => info!(
            "event=sync_push module=sync status=ok created={} duration_ms={}",
            outcome.created,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=sync_push module=sync status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

/// Fetches and decodes the remote store.
///
/// Returns `Ok(None)` when the remote file does not exist yet.
pub fn pull_store(remote: &dyn RemoteFileStore) -> SyncResult<Option<ProjectStore>> {
    let Some(file) = remote.fetch()? else {
        info!("event=sync_pull module=sync status=ok found=false");
        return Ok(None);
    };
    let json = decode_content(&file.content)?;
    let store = serde_json::from_str::<ProjectStore>(&json)
        .map_err(|err| SyncError::InvalidDocument(format!("json: {err}")))?;
    info!(
        "event=sync_pull module=sync status=ok found=true projects={}",
        store.len()
    );
    Ok(Some(store))
}

fn fetch_token(remote: &dyn RemoteFileStore) -> SyncResult<Option<String>> {
    Ok(remote.fetch()?.map(|file| file.sha))
}

#[cfg(test)]
mod tests {
    use super::{decode_content, encode_content};

    #[test]
    fn decode_accepts_wrapped_base64() {
        let encoded = encode_content("{\"a\": \"Ünïcode ✓\"}");
        let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);
        assert_eq!(decode_content(&wrapped).unwrap(), "{\"a\": \"Ünïcode ✓\"}");
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_content("***").unwrap_err();
        assert_eq!(err.code(), "invalid_document");
    }
}
