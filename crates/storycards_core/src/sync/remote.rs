//! Remote single-file storage contract.

use super::SyncResult;
use serde::Serialize;

/// Current remote document and its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Opaque revision id required to update the file in place.
    pub sha: String,
    /// Base64 body as returned by the remote; may contain line breaks.
    pub content: String,
}

/// Body of a create-or-update request.
///
/// `sha` is omitted from the wire when absent, which asks the remote to
/// create the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Storage holding exactly one remote file.
pub trait RemoteFileStore: Send + Sync {
    /// Branch or revision line the file lives on.
    fn branch(&self) -> &str;

    /// Fetches the file; `Ok(None)` means it has not been created yet.
    fn fetch(&self) -> SyncResult<Option<RemoteFile>>;

    /// Creates or updates the file.
    fn put(&self, request: &PutFileRequest) -> SyncResult<()>;
}
