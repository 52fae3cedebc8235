//! Best-effort synchronization of the project store to one remote file.
//!
//! # Responsibility
//! - Define the remote single-file contract (`RemoteFileStore`).
//! - Implement it over the GitHub contents REST API.
//! - Push/pull whole-store documents and schedule pushes single-flight.
//!
//! # Invariants
//! - At most one remote request is in flight per `SyncWorker`.
//! - A push always fetches the current version token right before writing.
//! - Remote semantics are last-write-wins; nothing is merged.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod document;
pub mod github;
pub mod remote;
pub mod worker;

pub use document::{decode_content, encode_content, pull_store, push_store, PushOutcome};
pub use github::{GithubContentsClient, GithubTarget};
pub use remote::{PutFileRequest, RemoteFile, RemoteFileStore};
pub use worker::SyncWorker;

pub type SyncResult<T> = Result<T, SyncError>;

/// Remote request phase, used for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Fetch,
    Put,
}

impl Display for SyncStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Put => f.write_str("put"),
        }
    }
}

/// Remote sync failure.
#[derive(Debug)]
pub enum SyncError {
    /// Transport-level failure (DNS, TLS, timeout, body read).
    Transport {
        stage: SyncStage,
        source: reqwest::Error,
    },
    /// Remote answered with an unexpected HTTP status.
    Status { stage: SyncStage, status: u16 },
    /// Remote document could not be decoded into a project store.
    InvalidDocument(String),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { stage, source } => write!(f, "remote {stage} failed: {source}"),
            Self::Status { stage, status } => {
                write!(f, "remote {stage} returned HTTP {status}")
            }
            Self::InvalidDocument(message) => write!(f, "invalid remote document: {message}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source),
            Self::Status { .. } | Self::InvalidDocument(_) => None,
        }
    }
}

impl SyncError {
    /// Stable code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "http_status",
            Self::InvalidDocument(_) => "invalid_document",
        }
    }
}
