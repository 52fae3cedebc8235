//! GitHub contents API client for the remote data file.
//!
//! # Responsibility
//! - Map `RemoteFileStore` calls onto `GET`/`PUT /repos/{owner}/{repo}/contents/{path}`.
//! - Classify HTTP statuses: 404 on fetch is "absent", 2xx is success.
//!
//! # Invariants
//! - Every request carries an explicit timeout and a `User-Agent`.
//! - The token, when configured, is only ever sent as a bearer header.

use super::remote::{PutFileRequest, RemoteFile, RemoteFileStore};
use super::{SyncError, SyncResult, SyncStage};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "yexod";
pub const DEFAULT_REPO: &str = "story-cards";
pub const DEFAULT_PATH: &str = "data.json";
pub const DEFAULT_BRANCH: &str = "main";

/// Location of the remote data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubTarget {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
}

impl Default for GithubTarget {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            path: DEFAULT_PATH.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl GithubTarget {
    /// Contents endpoint URL for the data file.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
}

/// Blocking GitHub contents client.
pub struct GithubContentsClient {
    http: Client,
    target: GithubTarget,
    token: Option<String>,
}

impl GithubContentsClient {
    pub fn new(target: GithubTarget, token: Option<String>, timeout: Duration) -> SyncResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("storycards/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SyncError::Transport {
                stage: SyncStage::Fetch,
                source,
            })?;
        Ok(Self {
            http,
            target,
            token: token.filter(|value| !value.trim().is_empty()),
        })
    }

    pub fn target(&self) -> &GithubTarget {
        &self.target
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let builder = self
            .http
            .request(method, self.target.contents_url())
            .header(ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }
}

impl RemoteFileStore for GithubContentsClient {
    fn branch(&self) -> &str {
        &self.target.branch
    }

    fn fetch(&self) -> SyncResult<Option<RemoteFile>> {
        let transport = |source| SyncError::Transport {
            stage: SyncStage::Fetch,
            source,
        };
        let response = self
            .request(Method::GET)
            .query(&[("ref", self.target.branch.as_str())])
            .send()
            .map_err(transport)?;

        match classify_fetch_status(response.status()) {
            FetchStatus::Absent => Ok(None),
            FetchStatus::Found => {
                let body = response.json::<ContentsResponse>().map_err(transport)?;
                Ok(Some(RemoteFile {
                    sha: body.sha,
                    content: body.content,
                }))
            }
            FetchStatus::Failed(status) => Err(SyncError::Status {
                stage: SyncStage::Fetch,
                status,
            }),
        }
    }

    fn put(&self, request: &PutFileRequest) -> SyncResult<()> {
        let response = self
            .request(Method::PUT)
            .json(request)
            .send()
            .map_err(|source| SyncError::Transport {
                stage: SyncStage::Put,
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Status {
                stage: SyncStage::Put,
                status: status.as_u16(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchStatus {
    Found,
    Absent,
    Failed(u16),
}

fn classify_fetch_status(status: StatusCode) -> FetchStatus {
    if status == StatusCode::NOT_FOUND {
        FetchStatus::Absent
    } else if status.is_success() {
        FetchStatus::Found
    } else {
        FetchStatus::Failed(status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_fetch_status, FetchStatus, GithubContentsClient, GithubTarget};
    use crate::sync::remote::RemoteFileStore;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn default_target_points_at_data_file() {
        assert_eq!(
            GithubTarget::default().contents_url(),
            "https://api.github.com/repos/yexod/story-cards/contents/data.json"
        );
    }

    #[test]
    fn contents_url_normalizes_slashes() {
        let target = GithubTarget {
            api_base: "http://127.0.0.1:8080/".to_string(),
            path: "/nested/data.json".to_string(),
            ..GithubTarget::default()
        };
        assert_eq!(
            target.contents_url(),
            "http://127.0.0.1:8080/repos/yexod/story-cards/contents/nested/data.json"
        );
    }

    #[test]
    fn fetch_status_treats_404_as_absent() {
        assert_eq!(classify_fetch_status(StatusCode::OK), FetchStatus::Found);
        assert_eq!(
            classify_fetch_status(StatusCode::NOT_FOUND),
            FetchStatus::Absent
        );
        assert_eq!(
            classify_fetch_status(StatusCode::FORBIDDEN),
            FetchStatus::Failed(403)
        );
    }

    #[test]
    fn blank_token_is_dropped() {
        let client = GithubContentsClient::new(
            GithubTarget::default(),
            Some("   ".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(client.token.is_none());
        assert_eq!(client.branch(), "main");
    }
}
