//! Session facade wiring state, local persistence and remote sync.
//!
//! # Responsibility
//! - Own the `AppState` and apply actions through the reducer.
//! - Execute reducer effects: local saves, sync scheduling, exports.
//! - Load the initial store from the remote when available, else locally.
//!
//! # Invariants
//! - Local save always happens before a remote push is scheduled.
//! - Nothing is scheduled for sync while offline.
//! - An empty store is never pushed unless the dispatched action removed
//!   the last project; a failed startup pull cannot wipe the remote.
//! - Session construction succeeds even when local or remote data is
//!   unreadable; only backend setup failures are errors.

use super::persistence::{load_store, save_store_logged};
use crate::app::{update, Action, ActionError, AppSettings, AppState, Effect, SyncStatus};
use crate::config::{AppConfig, StorageBackend, SyncConfig};
use crate::export::ExportFile;
use crate::model::project::ProjectId;
use crate::repo::local_store::{
    JsonFileLocalStore, LocalStore, MemoryLocalStore, RepoError, SqliteLocalStore,
};
use crate::sync::document::pull_store;
use crate::sync::github::GithubContentsClient;
use crate::sync::remote::RemoteFileStore;
use crate::sync::worker::SyncWorker;
use crate::sync::SyncError;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Session setup failure.
#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Sync(SyncError),
    /// Sync worker thread could not be started.
    Worker(std::io::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "local store unavailable: {err}"),
            Self::Sync(err) => write!(f, "remote sync unavailable: {err}"),
            Self::Worker(err) => write!(f, "failed to start sync worker: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Worker(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SyncError> for SessionError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Remote endpoint plus the worker pushing to it.
pub struct RemoteSync {
    pub remote: Arc<dyn RemoteFileStore>,
    pub debounce: Duration,
}

/// One running application instance.
pub struct StoryCardsSession {
    state: AppState,
    local: Box<dyn LocalStore>,
    worker: Option<SyncWorker>,
    clock: fn() -> DateTime<Utc>,
    last_imported: Option<ProjectId>,
}

impl StoryCardsSession {
    /// Builds backends from `config` and loads the initial store.
    pub fn open(config: &AppConfig) -> Result<Self, SessionError> {
        let local: Box<dyn LocalStore> = match &config.storage {
            StorageBackend::Sqlite(path) => Box::new(SqliteLocalStore::open(path)?),
            StorageBackend::JsonFile(path) => Box::new(JsonFileLocalStore::new(path.clone())),
            StorageBackend::Memory => Box::new(MemoryLocalStore::new()),
        };
        let remote = config.sync.as_ref().map(github_remote).transpose()?;
        Self::with_backends(local, remote, config.settings)
    }

    /// Builds a session over explicit backends.
    pub fn with_backends(
        local: Box<dyn LocalStore>,
        remote: Option<RemoteSync>,
        settings: AppSettings,
    ) -> Result<Self, SessionError> {
        let mut store = None;
        if let Some(remote) = &remote {
            match pull_store(remote.remote.as_ref()) {
                Ok(Some(remote_store)) => {
                    save_store_logged(local.as_ref(), &remote_store);
                    store = Some(remote_store);
                }
                Ok(None) => {}
                Err(err) => warn!(
                    "event=session_open module=service status=degraded source=remote error_code={} error={err}",
                    err.code()
                ),
            }
        }
        let store = store.unwrap_or_else(|| load_store(local.as_ref()));

        let mut state = AppState::new(store, settings);
        let worker = match remote {
            Some(remote) => Some(
                SyncWorker::spawn(remote.remote, remote.debounce)
                    .map_err(SessionError::Worker)?,
            ),
            None => {
                state.sync_status = SyncStatus::Disabled;
                None
            }
        };

        info!(
            "event=session_open module=service status=ok backend={} projects={} remote={}",
            local.backend(),
            state.store.len(),
            worker.is_some()
        );
        Ok(Self {
            state,
            local,
            worker,
            clock: Utc::now,
            last_imported: None,
        })
    }

    /// Replaces the wall clock, for deterministic timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies one action and runs its effects.
    ///
    /// Returns the exports produced by the action, if any.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<ExportFile>, ActionError> {
        let had_projects = !self.state.store.is_empty();
        let effects = update(&mut self.state, action, (self.clock)())?;
        let mut exports = Vec::new();
        for effect in effects {
            match effect {
                Effect::Persist => {
                    save_store_logged(self.local.as_ref(), &self.state.store);
                    // An empty store is only pushed when this action emptied it.
                    self.schedule_sync(false, had_projects);
                }
                Effect::SaveLocal => {
                    save_store_logged(self.local.as_ref(), &self.state.store);
                }
                Effect::SyncNow => {
                    self.schedule_sync(true, false);
                }
                Effect::Export(file) => exports.push(file),
                Effect::ProjectImported(id) => {
                    info!("event=project_import module=service status=ok project_id={id}");
                    self.last_imported = Some(id);
                }
            }
        }
        self.refresh_sync_status();
        Ok(exports)
    }

    /// Id of the most recently imported project.
    pub fn last_imported(&self) -> Option<&ProjectId> {
        self.last_imported.as_ref()
    }

    /// Current sync indicator, refreshed from the worker.
    pub fn sync_status(&mut self) -> SyncStatus {
        self.refresh_sync_status();
        self.state.sync_status
    }

    /// Schedules an immediate push of the whole store.
    ///
    /// Returns `false` when nothing was scheduled: sync is disabled, the
    /// session is offline, or the store is empty.
    pub fn sync_now(&mut self) -> bool {
        self.schedule_sync(true, false)
    }

    /// Pushes pending changes now and waits up to `timeout` for the result.
    pub fn flush(&mut self, timeout: Duration) -> SyncStatus {
        if let Some(worker) = &self.worker {
            if self.state.online {
                worker.flush(timeout);
            }
        }
        self.sync_status()
    }

    fn schedule_sync(&self, immediate: bool, allow_empty: bool) -> bool {
        let Some(worker) = &self.worker else {
            return false;
        };
        if !self.state.online {
            return false;
        }
        if self.state.store.is_empty() && !allow_empty {
            info!("event=sync_schedule module=service status=skipped reason=empty_store");
            return false;
        }
        match serde_json::to_string_pretty(&self.state.store) {
            Ok(snapshot) => {
                if immediate {
                    worker.schedule_now(snapshot);
                } else {
                    worker.schedule(snapshot);
                }
                true
            }
            Err(err) => {
                warn!("event=sync_schedule module=service status=error error={err}");
                false
            }
        }
    }

    fn refresh_sync_status(&mut self) {
        let status = match &self.worker {
            None => SyncStatus::Disabled,
            Some(_) if !self.state.online => SyncStatus::Offline,
            Some(worker) => worker.status(),
        };
        self.state.sync_status = status;
    }
}

fn github_remote(config: &SyncConfig) -> Result<RemoteSync, SyncError> {
    let client =
        GithubContentsClient::new(config.target.clone(), config.token.clone(), config.timeout)?;
    Ok(RemoteSync {
        remote: Arc::new(client),
        debounce: config.debounce,
    })
}
