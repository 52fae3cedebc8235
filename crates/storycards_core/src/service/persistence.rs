//! Persistence adapter between `ProjectStore` and a `LocalStore`.
//!
//! # Responsibility
//! - Load the store at startup and save it after every change.
//! - Swallow and log local failures so the application keeps running.
//!
//! # Invariants
//! - Loading never fails: missing or corrupt data yields an empty store.
//! - Corrupt data is left in place, not overwritten, until the next save.

use crate::repo::local_store::{LocalStore, RepoError};
use crate::store::ProjectStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure to write the local store.
#[derive(Debug)]
pub enum PersistError {
    Serialize(serde_json::Error),
    Repo(RepoError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize store: {err}"),
            Self::Repo(err) => write!(f, "failed to write local store: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

/// Reads the store from `local`, falling back to an empty one.
pub fn load_store(local: &dyn LocalStore) -> ProjectStore {
    let backend = local.backend();
    match local.read() {
        Ok(None) => {
            info!("event=store_load module=service status=ok backend={backend} found=false");
            ProjectStore::new()
        }
        Ok(Some(json)) => match serde_json::from_str::<ProjectStore>(&json) {
            Ok(store) => {
                info!(
                    "event=store_load module=service status=ok backend={backend} found=true projects={}",
                    store.len()
                );
                store
            }
            Err(err) => {
                error!(
                    "event=store_load module=service status=error backend={backend} error_code=corrupt_data error={err}"
                );
                ProjectStore::new()
            }
        },
        Err(err) => {
            error!(
                "event=store_load module=service status=error backend={backend} error_code=read_failed error={err}"
            );
            ProjectStore::new()
        }
    }
}

/// Writes the whole store to `local`.
pub fn save_store(local: &dyn LocalStore, store: &ProjectStore) -> Result<(), PersistError> {
    let json = serde_json::to_string(store).map_err(PersistError::Serialize)?;
    local.write(&json).map_err(PersistError::Repo)
}

/// Writes the whole store, logging instead of returning failures.
pub fn save_store_logged(local: &dyn LocalStore, store: &ProjectStore) -> bool {
    match save_store(local, store) {
        Ok(()) => {
            info!(
                "event=store_save module=service status=ok backend={} projects={}",
                local.backend(),
                store.len()
            );
            true
        }
        Err(err) => {
            warn!(
                "event=store_save module=service status=error backend={} error={err}",
                local.backend()
            );
            false
        }
    }
}
