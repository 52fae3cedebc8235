//! Core domain logic for Story Cards.
//! This crate is the single source of truth for project/card invariants.

pub mod app;
pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use app::{
    update, Action, ActionError, AppSettings, AppState, Effect, PendingConfirmation, SyncStatus,
    View,
};
pub use config::{AppConfig, ConfigError, StorageBackend, SyncConfig};
pub use export::{export_filename, export_project, import_project, ExportError, ExportFile};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::card::{Card, CardField, CardId, PlaceholderPolicy};
pub use model::project::{Project, ProjectId};
pub use repo::local_store::{
    JsonFileLocalStore, LocalStore, MemoryLocalStore, RepoError, RepoResult, SqliteLocalStore,
};
pub use service::session::{RemoteSync, SessionError, StoryCardsSession};
pub use store::{NewCard, ProjectStore, StoreError};
pub use sync::{RemoteFile, RemoteFileStore, SyncError, SyncWorker};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
