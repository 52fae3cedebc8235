//! Application state snapshot.

use crate::model::card::{CardId, PlaceholderPolicy};
use crate::model::project::{Project, ProjectId};
use crate::store::ProjectStore;
use std::fmt::{Display, Formatter};

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    ProjectList,
    Board,
}

/// Destructive action waiting for an explicit confirm/cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirmation {
    DeleteProject(ProjectId),
    DeleteCard {
        project_id: ProjectId,
        card_id: CardId,
    },
}

impl PendingConfirmation {
    /// Prompt text a UI shows while the confirmation is pending.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::DeleteProject(_) => {
                "Are you sure you want to delete this project? This cannot be undone."
            }
            Self::DeleteCard { .. } => "Are you sure you want to delete this card?",
        }
    }
}

/// Remote sync indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Nothing pushed yet in this session.
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
    Offline,
    /// Remote sync is not configured.
    Disabled,
}

impl SyncStatus {
    /// Short label for status indicators.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle | Self::Synced => "Ready",
            Self::Syncing => "Syncing...",
            Self::Error => "Sync Error",
            Self::Offline => "Offline",
            Self::Disabled => "Local only",
        }
    }
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
            Self::Offline => "offline",
            Self::Disabled => "disabled",
        };
        f.write_str(value)
    }
}

/// Behavior switches distinguishing the application variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppSettings {
    pub placeholder_policy: PlaceholderPolicy,
    /// Whether card deletion goes through a pending confirmation.
    pub confirm_card_delete: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            placeholder_policy: PlaceholderPolicy::Deferred,
            confirm_card_delete: true,
        }
    }
}

/// Whole application state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub store: ProjectStore,
    pub active_project: Option<ProjectId>,
    pub view: View,
    pub editing_card: Option<CardId>,
    pub editing_project: Option<ProjectId>,
    pub show_create_project: bool,
    pub pending_confirmation: Option<PendingConfirmation>,
    pub sync_status: SyncStatus,
    pub online: bool,
    pub settings: AppSettings,
}

impl AppState {
    pub fn new(store: ProjectStore, settings: AppSettings) -> Self {
        Self {
            store,
            active_project: None,
            view: View::ProjectList,
            editing_card: None,
            editing_project: None,
            show_create_project: false,
            pending_confirmation: None,
            sync_status: SyncStatus::Idle,
            online: true,
            settings,
        }
    }

    /// Project shown on the board, if any.
    pub fn current_project(&self) -> Option<&Project> {
        self.active_project
            .as_ref()
            .and_then(|id| self.store.get(id))
    }

    /// Resets board-related state and shows the project list.
    pub(crate) fn return_to_list(&mut self) {
        self.active_project = None;
        self.editing_card = None;
        self.view = View::ProjectList;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ProjectStore::new(), AppSettings::default())
    }
}
