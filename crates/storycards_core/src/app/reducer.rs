//! Unidirectional update function for `AppState`.

use super::state::{AppState, PendingConfirmation, SyncStatus, View};
use crate::export::{export_project, import_project, ExportError, ExportFile};
use crate::model::card::{CardField, CardId};
use crate::model::project::ProjectId;
use crate::store::{NewCard, ProjectStore, StoreError};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User or system intent applied through `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowCreateProject,
    CancelCreateProject,
    CreateProject { name: String },
    OpenProject(ProjectId),
    /// Leave the board and show the project list.
    Back,
    BeginRename(ProjectId),
    CancelRename,
    RenameProject { id: ProjectId, name: String },
    RequestDeleteProject(ProjectId),
    /// Adds a card to the active project.
    AddCard(NewCard),
    BeginEditCard(CardId),
    EndEditCard,
    EditCard {
        card_id: CardId,
        field: CardField,
        value: String,
    },
    RequestDeleteCard(CardId),
    ReorderCards { from: usize, to: usize },
    /// Executes the pending confirmation.
    Confirm,
    /// Drops the pending confirmation.
    Cancel,
    ExportProject(ProjectId),
    ImportProject { json: String },
    SetOnline(bool),
    /// Replaces the whole store, e.g. with a freshly loaded remote document.
    ReplaceStore(ProjectStore),
}

/// Side effect requested by `update`; executed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Save locally and schedule a remote push.
    Persist,
    /// Save locally only.
    SaveLocal,
    /// Push the current store to the remote now.
    SyncNow,
    /// Hand an export artifact to the user.
    Export(ExportFile),
    ProjectImported(ProjectId),
}

/// Reasons an action was rejected.
///
/// The store is unchanged when an error is returned; a failed `Confirm`
/// still consumes the pending confirmation.
#[derive(Debug)]
pub enum ActionError {
    Store(StoreError),
    /// Card action issued while no project is open.
    NoActiveProject,
    /// `Confirm` issued with nothing pending.
    NothingToConfirm,
    Export(ExportError),
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NoActiveProject => write!(f, "no project is open"),
            Self::NothingToConfirm => write!(f, "nothing is waiting for confirmation"),
            Self::Export(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::NoActiveProject | Self::NothingToConfirm => None,
        }
    }
}

impl From<StoreError> for ActionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ExportError> for ActionError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

/// Applies one action at time `now` and returns the effects to run.
pub fn update(
    state: &mut AppState,
    action: Action,
    now: DateTime<Utc>,
) -> Result<Vec<Effect>, ActionError> {
    match action {
        Action::ShowCreateProject => {
            state.show_create_project = true;
            Ok(Vec::new())
        }
        Action::CancelCreateProject => {
            state.show_create_project = false;
            Ok(Vec::new())
        }
        Action::CreateProject { name } => {
            let id = state.store.create_project(&name, now)?;
            state.active_project = Some(id);
            state.view = View::Board;
            state.show_create_project = false;
            state.editing_card = None;
            Ok(vec![Effect::Persist])
        }
        Action::OpenProject(id) => {
            if !state.store.contains(&id) {
                return Err(StoreError::ProjectNotFound(id).into());
            }
            state.active_project = Some(id);
            state.view = View::Board;
            state.editing_card = None;
            Ok(Vec::new())
        }
        Action::Back => {
            state.return_to_list();
            Ok(Vec::new())
        }
        Action::BeginRename(id) => {
            if !state.store.contains(&id) {
                return Err(StoreError::ProjectNotFound(id).into());
            }
            state.editing_project = Some(id);
            Ok(Vec::new())
        }
        Action::CancelRename => {
            state.editing_project = None;
            Ok(Vec::new())
        }
        Action::RenameProject { id, name } => {
            state.store.rename_project(&id, &name, now)?;
            if state.editing_project.as_ref() == Some(&id) {
                state.editing_project = None;
            }
            Ok(vec![Effect::Persist])
        }
        Action::RequestDeleteProject(id) => {
            if !state.store.contains(&id) {
                return Err(StoreError::ProjectNotFound(id).into());
            }
            state.pending_confirmation = Some(PendingConfirmation::DeleteProject(id));
            Ok(Vec::new())
        }
        Action::AddCard(card) => {
            let project_id = active_project_id(state)?;
            state.store.add_card(
                &project_id,
                card,
                state.settings.placeholder_policy,
                now,
            )?;
            Ok(vec![Effect::Persist])
        }
        Action::BeginEditCard(card_id) => {
            let project_id = active_project_id(state)?;
            let exists = state
                .store
                .get(&project_id)
                .and_then(|project| project.card_index(card_id))
                .is_some();
            if !exists {
                return Err(StoreError::CardNotFound {
                    project_id,
                    card_id,
                }
                .into());
            }
            state.editing_card = Some(card_id);
            Ok(Vec::new())
        }
        Action::EndEditCard => {
            state.editing_card = None;
            Ok(Vec::new())
        }
        Action::EditCard {
            card_id,
            field,
            value,
        } => {
            let project_id = active_project_id(state)?;
            state
                .store
                .edit_card(&project_id, card_id, field, value, now)?;
            Ok(vec![Effect::Persist])
        }
        Action::RequestDeleteCard(card_id) => {
            let project_id = active_project_id(state)?;
            if state.settings.confirm_card_delete {
                let exists = state
                    .store
                    .get(&project_id)
                    .and_then(|project| project.card_index(card_id))
                    .is_some();
                if !exists {
                    return Err(StoreError::CardNotFound {
                        project_id,
                        card_id,
                    }
                    .into());
                }
                state.pending_confirmation = Some(PendingConfirmation::DeleteCard {
                    project_id,
                    card_id,
                });
                return Ok(Vec::new());
            }
            delete_card(state, &project_id, card_id, now)
        }
        Action::ReorderCards { from, to } => {
            let project_id = active_project_id(state)?;
            if state.store.reorder_cards(&project_id, from, to, now)? {
                Ok(vec![Effect::Persist])
            } else {
                Ok(Vec::new())
            }
        }
        Action::Confirm => match state.pending_confirmation.take() {
            Some(PendingConfirmation::DeleteProject(id)) => {
                state.store.delete_project(&id)?;
                if state.active_project.as_ref() == Some(&id) {
                    state.return_to_list();
                }
                if state.editing_project.as_ref() == Some(&id) {
                    state.editing_project = None;
                }
                Ok(vec![Effect::Persist])
            }
            Some(PendingConfirmation::DeleteCard {
                project_id,
                card_id,
            }) => delete_card(state, &project_id, card_id, now),
            None => Err(ActionError::NothingToConfirm),
        },
        Action::Cancel => {
            state.pending_confirmation = None;
            Ok(Vec::new())
        }
        Action::ExportProject(id) => {
            let project = state
                .store
                .get(&id)
                .ok_or(StoreError::ProjectNotFound(id))?;
            Ok(vec![Effect::Export(export_project(project)?)])
        }
        Action::ImportProject { json } => {
            let project = import_project(&json, now)?;
            let id = state.store.insert_project(project)?;
            Ok(vec![Effect::Persist, Effect::ProjectImported(id)])
        }
        Action::SetOnline(online) => {
            state.online = online;
            if state.sync_status == SyncStatus::Disabled {
                return Ok(Vec::new());
            }
            if online {
                if state.sync_status == SyncStatus::Offline {
                    state.sync_status = SyncStatus::Idle;
                }
                Ok(vec![Effect::SyncNow])
            } else {
                state.sync_status = SyncStatus::Offline;
                Ok(Vec::new())
            }
        }
        Action::ReplaceStore(store) => {
            state.store = store;
            let active_missing = state
                .active_project
                .as_ref()
                .is_some_and(|id| !state.store.contains(id));
            if active_missing {
                state.return_to_list();
            }
            if state
                .editing_project
                .as_ref()
                .is_some_and(|id| !state.store.contains(id))
            {
                state.editing_project = None;
            }
            state.pending_confirmation = None;
            Ok(vec![Effect::SaveLocal])
        }
    }
}

fn active_project_id(state: &AppState) -> Result<ProjectId, ActionError> {
    match (&state.view, &state.active_project) {
        (View::Board, Some(id)) if state.store.contains(id) => Ok(id.clone()),
        _ => Err(ActionError::NoActiveProject),
    }
}

fn delete_card(
    state: &mut AppState,
    project_id: &ProjectId,
    card_id: CardId,
    now: DateTime<Utc>,
) -> Result<Vec<Effect>, ActionError> {
    state.store.delete_card(project_id, card_id, now)?;
    state.editing_card = None;
    Ok(vec![Effect::Persist])
}
