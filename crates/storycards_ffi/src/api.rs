//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the single process-wide `StoryCardsSession` behind a mutex.
//! - Flatten core types into plain envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every card operation names its project explicitly; the session's
//!   active project is switched under the same lock.
//! - Failures are reported in envelopes, never as Rust errors.

use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use storycards_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Action, ActionError, AppConfig, CardField, NewCard, Project, ProjectId, StorageBackend,
    StoryCardsSession, View,
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

static SESSION: OnceLock<Mutex<Option<StoryCardsSession>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Project row for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub card_count: u32,
    /// Last modification as epoch milliseconds.
    pub last_modified_ms: i64,
}

/// Card as rendered on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardItem {
    pub id: u64,
    /// Display title; placeholder text when the card has none yet.
    pub title: String,
    pub content: String,
    pub is_placeholder: bool,
}

/// Board view of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub project_id: String,
    pub name: String,
    pub cards: Vec<CardItem>,
    /// Card currently open in the editor.
    pub editing_card: Option<u64>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Project affected by the action, when there is one.
    pub project_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, project_id: Option<String>) -> Self {
        Self {
            ok: true,
            project_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            project_id: None,
            message: message.into(),
        }
    }
}

/// Export result; `contents` is the pretty-printed project JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub contents: String,
    pub message: String,
}

/// Opens (or reopens) the process session.
///
/// `store_path = None` reads the `STORYCARDS_*` environment; `Some(path)`
/// uses a SQLite store at `path` with other settings from the environment.
///
/// # FFI contract
/// - Replaces any open session; its pending sync is pushed on drop.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn open_session(store_path: Option<String>) -> String {
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => return format!("open_session failed: {err}"),
    };
    if let Some(path) = store_path.map(|raw| raw.trim().to_string()) {
        if path.is_empty() {
            return "open_session failed: store path must not be empty".to_string();
        }
        config.storage = StorageBackend::Sqlite(PathBuf::from(path));
    }
    match StoryCardsSession::open(&config) {
        Ok(session) => {
            // Previous session is dropped after the lock is released.
            let previous = lock_session().replace(session);
            drop(previous);
            String::new()
        }
        Err(err) => format!("open_session failed: {err}"),
    }
}

/// Lists projects, most recently modified first.
#[flutter_rust_bridge::frb(sync)]
pub fn list_projects() -> Vec<ProjectSummary> {
    with_session(|session| {
        session
            .state()
            .store
            .list_by_recent()
            .into_iter()
            .map(to_project_summary)
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|err| {
        warn!("event=ffi_list_projects module=ffi status=error error={err}");
        Vec::new()
    })
}

/// Creates a project and opens its board.
#[flutter_rust_bridge::frb(sync)]
pub fn create_project(name: String) -> ActionResponse {
    run_action("create_project", |session| {
        session.dispatch(Action::CreateProject { name })?;
        Ok(active_project(session))
    })
}

/// Opens the board of an existing project.
#[flutter_rust_bridge::frb(sync)]
pub fn open_project(project_id: String) -> ActionResponse {
    run_action("open_project", |session| {
        session.dispatch(Action::OpenProject(ProjectId::from(project_id)))?;
        Ok(active_project(session))
    })
}

/// Leaves the board and returns to the project list.
#[flutter_rust_bridge::frb(sync)]
pub fn go_back() -> ActionResponse {
    run_action("go_back", |session| {
        session.dispatch(Action::Back)?;
        Ok(None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn rename_project(project_id: String, name: String) -> ActionResponse {
    run_action("rename_project", |session| {
        let id = ProjectId::from(project_id);
        session.dispatch(Action::RenameProject {
            id: id.clone(),
            name,
        })?;
        Ok(Some(id.to_string()))
    })
}

/// Asks for confirmation before deleting a project.
///
/// The response message carries the prompt; follow with
/// `confirm_pending` or `cancel_pending`.
#[flutter_rust_bridge::frb(sync)]
pub fn request_delete_project(project_id: String) -> ActionResponse {
    run_prompt("request_delete_project", |session| {
        session.dispatch(Action::RequestDeleteProject(ProjectId::from(project_id)))?;
        Ok(())
    })
}

/// Executes the pending confirmation, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn confirm_pending() -> ActionResponse {
    run_action("confirm_pending", |session| {
        session.dispatch(Action::Confirm)?;
        Ok(active_project(session))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn cancel_pending() -> ActionResponse {
    run_action("cancel_pending", |session| {
        session.dispatch(Action::Cancel)?;
        Ok(None)
    })
}

/// Adds a card; `position = None` appends it.
#[flutter_rust_bridge::frb(sync)]
pub fn add_card(
    project_id: String,
    title: String,
    content: String,
    position: Option<u32>,
) -> ActionResponse {
    run_action("add_card", |session| {
        let id = open_board(session, project_id)?;
        session.dispatch(Action::AddCard(NewCard {
            title,
            content,
            position: position.map(|value| value as usize),
        }))?;
        Ok(Some(id.to_string()))
    })
}

/// Updates one card field; `field` is `title` or `content`.
#[flutter_rust_bridge::frb(sync)]
pub fn edit_card(project_id: String, card_id: u64, field: String, value: String) -> ActionResponse {
    let Some(field) = parse_card_field(&field) else {
        return ActionResponse::failure(format!(
            "edit_card failed: unknown field `{field}`, expected title|content"
        ));
    };
    run_action("edit_card", |session| {
        let id = open_board(session, project_id)?;
        session.dispatch(Action::EditCard {
            card_id,
            field,
            value,
        })?;
        Ok(Some(id.to_string()))
    })
}

/// Marks a card as being edited.
#[flutter_rust_bridge::frb(sync)]
pub fn begin_edit_card(project_id: String, card_id: u64) -> ActionResponse {
    run_action("begin_edit_card", |session| {
        let id = open_board(session, project_id)?;
        session.dispatch(Action::BeginEditCard(card_id))?;
        Ok(Some(id.to_string()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn end_edit_card() -> ActionResponse {
    run_action("end_edit_card", |session| {
        session.dispatch(Action::EndEditCard)?;
        Ok(active_project(session))
    })
}

/// Deletes a card, or asks for confirmation when that setting is on.
///
/// `ok` with a non-empty `message` means a prompt is pending.
#[flutter_rust_bridge::frb(sync)]
pub fn request_delete_card(project_id: String, card_id: u64) -> ActionResponse {
    run_prompt("request_delete_card", |session| {
        open_board(session, project_id)?;
        session.dispatch(Action::RequestDeleteCard(card_id))?;
        Ok(())
    })
}

/// Moves the card at `from` to index `to`.
#[flutter_rust_bridge::frb(sync)]
pub fn move_card(project_id: String, from: u32, to: u32) -> ActionResponse {
    run_action("move_card", |session| {
        let id = open_board(session, project_id)?;
        session.dispatch(Action::ReorderCards {
            from: from as usize,
            to: to as usize,
        })?;
        Ok(Some(id.to_string()))
    })
}

/// Returns the open board, or `None` on the project list.
#[flutter_rust_bridge::frb(sync)]
pub fn current_board() -> Option<BoardSnapshot> {
    with_session(|session| {
        let state = session.state();
        if state.view != View::Board {
            return None;
        }
        let project = state.current_project()?;
        Some(BoardSnapshot {
            project_id: project.id.to_string(),
            name: project.name.clone(),
            cards: project
                .cards
                .iter()
                .map(|card| CardItem {
                    id: card.id,
                    title: card.display_title().to_string(),
                    content: card.display_content().to_string(),
                    is_placeholder: card.is_placeholder,
                })
                .collect(),
            editing_card: state.editing_card,
        })
    })
    .unwrap_or_else(|err| {
        warn!("event=ffi_current_board module=ffi status=error error={err}");
        None
    })
}

/// Serializes a project for download.
#[flutter_rust_bridge::frb(sync)]
pub fn export_project(project_id: String) -> ExportResponse {
    let result = with_session(|session| {
        session
            .dispatch(Action::ExportProject(ProjectId::from(project_id)))
            .map_err(|err| err.to_string())
    })
    .and_then(|inner| inner);
    match result.map(|files| files.into_iter().next()) {
        Ok(Some(file)) => ExportResponse {
            ok: true,
            message: format!("Exported {}.", file.file_name),
            file_name: file.file_name,
            contents: file.contents,
        },
        Ok(None) => export_failure("nothing to export".to_string()),
        Err(err) => export_failure(err),
    }
}

/// Imports an exported project under a fresh id.
#[flutter_rust_bridge::frb(sync)]
pub fn import_project(json: String) -> ActionResponse {
    run_action("import_project", |session| {
        session.dispatch(Action::ImportProject { json })?;
        Ok(session.last_imported().map(ToString::to_string))
    })
}

/// Sync indicator label (`Ready`, `Syncing...`, `Sync Error`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn sync_status() -> String {
    with_session(|session| session.sync_status().label().to_string())
        .unwrap_or_else(|err| format!("sync_status failed: {err}"))
}

/// Reports connectivity changes from the host platform.
#[flutter_rust_bridge::frb(sync)]
pub fn set_online(online: bool) -> ActionResponse {
    run_action("set_online", |session| {
        session.dispatch(Action::SetOnline(online))?;
        Ok(None)
    })
}

/// Pushes pending changes and waits for the result.
///
/// # FFI contract
/// - Blocking call; do not invoke on the UI thread.
#[flutter_rust_bridge::frb]
pub fn flush_sync() -> String {
    with_session(|session| session.flush(FLUSH_TIMEOUT).label().to_string())
        .unwrap_or_else(|err| format!("flush_sync failed: {err}"))
}

fn lock_session() -> MutexGuard<'static, Option<StoryCardsSession>> {
    SESSION
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn with_session<T>(f: impl FnOnce(&mut StoryCardsSession) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    if guard.is_none() {
        let config =
            AppConfig::from_env().map_err(|err| format!("session config invalid: {err}"))?;
        let session =
            StoryCardsSession::open(&config).map_err(|err| format!("session open failed: {err}"))?;
        *guard = Some(session);
    }
    match guard.as_mut() {
        Some(session) => Ok(f(session)),
        None => Err("session unavailable".to_string()),
    }
}

fn run_action(
    op: &str,
    f: impl FnOnce(&mut StoryCardsSession) -> Result<Option<String>, ActionError>,
) -> ActionResponse {
    match with_session(f) {
        Ok(Ok(project_id)) => ActionResponse::success("OK", project_id),
        Ok(Err(err)) => ActionResponse::failure(format!("{op} failed: {err}")),
        Err(err) => ActionResponse::failure(format!("{op} failed: {err}")),
    }
}

/// Like `run_action`, but reports the pending confirmation prompt.
fn run_prompt(
    op: &str,
    f: impl FnOnce(&mut StoryCardsSession) -> Result<(), ActionError>,
) -> ActionResponse {
    let result = with_session(|session| {
        f(session)?;
        let prompt = session
            .state()
            .pending_confirmation
            .as_ref()
            .map(|pending| pending.prompt().to_string())
            .unwrap_or_default();
        Ok::<_, ActionError>((prompt, active_project(session)))
    });
    match result {
        Ok(Ok((prompt, project_id))) => ActionResponse::success(prompt, project_id),
        Ok(Err(err)) => ActionResponse::failure(format!("{op} failed: {err}")),
        Err(err) => ActionResponse::failure(format!("{op} failed: {err}")),
    }
}

fn open_board(
    session: &mut StoryCardsSession,
    project_id: String,
) -> Result<ProjectId, ActionError> {
    let id = ProjectId::from(project_id);
    if session.state().active_project.as_ref() != Some(&id) || session.state().view != View::Board
    {
        session.dispatch(Action::OpenProject(id.clone()))?;
    }
    Ok(id)
}

fn active_project(session: &StoryCardsSession) -> Option<String> {
    session
        .state()
        .active_project
        .as_ref()
        .map(ToString::to_string)
}

fn parse_card_field(raw: &str) -> Option<CardField> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "title" => Some(CardField::Title),
        "content" => Some(CardField::Content),
        _ => None,
    }
}

fn to_project_summary(project: &Project) -> ProjectSummary {
    ProjectSummary {
        id: project.id.to_string(),
        name: project.name.clone(),
        card_count: u32::try_from(project.cards.len()).unwrap_or(u32::MAX),
        last_modified_ms: project.last_modified.timestamp_millis(),
    }
}

fn export_failure(message: String) -> ExportResponse {
    ExportResponse {
        ok: false,
        file_name: String::new(),
        contents: String::new(),
        message: format!("export_project failed: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests share the process-wide session.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn fresh_session() -> (MutexGuard<'static, ()>, tempfile::TempDir) {
        let guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffi.sqlite3");
        let error = open_session(Some(path.to_string_lossy().into_owned()));
        assert!(error.is_empty(), "{error}");
        (guard, dir)
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn open_session_rejects_blank_path() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(!open_session(Some("  ".to_string())).is_empty());
    }

    #[test]
    fn create_project_opens_board_with_welcome_card() {
        let (_guard, _dir) = fresh_session();
        let created = create_project("Draft A".to_string());
        assert!(created.ok, "{}", created.message);

        let board = current_board().expect("board should be open");
        assert_eq!(Some(board.project_id.clone()), created.project_id);
        assert_eq!(board.name, "Draft A");
        assert_eq!(board.cards.len(), 1);
        assert_eq!(board.cards[0].id, 1);

        let projects = list_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].card_count, 1);
    }

    #[test]
    fn blank_project_name_is_reported() {
        let (_guard, _dir) = fresh_session();
        let response = create_project("   ".to_string());
        assert!(!response.ok);
        assert!(response.message.starts_with("create_project failed"));
        assert!(list_projects().is_empty());
    }

    #[test]
    fn card_operations_follow_the_named_project() {
        let (_guard, _dir) = fresh_session();
        let first = create_project("First".to_string()).project_id.unwrap();
        let second = create_project("Second".to_string()).project_id.unwrap();

        let added = add_card(first.clone(), "Ch1".to_string(), String::new(), Some(0));
        assert!(added.ok, "{}", added.message);

        let board = current_board().unwrap();
        assert_eq!(board.project_id, first);
        assert_eq!(board.cards[0].title, "Ch1");
        assert_eq!(board.cards.len(), 2);

        let moved = move_card(second.clone(), 0, 0);
        assert!(moved.ok);
        assert_eq!(current_board().unwrap().project_id, second);
    }

    #[test]
    fn edit_card_validates_field_name() {
        let (_guard, _dir) = fresh_session();
        let id = create_project("Edits".to_string()).project_id.unwrap();

        let bad = edit_card(id.clone(), 1, "body".to_string(), "x".to_string());
        assert!(!bad.ok);

        let good = edit_card(id, 1, "Title".to_string(), "Opening".to_string());
        assert!(good.ok, "{}", good.message);
        assert_eq!(current_board().unwrap().cards[0].title, "Opening");
    }

    #[test]
    fn delete_project_waits_for_confirmation() {
        let (_guard, _dir) = fresh_session();
        let id = create_project("Doomed".to_string()).project_id.unwrap();

        let requested = request_delete_project(id.clone());
        assert!(requested.ok);
        assert!(!requested.message.is_empty());
        assert_eq!(list_projects().len(), 1);

        let confirmed = confirm_pending();
        assert!(confirmed.ok, "{}", confirmed.message);
        assert!(list_projects().is_empty());
        assert!(current_board().is_none());

        assert!(!confirm_pending().ok);
    }

    #[test]
    fn export_then_import_creates_copy() {
        let (_guard, _dir) = fresh_session();
        let id = create_project("Draft A".to_string()).project_id.unwrap();

        let exported = export_project(id.clone());
        assert!(exported.ok, "{}", exported.message);
        assert_eq!(exported.file_name, "Draft_A.json");

        let imported = import_project(exported.contents);
        assert!(imported.ok, "{}", imported.message);
        let imported_id = imported.project_id.unwrap();
        assert_ne!(imported_id, id);

        let names = list_projects()
            .into_iter()
            .map(|project| project.name)
            .collect::<Vec<_>>();
        assert!(names.contains(&"Draft A (Imported)".to_string()));
    }

    #[test]
    fn export_of_missing_project_fails() {
        let (_guard, _dir) = fresh_session();
        let response = export_project("missing".to_string());
        assert!(!response.ok);
        assert!(response.contents.is_empty());
    }

    #[test]
    fn local_only_session_reports_label() {
        let (_guard, _dir) = fresh_session();
        assert_eq!(sync_status(), "Local only");
        assert!(set_online(false).ok);
        assert_eq!(sync_status(), "Local only");
    }
}
