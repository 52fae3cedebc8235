use chrono::{DateTime, Duration, TimeZone, Utc};
use storycards_core::{
    update, Action, ActionError, AppSettings, AppState, CardField, Effect, NewCard,
    PendingConfirmation, PlaceholderPolicy, Project, ProjectId, StoreError, SyncStatus, View,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
}

fn state_with_project(name: &str) -> (AppState, ProjectId) {
    let mut state = AppState::default();
    update(
        &mut state,
        Action::CreateProject {
            name: name.to_string(),
        },
        t0(),
    )
    .unwrap();
    let id = state.active_project.clone().expect("project should be active");
    (state, id)
}

fn card_titles(state: &AppState) -> Vec<String> {
    state
        .current_project()
        .unwrap()
        .cards
        .iter()
        .map(|card| card.title.clone())
        .collect()
}

#[test]
fn create_project_opens_board_and_persists() {
    let mut state = AppState::default();
    update(&mut state, Action::ShowCreateProject, t0()).unwrap();
    assert!(state.show_create_project);

    let effects = update(
        &mut state,
        Action::CreateProject {
            name: "Draft A".to_string(),
        },
        t0(),
    )
    .unwrap();

    assert_eq!(effects, vec![Effect::Persist]);
    assert_eq!(state.view, View::Board);
    assert!(!state.show_create_project);
    let project = state.current_project().unwrap();
    assert_eq!(project.name, "Draft A");
    assert_eq!(project.cards.len(), 1);
}

#[test]
fn blank_project_name_is_a_noop() {
    let mut state = AppState::default();
    update(&mut state, Action::ShowCreateProject, t0()).unwrap();
    let before = state.clone();

    let err = update(
        &mut state,
        Action::CreateProject {
            name: "   ".to_string(),
        },
        t0(),
    )
    .unwrap_err();

    assert!(matches!(err, ActionError::Store(StoreError::BlankName)));
    assert_eq!(state, before);
}

#[test]
fn draft_scenario_reorders_new_card_first_and_exports() {
    let (mut state, id) = state_with_project("Draft A");
    update(
        &mut state,
        Action::AddCard(NewCard {
            title: "Ch1".to_string(),
            content: "...".to_string(),
            position: None,
        }),
        t0() + Duration::seconds(1),
    )
    .unwrap();
    update(
        &mut state,
        Action::ReorderCards { from: 1, to: 0 },
        t0() + Duration::seconds(2),
    )
    .unwrap();

    let effects = update(&mut state, Action::ExportProject(id.clone()), t0()).unwrap();
    let [Effect::Export(file)] = effects.as_slice() else {
        panic!("expected one export effect, got {effects:?}");
    };
    assert_eq!(file.file_name, "Draft_A.json");

    let parsed: Project = serde_json::from_str(&file.contents).unwrap();
    assert_eq!(parsed.id, id);
    assert_eq!(parsed.cards[0].title, "Ch1");
    assert_eq!(parsed.cards.len(), 2);
}

#[test]
fn reorder_to_same_index_emits_no_effects() {
    let (mut state, _) = state_with_project("Draft");
    let effects = update(&mut state, Action::ReorderCards { from: 0, to: 0 }, t0()).unwrap();
    assert!(effects.is_empty());
}

#[test]
fn deleting_active_project_returns_to_list() {
    let (mut state, id) = state_with_project("Doomed");
    update(&mut state, Action::BeginEditCard(1), t0()).unwrap();

    update(&mut state, Action::RequestDeleteProject(id.clone()), t0()).unwrap();
    assert_eq!(
        state.pending_confirmation,
        Some(PendingConfirmation::DeleteProject(id.clone()))
    );
    assert!(state.store.contains(&id), "nothing is deleted before confirm");

    let effects = update(&mut state, Action::Confirm, t0()).unwrap();
    assert_eq!(effects, vec![Effect::Persist]);
    assert!(!state.store.contains(&id));
    assert_eq!(state.view, View::ProjectList);
    assert!(state.active_project.is_none());
    assert!(state.editing_card.is_none());
    assert!(state.pending_confirmation.is_none());
}

#[test]
fn deleting_other_project_keeps_active_state() {
    let (mut state, first) = state_with_project("First");
    update(
        &mut state,
        Action::CreateProject {
            name: "Second".to_string(),
        },
        t0(),
    )
    .unwrap();
    let second = state.active_project.clone().unwrap();

    update(&mut state, Action::RequestDeleteProject(first.clone()), t0()).unwrap();
    update(&mut state, Action::Confirm, t0()).unwrap();

    assert!(!state.store.contains(&first));
    assert_eq!(state.active_project, Some(second));
    assert_eq!(state.view, View::Board);
}

#[test]
fn cancel_drops_pending_confirmation() {
    let (mut state, id) = state_with_project("Keep");
    update(&mut state, Action::RequestDeleteProject(id.clone()), t0()).unwrap();
    let effects = update(&mut state, Action::Cancel, t0()).unwrap();
    assert!(effects.is_empty());
    assert!(state.pending_confirmation.is_none());
    assert!(state.store.contains(&id));

    let err = update(&mut state, Action::Confirm, t0()).unwrap_err();
    assert!(matches!(err, ActionError::NothingToConfirm));
}

#[test]
fn card_delete_confirmation_follows_settings() {
    let (mut state, _) = state_with_project("Cards");
    update(&mut state, Action::BeginEditCard(1), t0()).unwrap();
    update(&mut state, Action::RequestDeleteCard(1), t0()).unwrap();
    assert!(matches!(
        state.pending_confirmation,
        Some(PendingConfirmation::DeleteCard { card_id: 1, .. })
    ));
    update(&mut state, Action::Confirm, t0()).unwrap();
    assert!(state.current_project().unwrap().cards.is_empty());
    assert!(state.editing_card.is_none());

    let mut state = AppState::new(
        Default::default(),
        AppSettings {
            placeholder_policy: PlaceholderPolicy::Deferred,
            confirm_card_delete: false,
        },
    );
    update(
        &mut state,
        Action::CreateProject {
            name: "Quick".to_string(),
        },
        t0(),
    )
    .unwrap();
    let effects = update(&mut state, Action::RequestDeleteCard(1), t0()).unwrap();
    assert_eq!(effects, vec![Effect::Persist]);
    assert!(state.pending_confirmation.is_none());
    assert!(state.current_project().unwrap().cards.is_empty());
}

#[test]
fn edit_card_updates_field_and_timestamp() {
    let (mut state, _) = state_with_project("Edits");
    update(&mut state, Action::AddCard(NewCard::default()), t0()).unwrap();
    let card_id = state.current_project().unwrap().cards[1].id;
    assert!(state.current_project().unwrap().cards[1].is_placeholder);

    let later = t0() + Duration::minutes(5);
    update(
        &mut state,
        Action::EditCard {
            card_id,
            field: CardField::Title,
            value: "The Heist".to_string(),
        },
        later,
    )
    .unwrap();

    let project = state.current_project().unwrap();
    assert_eq!(project.cards[1].title, "The Heist");
    assert!(!project.cards[1].is_placeholder);
    assert_eq!(project.last_modified, later);
    assert_eq!(card_titles(&state)[1], "The Heist");
}

#[test]
fn card_actions_require_open_board() {
    let (mut state, _) = state_with_project("Board");
    update(&mut state, Action::Back, t0()).unwrap();
    assert_eq!(state.view, View::ProjectList);

    let err = update(&mut state, Action::AddCard(NewCard::default()), t0()).unwrap_err();
    assert!(matches!(err, ActionError::NoActiveProject));
}

#[test]
fn rename_clears_inline_editor_only_on_success() {
    let (mut state, id) = state_with_project("Old");
    update(&mut state, Action::BeginRename(id.clone()), t0()).unwrap();

    let blank = Action::RenameProject {
        id: id.clone(),
        name: " ".to_string(),
    };
    assert!(update(&mut state, blank, t0()).is_err());
    assert_eq!(state.editing_project, Some(id.clone()));

    let rename = Action::RenameProject {
        id: id.clone(),
        name: "New".to_string(),
    };
    update(&mut state, rename, t0()).unwrap();
    assert!(state.editing_project.is_none());
    assert_eq!(state.store.get(&id).unwrap().name, "New");
}

#[test]
fn import_adds_distinct_project() {
    let (mut state, id) = state_with_project("Saga");
    let json = serde_json::to_string(state.store.get(&id).unwrap()).unwrap();

    let effects = update(&mut state, Action::ImportProject { json }, t0()).unwrap();
    assert_eq!(effects.len(), 2);
    assert_eq!(state.store.len(), 2);
    assert!(state
        .store
        .iter()
        .any(|project| project.name == "Saga (Imported)"));

    let err = update(
        &mut state,
        Action::ImportProject {
            json: "{".to_string(),
        },
        t0(),
    )
    .unwrap_err();
    assert!(matches!(err, ActionError::Export(_)));
    assert_eq!(state.store.len(), 2);
}

#[test]
fn going_offline_and_back_requests_sync() {
    let mut state = AppState::default();
    update(&mut state, Action::SetOnline(false), t0()).unwrap();
    assert_eq!(state.sync_status, SyncStatus::Offline);

    let effects = update(&mut state, Action::SetOnline(true), t0()).unwrap();
    assert_eq!(effects, vec![Effect::SyncNow]);
    assert_eq!(state.sync_status, SyncStatus::Idle);
}

#[test]
fn replacing_store_drops_stale_active_project() {
    let (mut state, _) = state_with_project("Local only");
    let effects = update(&mut state, Action::ReplaceStore(Default::default()), t0()).unwrap();
    assert_eq!(effects, vec![Effect::SaveLocal]);
    assert_eq!(state.view, View::ProjectList);
    assert!(state.active_project.is_none());
}
