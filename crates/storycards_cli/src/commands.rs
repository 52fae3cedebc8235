//! Subcommand execution over a `StoryCardsSession`.

use crate::Commands;
use log::info;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;
use storycards_core::{
    Action, AppConfig, CardField, NewCard, Project, ProjectId, ProjectStore, StoryCardsSession,
    SyncStatus,
};

const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn run(config: &AppConfig, command: Commands) -> Result<(), String> {
    let mut session =
        StoryCardsSession::open(config).map_err(|err| format!("cannot open store: {err}"))?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    execute(&mut session, command, &mut stdin.lock(), &mut stdout)?;

    match session.flush(FLUSH_TIMEOUT) {
        SyncStatus::Error => Err("remote sync failed; changes are saved locally".to_string()),
        SyncStatus::Syncing => Err("remote sync did not finish in time".to_string()),
        _ => Ok(()),
    }
}

fn execute(
    session: &mut StoryCardsSession,
    command: Commands,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), String> {
    match command {
        Commands::List => {
            let store = &session.state().store;
            if store.is_empty() {
                return print(out, "No projects yet.");
            }
            for project in store.list_by_recent() {
                print(
                    out,
                    &format!(
                        "{}  {}  ({} cards, modified {})",
                        project.id,
                        project.name,
                        project.cards.len(),
                        project.last_modified.format("%Y-%m-%d %H:%M")
                    ),
                )?;
            }
            Ok(())
        }
        Commands::Show { project } => {
            let id = resolve_project(&session.state().store, &project)?;
            let Some(project) = session.state().store.get(&id) else {
                return Err(format!("project `{id}` not found"));
            };
            print(out, &format!("{} [{}]", project.name, project.id))?;
            for (index, card) in project.cards.iter().enumerate() {
                print(
                    out,
                    &format!("{index:>3}. #{} {}", card.id, card.display_title()),
                )?;
                for line in card.display_content().lines() {
                    print(out, &format!("       {line}"))?;
                }
            }
            Ok(())
        }
        Commands::Create { name } => {
            dispatch(session, Action::CreateProject { name })?;
            let id = session
                .state()
                .active_project
                .clone()
                .ok_or_else(|| "project was not created".to_string())?;
            print(out, &format!("Created {id}"))
        }
        Commands::Rename { project, name } => {
            let id = resolve_project(&session.state().store, &project)?;
            dispatch(session, Action::RenameProject { id, name })?;
            print(out, "Renamed.")
        }
        Commands::Delete { project, yes } => {
            let id = resolve_project(&session.state().store, &project)?;
            dispatch(session, Action::RequestDeleteProject(id))?;
            confirm_or_cancel(session, yes, input, out)
        }
        Commands::AddCard {
            project,
            title,
            content,
            position,
        } => {
            open_board(session, &project)?;
            dispatch(
                session,
                Action::AddCard(NewCard {
                    title,
                    content,
                    position,
                }),
            )?;
            print(out, "Card added.")
        }
        Commands::EditCard {
            project,
            card_id,
            title,
            content,
        } => {
            if title.is_none() && content.is_none() {
                return Err("nothing to change; pass --title and/or --content".to_string());
            }
            open_board(session, &project)?;
            let edits = [(CardField::Title, title), (CardField::Content, content)];
            for (field, value) in edits {
                if let Some(value) = value {
                    dispatch(
                        session,
                        Action::EditCard {
                            card_id,
                            field,
                            value,
                        },
                    )?;
                }
            }
            print(out, "Card updated.")
        }
        Commands::DeleteCard {
            project,
            card_id,
            yes,
        } => {
            open_board(session, &project)?;
            dispatch(session, Action::RequestDeleteCard(card_id))?;
            if session.state().pending_confirmation.is_none() {
                return print(out, "Deleted.");
            }
            confirm_or_cancel(session, yes, input, out)
        }
        Commands::MoveCard { project, from, to } => {
            open_board(session, &project)?;
            dispatch(session, Action::ReorderCards { from, to })?;
            print(out, "Moved.")
        }
        Commands::Export { project, out_dir } => {
            let id = resolve_project(&session.state().store, &project)?;
            let files = session
                .dispatch(Action::ExportProject(id))
                .map_err(|err| err.to_string())?;
            for file in files {
                let path = out_dir.join(&file.file_name);
                std::fs::write(&path, file.contents)
                    .map_err(|err| format!("cannot write {}: {err}", path.display()))?;
                info!(
                    "event=project_export module=cli status=ok file={}",
                    file.file_name
                );
                print(out, &format!("Wrote {}", path.display()))?;
            }
            Ok(())
        }
        Commands::Import { file } => {
            let json = read_file(&file)?;
            dispatch(session, Action::ImportProject { json })?;
            match session.last_imported() {
                Some(id) => print(out, &format!("Imported {id}")),
                None => print(out, "Imported."),
            }
        }
        Commands::Sync => {
            if session.sync_status() == SyncStatus::Disabled {
                return Err("remote sync is not enabled; pass --sync".to_string());
            }
            if !session.sync_now() {
                return print(out, "Nothing to push.");
            }
            let status = session.flush(FLUSH_TIMEOUT);
            print(out, &format!("Sync: {}", status.label()))
        }
    }
}

fn dispatch(session: &mut StoryCardsSession, action: Action) -> Result<(), String> {
    session
        .dispatch(action)
        .map(|_| ())
        .map_err(|err| err.to_string())
}

fn open_board(session: &mut StoryCardsSession, project: &str) -> Result<(), String> {
    let id = resolve_project(&session.state().store, project)?;
    dispatch(session, Action::OpenProject(id))
}

fn confirm_or_cancel(
    session: &mut StoryCardsSession,
    yes: bool,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), String> {
    let Some(pending) = session.state().pending_confirmation.clone() else {
        return Ok(());
    };
    let accepted = yes || ask(pending.prompt(), input, out)?;
    if accepted {
        dispatch(session, Action::Confirm)?;
        print(out, "Deleted.")
    } else {
        dispatch(session, Action::Cancel)?;
        print(out, "Cancelled.")
    }
}

fn ask(prompt: &str, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<bool, String> {
    write!(out, "{prompt} [y/N] ").map_err(|err| err.to_string())?;
    out.flush().map_err(|err| err.to_string())?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|err| format!("cannot read answer: {err}"))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Finds a project by exact id, then by unique name.
fn resolve_project(store: &ProjectStore, needle: &str) -> Result<ProjectId, String> {
    let id = ProjectId::from(needle);
    if store.contains(&id) {
        return Ok(id);
    }
    let matches = store
        .iter()
        .filter(|project| project.name == needle.trim())
        .collect::<Vec<&Project>>();
    match matches.as_slice() {
        [project] => Ok(project.id.clone()),
        [] => Err(format!("no project named or with id `{needle}`")),
        _ => Err(format!(
            "{} projects are named `{needle}`; use the id instead",
            matches.len()
        )),
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("cannot read {}: {err}", path.display()))
}

fn print(out: &mut dyn Write, line: &str) -> Result<(), String> {
    writeln!(out, "{line}").map_err(|err| err.to_string())
}
