//! Story Cards command-line driver.
//!
//! # Responsibility
//! - Parse flags and subcommands, then run them against one session.
//! - Let flags override the `STORYCARDS_*` environment.
//!
//! # Invariants
//! - Pending remote pushes are flushed before the process exits.
//! - Destructive commands ask on stdin unless `--yes` is given.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use storycards_core::{init_logging, AppConfig, StorageBackend, SyncConfig};

#[derive(Parser)]
#[command(name = "storycards")]
#[command(about = "Manage story projects and their scene cards")]
#[command(version)]
struct Cli {
    /// SQLite store path.
    #[arg(long, global = true, conflicts_with_all = ["store_file", "memory"])]
    db: Option<PathBuf>,
    /// Plain JSON store file instead of SQLite.
    #[arg(long, global = true, conflicts_with = "memory")]
    store_file: Option<PathBuf>,
    /// Keep everything in memory for this run.
    #[arg(long, global = true, default_value_t = false)]
    memory: bool,
    /// Directory for rolling log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Push changes to the remote data file.
    #[arg(long, global = true, default_value_t = false)]
    sync: bool,
    /// Remote token; prefer STORYCARDS_SYNC_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List projects, most recently modified first.
    List,
    /// Print the cards of a project.
    Show { project: String },
    Create { name: String },
    Rename { project: String, name: String },
    Delete {
        project: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    AddCard {
        project: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Zero-based insert position; appends when omitted.
        #[arg(long)]
        position: Option<usize>,
    },
    EditCard {
        project: String,
        card_id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    DeleteCard {
        project: String,
        card_id: u64,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Move the card at index FROM to index TO.
    MoveCard {
        project: String,
        from: usize,
        to: usize,
    },
    /// Write `<name>.json` for a project.
    Export {
        project: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    Import { file: PathBuf },
    /// Push the whole store to the remote now.
    Sync,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match commands::run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    let mut config = AppConfig::from_env().map_err(|err| err.to_string())?;
    apply_overrides(&mut config, cli);
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if cli.memory {
        config.storage = StorageBackend::Memory;
    } else if let Some(path) = &cli.store_file {
        config.storage = StorageBackend::JsonFile(path.clone());
    } else if let Some(path) = &cli.db {
        config.storage = StorageBackend::Sqlite(path.clone());
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if cli.sync && config.sync.is_none() {
        config.sync = Some(SyncConfig::default());
    }
    if let (Some(sync), Some(token)) = (config.sync.as_mut(), &cli.token) {
        sync.token = Some(token.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("storycards").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn storage_flags_override_environment() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &parse(&["--memory", "list"]));
        assert_eq!(config.storage, StorageBackend::Memory);

        let mut config = AppConfig::default();
        apply_overrides(&mut config, &parse(&["list", "--store-file", "cards.json"]));
        assert_eq!(
            config.storage,
            StorageBackend::JsonFile(PathBuf::from("cards.json"))
        );
    }

    #[test]
    fn conflicting_storage_flags_are_rejected() {
        let result = Cli::try_parse_from(["storycards", "--db", "a.db", "--memory", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn sync_flag_enables_default_remote() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &parse(&["--sync", "--token", "t", "sync"]));
        let sync = config.sync.unwrap();
        assert_eq!(sync.target.owner, "yexod");
        assert_eq!(sync.token.as_deref(), Some("t"));
    }

    #[test]
    fn token_without_sync_is_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &parse(&["--token", "t", "list"]));
        assert!(config.sync.is_none());
    }

    #[test]
    fn add_card_defaults_to_blank_fields() {
        let cli = parse(&["add-card", "Draft A"]);
        match cli.command {
            Commands::AddCard {
                project,
                title,
                content,
                position,
            } => {
                assert_eq!(project, "Draft A");
                assert!(title.is_empty());
                assert!(content.is_empty());
                assert_eq!(position, None);
            }
            _ => panic!("expected add-card"),
        }
    }
}
