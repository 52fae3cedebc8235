//! Project export and import.
//!
//! # Responsibility
//! - Render one project as a pretty-printed JSON download.
//! - Derive a filesystem-safe export filename from the project name.
//! - Accept a previously exported project as a new, distinct project.
//!
//! # Invariants
//! - Export output parses back to the same `id`, `name` and `cards`.
//! - Import never reuses the id found in the file.
//! - A failed import inserts nothing.

use crate::model::project::{Project, ProjectId};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NON_ALPHANUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("valid filename regex"));

pub const IMPORTED_NAME_SUFFIX: &str = " (Imported)";

/// A rendered export artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Errors from project export/import.
#[derive(Debug)]
pub enum ExportError {
    /// Import input is not a project-shaped JSON document.
    InvalidImport(serde_json::Error),
    Serialize(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImport(err) => write!(f, "import file is not a valid project: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize project: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidImport(err) | Self::Serialize(err) => Some(err),
        }
    }
}

/// Maps every character outside `[A-Za-z0-9]` to `_` and appends `.json`.
pub fn export_filename(project_name: &str) -> String {
    format!(
        "{}.json",
        NON_ALPHANUMERIC_RE.replace_all(project_name, "_")
    )
}

/// Renders `project` as a downloadable JSON file.
pub fn export_project(project: &Project) -> Result<ExportFile, ExportError> {
    let contents = serde_json::to_string_pretty(project).map_err(ExportError::Serialize)?;
    Ok(ExportFile {
        file_name: export_filename(&project.name),
        contents,
    })
}

/// Parses an exported project and prepares it for insertion.
///
/// The result carries a fresh id, the ` (Imported)` name suffix and
/// `last_modified = now`. Cards are kept as-is; no schema checks beyond
/// successful parsing are applied.
pub fn import_project(json: &str, now: DateTime<Utc>) -> Result<Project, ExportError> {
    let mut project: Project = serde_json::from_str(json).map_err(ExportError::InvalidImport)?;
    project.id = ProjectId::generate();
    project.name.push_str(IMPORTED_NAME_SUFFIX);
    if project.created > now {
        project.created = now;
    }
    project.last_modified = now;
    Ok(project)
}
