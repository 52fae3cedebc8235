//! In-memory project store and its mutation operations.
//!
//! # Responsibility
//! - Hold the project-id → project mapping that is persisted as one unit.
//! - Apply every project/card mutation and keep timestamps current.
//!
//! # Invariants
//! - Blank names are rejected before any state is touched.
//! - Every successful mutation of a project calls `Project::touch`.
//! - A rejected operation leaves the store unchanged.

use crate::model::card::{Card, CardField, CardId, PlaceholderPolicy};
use crate::model::project::{Project, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejections returned by store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Project name is empty after trimming.
    BlankName,
    ProjectNotFound(ProjectId),
    CardNotFound {
        project_id: ProjectId,
        card_id: CardId,
    },
    /// Reorder index outside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
    /// Insert would overwrite an existing project.
    DuplicateProject(ProjectId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "project name must not be blank"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::CardNotFound {
                project_id,
                card_id,
            } => write!(f, "card {card_id} not found in project {project_id}"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "card index {index} out of range for {len} card(s)")
            }
            Self::DuplicateProject(id) => write!(f, "project already exists: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Input for adding one card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    pub title: String,
    pub content: String,
    /// Insert position; `None` appends. Values past the end are clamped.
    pub position: Option<usize>,
}

/// Mapping of project id to project; the unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectStore {
    projects: BTreeMap<ProjectId, Project>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    /// Iterates projects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Returns projects most recently modified first, ties by id.
    pub fn list_by_recent(&self) -> Vec<&Project> {
        let mut projects = self.projects.values().collect::<Vec<_>>();
        projects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.id.cmp(&b.id))
        });
        projects
    }

    /// Creates a project seeded with the welcome card.
    pub fn create_project(&mut self, name: &str, now: DateTime<Utc>) -> StoreResult<ProjectId> {
        let name = normalize_name(name)?;
        let mut project = Project::new(name, now);
        while self.projects.contains_key(&project.id) {
            project.id = ProjectId::generate();
        }
        let id = project.id.clone();
        self.projects.insert(id.clone(), project);
        Ok(id)
    }

    /// Inserts an already-built project, e.g. from import.
    pub fn insert_project(&mut self, project: Project) -> StoreResult<ProjectId> {
        if self.projects.contains_key(&project.id) {
            return Err(StoreError::DuplicateProject(project.id));
        }
        let id = project.id.clone();
        self.projects.insert(id.clone(), project);
        Ok(id)
    }

    pub fn rename_project(
        &mut self,
        id: &ProjectId,
        name: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let name = normalize_name(name)?;
        let project = self.project_mut(id)?;
        project.name = name;
        project.touch(now);
        Ok(())
    }

    /// Removes a project and all of its cards. Irreversible.
    pub fn delete_project(&mut self, id: &ProjectId) -> StoreResult<Project> {
        self.projects
            .remove(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))
    }

    /// Appends or inserts one card and returns its id.
    pub fn add_card(
        &mut self,
        project_id: &ProjectId,
        card: NewCard,
        policy: PlaceholderPolicy,
        now: DateTime<Utc>,
    ) -> StoreResult<CardId> {
        let project = self.project_mut(project_id)?;
        let card_id = project.next_card_id();
        let position = card
            .position
            .map_or(project.cards.len(), |value| value.min(project.cards.len()));
        project.cards.insert(
            position,
            Card::from_input(card_id, &card.title, &card.content, policy),
        );
        project.touch(now);
        Ok(card_id)
    }

    /// Replaces one card field.
    pub fn edit_card(
        &mut self,
        project_id: &ProjectId,
        card_id: CardId,
        field: CardField,
        value: impl Into<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let project = self.project_mut(project_id)?;
        let index = project
            .card_index(card_id)
            .ok_or_else(|| StoreError::CardNotFound {
                project_id: project_id.clone(),
                card_id,
            })?;
        project.cards[index].set_field(field, value);
        project.touch(now);
        Ok(())
    }

    /// Removes exactly one card, keeping the order of the others.
    pub fn delete_card(
        &mut self,
        project_id: &ProjectId,
        card_id: CardId,
        now: DateTime<Utc>,
    ) -> StoreResult<Card> {
        let project = self.project_mut(project_id)?;
        let index = project
            .card_index(card_id)
            .ok_or_else(|| StoreError::CardNotFound {
                project_id: project_id.clone(),
                card_id,
            })?;
        let removed = project.cards.remove(index);
        project.touch(now);
        Ok(removed)
    }

    /// Moves the card at `from` so it ends up at `to`.
    ///
    /// Returns `false` without touching the project when `from == to`.
    pub fn reorder_cards(
        &mut self,
        project_id: &ProjectId,
        from: usize,
        to: usize,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let project = self.project_mut(project_id)?;
        let len = project.cards.len();
        for index in [from, to] {
            if index >= len {
                return Err(StoreError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(false);
        }

        let moved = project.cards.remove(from);
        project.cards.insert(to, moved);
        project.touch(now);
        Ok(true)
    }

    fn project_mut(&mut self, id: &ProjectId) -> StoreResult<&mut Project> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))
    }
}

fn normalize_name(name: &str) -> StoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BlankName);
    }
    Ok(trimmed.to_string())
}
