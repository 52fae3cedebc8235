//! Project domain model.
//!
//! # Responsibility
//! - Define a named, ordered collection of cards with timestamps.
//! - Own card-id allocation and modification-time bookkeeping.
//!
//! # Invariants
//! - `id` is stable for the project lifetime and never reused.
//! - New card ids are greater than every id already in `cards`.
//! - `last_modified >= created`, and `touch` always moves it forward.

use crate::model::card::{Card, CardId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const WELCOME_CARD_TITLE: &str = "Welcome to your new project!";
pub const WELCOME_CARD_CONTENT: &str = "This is your first card. Click to edit it.\n\n\
• Start outlining your chapters\n\
• Add scene breakdowns\n\
• Organize your story structure";

/// Stable project identifier.
///
/// Generated ids are random UUIDs; ids read from existing data are kept
/// verbatim, whatever their format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generates a fresh collision-resistant id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A named collection of ordered scene cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Project {
    /// Creates a project seeded with the welcome card.
    ///
    /// `name` is stored as given; callers are expected to trim and validate.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_id(ProjectId::generate(), name, now)
    }

    /// Creates a project with a caller-provided id.
    pub fn with_id(id: ProjectId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            cards: vec![Card::new(1, WELCOME_CARD_TITLE, WELCOME_CARD_CONTENT)],
            created: now,
            last_modified: now,
        }
    }

    /// Returns the id the next added card receives.
    ///
    /// Normally one past the largest id; once that would overflow, the
    /// smallest id not used by any card.
    pub fn next_card_id(&self) -> CardId {
        let Some(max) = self.cards.iter().map(|card| card.id).max() else {
            return 1;
        };
        if let Some(next) = max.checked_add(1) {
            return next;
        }
        let mut used = self.cards.iter().map(|card| card.id).collect::<Vec<_>>();
        used.sort_unstable();
        let mut candidate = 1;
        for id in used {
            if id > candidate {
                break;
            }
            if id == candidate {
                candidate += 1;
            }
        }
        candidate
    }

    /// Returns the position of one card in display order.
    pub fn card_index(&self, card_id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id == card_id)
    }

    /// Records a mutation at `now`.
    ///
    /// If the clock did not move past the previous value, the timestamp is
    /// bumped by one millisecond so ordering by recency stays strict.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = if now > self.last_modified {
            now
        } else {
            self.last_modified + Duration::milliseconds(1)
        };
    }
}
