//! Card domain model.
//!
//! # Responsibility
//! - Define one title + content scene unit.
//! - Resolve placeholder display text for cards still holding defaults.
//!
//! # Invariants
//! - `id` is unique within the owning project.
//! - `is_placeholder` is cleared as soon as a field receives non-blank text.

use serde::{Deserialize, Serialize};

/// Identifier of a card, unique within its project.
///
/// Serialized as a JSON number to stay readable by older data files.
pub type CardId = u64;

/// Title shown for a card whose title was never filled in.
pub const PLACEHOLDER_TITLE: &str = "New Scene";
/// Content shown for a card whose content was never filled in.
pub const PLACEHOLDER_CONTENT: &str = "Add your scene details here...";

/// How blank fields of a freshly added card are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderPolicy {
    /// Keep fields empty and set the placeholder flag; default text is
    /// resolved at render time.
    #[default]
    Deferred,
    /// Write default text into blank fields immediately.
    Eager,
}

/// Editable card field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Title,
    Content,
}

/// One scene card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub content: String,
    /// Set while the card still shows prompt text instead of user input.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_placeholder: bool,
}

impl Card {
    pub fn new(id: CardId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            is_placeholder: false,
        }
    }

    /// Builds a card from user input, applying `policy` to blank fields.
    pub fn from_input(id: CardId, title: &str, content: &str, policy: PlaceholderPolicy) -> Self {
        let title_blank = title.trim().is_empty();
        let content_blank = content.trim().is_empty();

        match policy {
            PlaceholderPolicy::Deferred => Self {
                id,
                title: if title_blank { String::new() } else { title.to_string() },
                content: if content_blank {
                    String::new()
                } else {
                    content.to_string()
                },
                is_placeholder: title_blank || content_blank,
            },
            PlaceholderPolicy::Eager => Self::new(
                id,
                if title_blank { PLACEHOLDER_TITLE } else { title },
                if content_blank {
                    PLACEHOLDER_CONTENT
                } else {
                    content
                },
            ),
        }
    }

    /// Replaces one field verbatim.
    ///
    /// The placeholder flag is dropped once `value` carries non-blank text.
    pub fn set_field(&mut self, field: CardField, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.is_placeholder = false;
        }
        match field {
            CardField::Title => self.title = value,
            CardField::Content => self.content = value,
        }
    }

    /// Title text to display, falling back to the placeholder prompt.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() && self.is_placeholder {
            PLACEHOLDER_TITLE
        } else {
            &self.title
        }
    }

    /// Content text to display, falling back to the placeholder prompt.
    pub fn display_content(&self) -> &str {
        if self.content.is_empty() && self.is_placeholder {
            PLACEHOLDER_CONTENT
        } else {
            &self.content
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
