//! Domain model for projects and their ordered scene cards.
//!
//! # Responsibility
//! - Define the canonical records shared by store, persistence and export.
//! - Keep the JSON shape compatible with previously saved data.
//!
//! # Invariants
//! - Project ids are unique; card ids are unique within one project.
//! - Card order inside a project is significant and user-controlled.
//! - `last_modified` strictly increases on every mutation.

pub mod card;
pub mod project;
