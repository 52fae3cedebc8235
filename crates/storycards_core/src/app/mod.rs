//! Explicit application state and its unidirectional update function.
//!
//! # Responsibility
//! - Replace ambient UI globals with one `AppState` value.
//! - Describe user intent as `Action`s and side effects as `Effect`s.
//! - Model destructive operations as a two-step pending confirmation.
//!
//! # Invariants
//! - `view == View::Board` implies `active_project` names a stored project.
//! - State changes happen only inside `update`.
//! - `update` never performs I/O; callers execute returned effects.

mod reducer;
mod state;

pub use reducer::{update, Action, ActionError, Effect};
pub use state::{AppSettings, AppState, PendingConfirmation, SyncStatus, View};
