//! Local persistence backends for the serialized project store.
//!
//! # Responsibility
//! - Define the single-key local storage contract.
//! - Isolate SQLite and filesystem details from session orchestration.
//!
//! # Invariants
//! - Each backend holds at most one value under `LOCAL_STORE_KEY`.
//! - A successful `write` fully replaces the previous value.

pub mod local_store;
