//! Core use-case services.
//!
//! # Responsibility
//! - Run reducer effects against local storage and the remote sync worker.
//! - Keep UI/FFI/CLI layers decoupled from storage details.

pub mod persistence;
pub mod session;
