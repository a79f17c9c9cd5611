//! Domain model for goals, subtasks and their owners.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one entity shape regardless of which store backend persists it.
//!
//! # Invariants
//! - Every entity is identified by a stable uuid that is never reused.
//! - A subtask belongs to exactly one goal and is deleted with it.

pub mod command;
pub mod goal;
pub mod user;
