//! Core use-case services.
//!
//! # Responsibility
//! - Validate commands and orchestrate store calls into use-case APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod goal_service;
pub mod locks;
pub mod stats;
pub mod user_service;
