//! Core domain logic for goalboard.
//! This crate is the single source of truth for goal and subtask invariants.

pub mod completion;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod suggest;

pub use completion::{apply_completion_rule, check_consistency, derive_status, ConsistencyViolation};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::command::{GoalDraft, GoalPatch, SubtaskDraft, SubtaskPatch};
pub use model::goal::{Goal, GoalId, GoalStatus, Priority, Subtask, SubtaskId, ValidationError};
pub use model::user::{User, UserId};
pub use service::goal_service::{GoalService, ServiceError, ServiceResult};
pub use service::stats::DashboardStats;
pub use service::user_service::{NewUser, UserService};
pub use store::goal_store::{EntityKind, GoalListQuery, GoalStore, StoreError, StoreResult};
pub use store::memory_store::MemoryGoalStore;
pub use store::open_store;
pub use store::sqlite_store::SqliteGoalStore;
pub use suggest::provider::{ProviderError, SuggestionProvider};
pub use suggest::service::SuggestionService;
pub use suggest::{SuggestedTask, SuggestionContext, SuggestionPlan, SuggestionSource};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
