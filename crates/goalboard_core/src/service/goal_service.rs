//! Goal and subtask command handlers.
//!
//! # Responsibility
//! - Validate command input before any store write.
//! - Enforce owner scoping on every read and write.
//! - Serialize read-modify-write sequences per goal.
//!
//! # Invariants
//! - A command either fully applies or leaves stored state unchanged.
//! - Absent and foreign-owned goals produce the same `NotFound` error.
//! - After every subtask mutation the returned goal satisfies the
//!   completion rule; a violation is reported as a defect, never repaired
//!   silently.

use crate::completion::{apply_completion_rule, check_consistency, ConsistencyViolation};
use crate::model::command::{GoalDraft, GoalPatch, SubtaskDraft, SubtaskPatch};
use crate::model::goal::{
    normalize_title, parse_due_date, validate_hours, Goal, GoalId, GoalStatus, Priority, Subtask,
    SubtaskId, ValidationError,
};
use crate::model::user::UserId;
use crate::service::locks::GoalLocks;
use crate::service::stats::{compute_stats, DashboardStats};
use crate::store::goal_store::{EntityKind, GoalListQuery, GoalStore, StoreError};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Typed failure returned by command handlers.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected; nothing was written.
    Validation(ValidationError),
    /// Entity absent or not owned by the caller.
    NotFound { kind: EntityKind, id: Uuid },
    /// Unique key already taken.
    Duplicate { kind: EntityKind, key: String },
    /// Stored state broke the completion rule. Indicates a defect.
    Consistency(ConsistencyViolation),
    /// Backend failure.
    Store(StoreError),
}

impl ServiceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Duplicate { .. } => "duplicate",
            Self::Consistency(_) => "consistency_violation",
            Self::Store(_) => "store_error",
        }
    }

    fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::Duplicate { .. }
        )
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Duplicate { kind, key } => write!(f, "{kind} already exists: {key}"),
            Self::Consistency(err) => write!(f, "completion rule violated: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Consistency(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::Duplicate { .. } => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::Duplicate { kind, key } => Self::Duplicate { kind, key },
            other => Self::Store(other),
        }
    }
}

/// Goal command surface over an injected store.
pub struct GoalService<S: GoalStore> {
    store: S,
    locks: GoalLocks,
}

impl<S: GoalStore> GoalService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: GoalLocks::new(),
        }
    }

    /// Creates a goal and its initial subtasks in one atomic write.
    ///
    /// # Contract
    /// - Priority defaults to `MEDIUM`; status starts `ACTIVE`.
    /// - Subtasks keep draft order and are incomplete unless marked.
    /// - When every supplied subtask is already complete the goal starts
    ///   `COMPLETED`.
    pub fn create_goal(&self, owner_id: UserId, draft: GoalDraft) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = build_goal(owner_id, draft)
            .map_err(ServiceError::from)
            .and_then(|goal| {
                self.store.create_goal(&goal)?;
                Ok(goal)
            });
        log_outcome("goal_create", &result, started_at);
        result
    }

    /// Loads one goal owned by `owner_id`.
    pub fn get_goal(&self, owner_id: UserId, goal_id: GoalId) -> ServiceResult<Goal> {
        Ok(self.store.get_goal(owner_id, goal_id)?)
    }

    /// Lists the owner's goals with optional filters.
    pub fn list_goals(&self, owner_id: UserId, query: &GoalListQuery) -> ServiceResult<Vec<Goal>> {
        Ok(self.store.list_goals(owner_id, query)?)
    }

    /// Applies a partial update; omitted fields keep their stored values.
    ///
    /// # Contract
    /// - `PAUSED`/`CANCELLED` are stored as given.
    /// - `ACTIVE` resumes the goal, after which the completion rule applies.
    /// - `COMPLETED` is rejected while any subtask is incomplete.
    pub fn update_goal(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        patch: GoalPatch,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let mut goal = self.store.get_goal(owner_id, goal_id)?;
            apply_goal_patch(&mut goal, patch)?;
            let updated = self.store.update_goal(&goal)?;
            verify(&updated)?;
            Ok(updated)
        });
        log_outcome("goal_update", &result, started_at);
        result
    }

    /// Deletes a goal together with all of its subtasks.
    pub fn delete_goal(&self, owner_id: UserId, goal_id: GoalId) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            self.store
                .delete_goal(owner_id, goal_id)
                .map_err(ServiceError::from)
        });
        match &result {
            Ok(()) => info!(
                "event=goal_delete module=service status=ok goal_id={goal_id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=goal_delete module=service status=rejected goal_id={goal_id} error_code={}",
                err.code()
            ),
        }
        result
    }

    /// Appends a subtask to an owned goal.
    pub fn add_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        draft: SubtaskDraft,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let subtask = build_subtask(goal_id, draft)?;
            let goal = self.store.add_subtask(owner_id, &subtask)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_add", &result, started_at);
        result
    }

    /// Appends several subtasks to an owned goal as one write.
    ///
    /// Every draft is validated before anything is stored; on any failure
    /// the goal is left exactly as it was.
    pub fn add_subtasks(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        drafts: Vec<SubtaskDraft>,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let subtasks = drafts
                .into_iter()
                .map(|draft| build_subtask(goal_id, draft))
                .collect::<Result<Vec<_>, _>>()?;
            let goal = self.store.add_subtasks(owner_id, goal_id, &subtasks)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_add_batch", &result, started_at);
        result
    }

    /// Applies a partial subtask update, including its completion flag.
    pub fn update_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
        patch: SubtaskPatch,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let goal = self.store.get_goal(owner_id, goal_id)?;
            let mut subtask = goal
                .subtask(subtask_id)
                .cloned()
                .ok_or_else(|| ServiceError::subtask_not_found(subtask_id))?;
            apply_subtask_patch(&mut subtask, patch)?;
            let goal = self.store.update_subtask(owner_id, &subtask)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_update", &result, started_at);
        result
    }

    /// Flips one subtask's completion flag.
    ///
    /// Applying it twice restores both the subtask and the goal status.
    pub fn toggle_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let goal = self.store.get_goal(owner_id, goal_id)?;
            let current = goal
                .subtask(subtask_id)
                .map(|subtask| subtask.completed)
                .ok_or_else(|| ServiceError::subtask_not_found(subtask_id))?;
            let goal = self
                .store
                .set_subtask_completed(owner_id, goal_id, subtask_id, !current)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_toggle", &result, started_at);
        result
    }

    /// Sets one subtask's completion flag to an explicit value.
    pub fn set_subtask_completed(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
        completed: bool,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let goal = self
                .store
                .set_subtask_completed(owner_id, goal_id, subtask_id, completed)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_complete", &result, started_at);
        result
    }

    /// Removes one subtask from an owned goal.
    pub fn delete_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> ServiceResult<Goal> {
        let started_at = Instant::now();
        let result = self.locks.with_goal(goal_id, || {
            let goal = self.store.delete_subtask(owner_id, goal_id, subtask_id)?;
            verify(&goal)?;
            Ok(goal)
        });
        log_outcome("subtask_delete", &result, started_at);
        result
    }

    /// Computes dashboard counters over all of the owner's goals.
    pub fn dashboard_stats(&self, owner_id: UserId, today: NaiveDate) -> ServiceResult<DashboardStats> {
        let goals = self.store.list_goals(owner_id, &GoalListQuery::default())?;
        Ok(compute_stats(&goals, today))
    }
}

impl ServiceError {
    fn subtask_not_found(id: SubtaskId) -> Self {
        Self::NotFound {
            kind: EntityKind::Subtask,
            id,
        }
    }
}

fn build_goal(owner_id: UserId, draft: GoalDraft) -> Result<Goal, ValidationError> {
    let mut goal = Goal::new(owner_id, normalize_title(&draft.title)?);
    goal.description = normalize_optional_text(draft.description);
    goal.priority = match normalize_optional_text(draft.priority) {
        Some(raw) => raw.parse::<Priority>()?,
        None => Priority::default(),
    };
    goal.due_date = normalize_optional_text(draft.due_date)
        .map(|raw| parse_due_date(&raw))
        .transpose()?;

    for subtask_draft in draft.subtasks {
        let subtask = build_subtask(goal.id, subtask_draft)?;
        goal.subtasks.push(subtask);
    }
    apply_completion_rule(&mut goal);
    Ok(goal)
}

fn build_subtask(goal_id: GoalId, draft: SubtaskDraft) -> Result<Subtask, ValidationError> {
    let mut subtask = Subtask::new(goal_id, normalize_title(&draft.title)?);
    subtask.description = normalize_optional_text(draft.description);
    subtask.completed = draft.completed;
    subtask.estimated_hours = draft.estimated_hours.map(validate_hours).transpose()?;
    subtask.category = normalize_optional_text(draft.category);
    subtask.skills = normalize_list(draft.skills);
    subtask.dependencies = normalize_list(draft.dependencies);
    Ok(subtask)
}

fn apply_goal_patch(goal: &mut Goal, patch: GoalPatch) -> Result<(), ValidationError> {
    if let Some(title) = patch.title {
        goal.title = normalize_title(&title)?;
    }
    if let Some(description) = patch.description {
        goal.description = normalize_optional_text(Some(description));
    }
    if let Some(priority) = patch.priority {
        goal.priority = priority.parse::<Priority>()?;
    }
    if let Some(due_date) = patch.due_date {
        goal.due_date = normalize_optional_text(Some(due_date))
            .map(|raw| parse_due_date(&raw))
            .transpose()?;
    }
    if let Some(status) = patch.status {
        let requested = status.parse::<GoalStatus>()?;
        let has_open_subtask = goal.subtasks.iter().any(|subtask| !subtask.completed);
        if requested == GoalStatus::Completed && has_open_subtask {
            return Err(ValidationError::StatusConflictsWithSubtasks {
                goal_id: goal.id,
                requested,
            });
        }
        goal.status = requested;
    }
    goal.touch();
    Ok(())
}

fn apply_subtask_patch(subtask: &mut Subtask, patch: SubtaskPatch) -> Result<(), ValidationError> {
    if let Some(title) = patch.title {
        subtask.title = normalize_title(&title)?;
    }
    if let Some(description) = patch.description {
        subtask.description = normalize_optional_text(Some(description));
    }
    if let Some(completed) = patch.completed {
        subtask.completed = completed;
    }
    if let Some(hours) = patch.estimated_hours {
        subtask.estimated_hours = Some(validate_hours(hours)?);
    }
    if let Some(category) = patch.category {
        subtask.category = normalize_optional_text(Some(category));
    }
    if let Some(skills) = patch.skills {
        subtask.skills = normalize_list(skills);
    }
    if let Some(dependencies) = patch.dependencies {
        subtask.dependencies = normalize_list(dependencies);
    }
    subtask.touch();
    Ok(())
}

fn verify(goal: &Goal) -> ServiceResult<()> {
    check_consistency(goal).map_err(|violation| {
        error!(
            "event=completion_check module=service status=error goal_id={} status={} completed={} total={}",
            violation.goal_id,
            violation.status,
            violation.completed_subtasks,
            violation.total_subtasks
        );
        ServiceError::Consistency(violation)
    })
}

fn log_outcome(event: &str, result: &ServiceResult<Goal>, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(goal) => info!(
            "event={event} module=service status=ok goal_id={} goal_status={} subtasks={} duration_ms={duration_ms}",
            goal.id,
            goal.status,
            goal.subtasks.len()
        ),
        Err(err) if err.is_rejection() => warn!(
            "event={event} module=service status=rejected error_code={} duration_ms={duration_ms}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module=service status=error error_code={} duration_ms={duration_ms} error={err}",
            err.code()
        ),
    }
}

/// Trims optional text; blank input becomes `None`.
fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn normalize_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| normalize_optional_text(Some(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{apply_goal_patch, build_goal};
    use crate::model::command::{GoalDraft, GoalPatch, SubtaskDraft};
    use crate::model::goal::{GoalStatus, Priority, ValidationError};
    use uuid::Uuid;

    #[test]
    fn build_goal_rejects_unknown_priority_instead_of_coercing() {
        let draft = GoalDraft {
            priority: Some("urgent".to_string()),
            ..GoalDraft::new("Ship")
        };
        assert!(matches!(
            build_goal(Uuid::new_v4(), draft),
            Err(ValidationError::InvalidPriority(_))
        ));
    }

    #[test]
    fn build_goal_defaults_and_trims() {
        let draft = GoalDraft {
            description: Some("   ".to_string()),
            due_date: Some(String::new()),
            subtasks: vec![SubtaskDraft::new("  Design  ")],
            ..GoalDraft::new("  Launch MVP ")
        };
        let goal = build_goal(Uuid::new_v4(), draft).unwrap();
        assert_eq!(goal.title, "Launch MVP");
        assert_eq!(goal.priority, Priority::Medium);
        assert_eq!(goal.description, None);
        assert_eq!(goal.due_date, None);
        assert_eq!(goal.subtasks[0].title, "Design");
        assert_eq!(goal.subtasks[0].goal_id, goal.id);
    }

    #[test]
    fn failed_patch_reports_validation_error() {
        let mut goal = build_goal(Uuid::new_v4(), GoalDraft::new("Ship")).unwrap();
        let patch = GoalPatch {
            due_date: Some("31/12/2025".to_string()),
            ..GoalPatch::default()
        };
        assert!(matches!(
            apply_goal_patch(&mut goal, patch),
            Err(ValidationError::InvalidDueDate(_))
        ));
    }

    #[test]
    fn completed_status_requires_finished_subtasks() {
        let draft = GoalDraft {
            subtasks: vec![SubtaskDraft::new("Design")],
            ..GoalDraft::new("Ship")
        };
        let mut goal = build_goal(Uuid::new_v4(), draft).unwrap();
        let patch = GoalPatch {
            status: Some("COMPLETED".to_string()),
            ..GoalPatch::default()
        };
        assert!(matches!(
            apply_goal_patch(&mut goal, patch),
            Err(ValidationError::StatusConflictsWithSubtasks {
                requested: GoalStatus::Completed,
                ..
            })
        ));
    }
}
