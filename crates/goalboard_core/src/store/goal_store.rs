//! Goal store contract shared by every backend.
//!
//! # Responsibility
//! - Define owner-scoped CRUD over goals, their subtasks, and user accounts.
//! - Define the list filter semantics every backend must reproduce.
//!
//! # Invariants
//! - A goal owned by another user is reported exactly like a missing goal.
//! - Every subtask write re-applies the completion rule to the parent goal
//!   inside the same atomic unit as the write itself.
//! - A goal and its initial subtasks are inserted all-or-nothing.

use crate::db::DbError;
use crate::model::goal::{Goal, GoalId, GoalStatus, Priority, Subtask, SubtaskId, ValidationError};
use crate::model::user::{User, UserId};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity family named in not-found and duplicate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Goal,
    Subtask,
    User,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Goal => "goal",
            Self::Subtask => "subtask",
            Self::User => "user",
        })
    }
}

/// Store error for persistence and lookup operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Db(DbError),
    /// Entity is absent or owned by someone else.
    NotFound { kind: EntityKind, id: Uuid },
    /// Unique key already taken.
    Duplicate { kind: EntityKind, key: String },
    /// Connection schema is not at the version this binary expects.
    SchemaMismatch { expected: u32, actual: u32 },
    InvalidData(String),
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Duplicate { kind, key } => write!(f, "{kind} already exists: {key}"),
            Self::SchemaMismatch { expected, actual } => write!(
                f,
                "goal store requires schema version {expected}, got {actual}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned => write!(f, "store lock poisoned by a panicked writer"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl StoreError {
    pub(crate) fn goal_not_found(id: GoalId) -> Self {
        Self::NotFound {
            kind: EntityKind::Goal,
            id,
        }
    }

    pub(crate) fn subtask_not_found(id: SubtaskId) -> Self {
        Self::NotFound {
            kind: EntityKind::Subtask,
            id,
        }
    }
}

/// Filter and pagination options for listing one owner's goals.
///
/// Date bounds are inclusive. When either bound is set, goals without a due
/// date are excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalListQuery {
    pub status: Option<GoalStatus>,
    pub priority: Option<Priority>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl GoalListQuery {
    /// Evaluates the non-pagination filters against one goal.
    pub fn matches(&self, goal: &Goal) -> bool {
        if self.status.is_some_and(|status| status != goal.status) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != goal.priority) {
            return false;
        }
        if self.due_from.is_none() && self.due_to.is_none() {
            return true;
        }
        let Some(due) = goal.due_date else {
            return false;
        };
        self.due_from.map_or(true, |from| due >= from) && self.due_to.map_or(true, |to| due <= to)
    }
}

/// Checks a subtask batch before it is appended to `goal_id`.
pub(crate) fn validate_batch(goal_id: GoalId, subtasks: &[Subtask]) -> StoreResult<()> {
    for subtask in subtasks {
        if subtask.goal_id != goal_id {
            return Err(ValidationError::SubtaskParentMismatch {
                subtask_id: subtask.id,
                goal_id,
            }
            .into());
        }
        subtask.validate()?;
    }
    Ok(())
}

/// Listing order: newest first, ties broken by id.
pub fn listing_order(a: &Goal, b: &Goal) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Storage port for goals, subtasks and users.
///
/// Implementations must be interchangeable: callers observe identical results
/// from the durable and in-memory backends.
pub trait GoalStore: Send + Sync {
    /// Lists the owner's goals with their subtasks.
    fn list_goals(&self, owner_id: UserId, query: &GoalListQuery) -> StoreResult<Vec<Goal>>;
    /// Loads one goal with its subtasks.
    fn get_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<Goal>;
    /// Inserts a goal and all of its subtasks atomically.
    fn create_goal(&self, goal: &Goal) -> StoreResult<()>;
    /// Writes scalar goal fields (subtasks are ignored) and re-derives status.
    fn update_goal(&self, goal: &Goal) -> StoreResult<Goal>;
    /// Deletes a goal and every subtask it owns.
    fn delete_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<()>;
    /// Appends a subtask to `subtask.goal_id`.
    fn add_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal>;
    /// Appends several subtasks to one goal, all-or-nothing, re-deriving the
    /// goal status once.
    fn add_subtasks(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtasks: &[Subtask],
    ) -> StoreResult<Goal>;
    /// Replaces one subtask's fields.
    fn update_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal>;
    /// Sets one subtask's completion flag.
    fn set_subtask_completed(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
        completed: bool,
    ) -> StoreResult<Goal>;
    /// Removes one subtask.
    fn delete_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> StoreResult<Goal>;
    /// Inserts a user; the email must be unused.
    fn create_user(&self, user: &User) -> StoreResult<()>;
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;
    /// Looks up a user by normalized email.
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

impl<T: GoalStore + ?Sized> GoalStore for Arc<T> {
    fn list_goals(&self, owner_id: UserId, query: &GoalListQuery) -> StoreResult<Vec<Goal>> {
        (**self).list_goals(owner_id, query)
    }

    fn get_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<Goal> {
        (**self).get_goal(owner_id, goal_id)
    }

    fn create_goal(&self, goal: &Goal) -> StoreResult<()> {
        (**self).create_goal(goal)
    }

    fn update_goal(&self, goal: &Goal) -> StoreResult<Goal> {
        (**self).update_goal(goal)
    }

    fn delete_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<()> {
        (**self).delete_goal(owner_id, goal_id)
    }

    fn add_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        (**self).add_subtask(owner_id, subtask)
    }

    fn add_subtasks(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtasks: &[Subtask],
    ) -> StoreResult<Goal> {
        (**self).add_subtasks(owner_id, goal_id, subtasks)
    }

    fn update_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        (**self).update_subtask(owner_id, subtask)
    }

    fn set_subtask_completed(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
        completed: bool,
    ) -> StoreResult<Goal> {
        (**self).set_subtask_completed(owner_id, goal_id, subtask_id, completed)
    }

    fn delete_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> StoreResult<Goal> {
        (**self).delete_subtask(owner_id, goal_id, subtask_id)
    }

    fn create_user(&self, user: &User) -> StoreResult<()> {
        (**self).create_user(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).find_user_by_email(email)
    }
}

#[cfg(test)]
mod tests {
    use super::{listing_order, GoalListQuery};
    use crate::model::goal::{Goal, GoalStatus, Priority};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, day).unwrap()
    }

    #[test]
    fn date_bounds_are_inclusive_and_skip_undated_goals() {
        let owner = Uuid::new_v4();
        let mut dated = Goal::new(owner, "dated");
        dated.due_date = Some(date(10));
        let undated = Goal::new(owner, "undated");

        let query = GoalListQuery {
            due_from: Some(date(10)),
            due_to: Some(date(10)),
            ..GoalListQuery::default()
        };
        assert!(query.matches(&dated));
        assert!(!query.matches(&undated));
        assert!(GoalListQuery::default().matches(&undated));
    }

    #[test]
    fn status_and_priority_filters_combine() {
        let mut goal = Goal::new(Uuid::new_v4(), "g");
        goal.priority = Priority::High;
        let query = GoalListQuery {
            status: Some(GoalStatus::Active),
            priority: Some(Priority::High),
            ..GoalListQuery::default()
        };
        assert!(query.matches(&goal));
        goal.status = GoalStatus::Paused;
        assert!(!query.matches(&goal));
    }

    #[test]
    fn listing_order_is_newest_first() {
        let owner = Uuid::new_v4();
        let mut older = Goal::new(owner, "older");
        older.created_at = 1;
        let mut newer = Goal::new(owner, "newer");
        newer.created_at = 2;
        let mut goals = vec![older.clone(), newer.clone()];
        goals.sort_by(listing_order);
        assert_eq!(goals[0].id, newer.id);
    }
}
