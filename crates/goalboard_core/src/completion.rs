//! Goal completion rule.
//!
//! # Responsibility
//! - Derive a goal's status from the completion state of its subtasks.
//! - Detect goals whose stored status contradicts their subtasks.
//!
//! # Invariants
//! - Only the `ACTIVE <-> COMPLETED` transition is derived.
//! - `PAUSED` and `CANCELLED` are never overridden.
//! - A goal without subtasks keeps whatever status its owner set.

use crate::model::goal::{Goal, GoalId, GoalStatus, Subtask};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Returns the status `current` should move to given `subtasks`.
pub fn derive_status(current: GoalStatus, subtasks: &[Subtask]) -> GoalStatus {
    if current.is_user_pinned() || subtasks.is_empty() {
        return current;
    }

    if subtasks.iter().all(|subtask| subtask.completed) {
        GoalStatus::Completed
    } else if current == GoalStatus::Completed {
        GoalStatus::Active
    } else {
        current
    }
}

/// Applies [`derive_status`] in place.
///
/// Returns `true` when the status changed.
pub fn apply_completion_rule(goal: &mut Goal) -> bool {
    let derived = derive_status(goal.status, &goal.subtasks);
    if derived == goal.status {
        return false;
    }
    goal.status = derived;
    true
}

/// Stored goal state that breaks the completion rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyViolation {
    pub goal_id: GoalId,
    pub status: GoalStatus,
    pub completed_subtasks: usize,
    pub total_subtasks: usize,
}

impl Display for ConsistencyViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "goal {} is {} with {}/{} subtasks completed",
            self.goal_id, self.status, self.completed_subtasks, self.total_subtasks
        )
    }
}

impl Error for ConsistencyViolation {}

/// Verifies that `goal.status` agrees with its subtasks.
pub fn check_consistency(goal: &Goal) -> Result<(), ConsistencyViolation> {
    if derive_status(goal.status, &goal.subtasks) == goal.status {
        return Ok(());
    }
    Err(ConsistencyViolation {
        goal_id: goal.id,
        status: goal.status,
        completed_subtasks: goal.completed_subtask_count(),
        total_subtasks: goal.subtasks.len(),
    })
}
