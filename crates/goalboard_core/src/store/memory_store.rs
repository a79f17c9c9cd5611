//! Process-local goal store.
//!
//! Used when no database is configured (local development, tests). Results
//! match [`SqliteGoalStore`](crate::store::sqlite_store::SqliteGoalStore):
//! same filters, ordering, ownership checks and completion rule.
//!
//! # Invariants
//! - Every write happens under one write guard, so it is atomic.
//! - Stored goals are never handed out by reference; callers get clones.

use crate::completion::apply_completion_rule;
use crate::model::goal::{Goal, GoalId, Subtask, SubtaskId};
use crate::model::user::{User, UserId};
use crate::store::goal_store::{
    listing_order, validate_batch, EntityKind, GoalListQuery, GoalStore, StoreError, StoreResult,
};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct MemoryState {
    goals: HashMap<GoalId, Goal>,
    users: HashMap<UserId, User>,
}

impl MemoryState {
    fn subtask_exists(&self, subtask_id: SubtaskId) -> bool {
        self.goals
            .values()
            .any(|goal| goal.subtask(subtask_id).is_some())
    }

    /// First subtask whose id is already stored or repeats within `subtasks`.
    fn taken_subtask_id(&self, subtasks: &[Subtask]) -> Option<SubtaskId> {
        let mut seen = HashSet::with_capacity(subtasks.len());
        subtasks
            .iter()
            .find(|subtask| !seen.insert(subtask.id) || self.subtask_exists(subtask.id))
            .map(|subtask| subtask.id)
    }
}

fn duplicate_subtask(subtask_id: SubtaskId) -> StoreError {
    StoreError::Duplicate {
        kind: EntityKind::Subtask,
        key: subtask_id.to_string(),
    }
}

/// In-memory goal store.
#[derive(Default)]
pub struct MemoryGoalStore {
    state: RwLock<MemoryState>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Mutates a copy of the owner's goal and swaps it in only on success.
    fn mutate_goal<F>(&self, owner_id: UserId, goal_id: GoalId, mutate: F) -> StoreResult<Goal>
    where
        F: FnOnce(&MemoryState, &mut Goal) -> StoreResult<()>,
    {
        let mut state = self.write()?;
        let mut goal = state
            .goals
            .get(&goal_id)
            .filter(|goal| goal.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| StoreError::goal_not_found(goal_id))?;

        mutate(&*state, &mut goal)?;
        apply_completion_rule(&mut goal);
        goal.touch();

        state.goals.insert(goal_id, goal.clone());
        Ok(goal)
    }
}

impl GoalStore for MemoryGoalStore {
    fn list_goals(&self, owner_id: UserId, query: &GoalListQuery) -> StoreResult<Vec<Goal>> {
        let state = self.read()?;
        let mut goals: Vec<Goal> = state
            .goals
            .values()
            .filter(|goal| goal.owner_id == owner_id && query.matches(goal))
            .cloned()
            .collect();
        goals.sort_by(listing_order);

        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(goals
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .collect())
    }

    fn get_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<Goal> {
        let state = self.read()?;
        state
            .goals
            .get(&goal_id)
            .filter(|goal| goal.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| StoreError::goal_not_found(goal_id))
    }

    fn create_goal(&self, goal: &Goal) -> StoreResult<()> {
        goal.validate()?;
        let mut goal = goal.clone();
        apply_completion_rule(&mut goal);

        let mut state = self.write()?;
        if state.goals.contains_key(&goal.id) {
            return Err(StoreError::Duplicate {
                kind: EntityKind::Goal,
                key: goal.id.to_string(),
            });
        }
        if let Some(subtask_id) = state.taken_subtask_id(&goal.subtasks) {
            return Err(duplicate_subtask(subtask_id));
        }

        state.goals.insert(goal.id, goal);
        Ok(())
    }

    fn update_goal(&self, goal: &Goal) -> StoreResult<Goal> {
        goal.validate()?;
        self.mutate_goal(goal.owner_id, goal.id, |_, stored| {
            stored.title = goal.title.clone();
            stored.description = goal.description.clone();
            stored.priority = goal.priority;
            stored.status = goal.status;
            stored.due_date = goal.due_date;
            Ok(())
        })
    }

    fn delete_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<()> {
        let mut state = self.write()?;
        let owned = state
            .goals
            .get(&goal_id)
            .is_some_and(|goal| goal.owner_id == owner_id);
        if !owned {
            return Err(StoreError::goal_not_found(goal_id));
        }
        state.goals.remove(&goal_id);
        Ok(())
    }

    fn add_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        subtask.validate()?;
        self.mutate_goal(owner_id, subtask.goal_id, |state, goal| {
            if state.subtask_exists(subtask.id) {
                return Err(duplicate_subtask(subtask.id));
            }
            goal.subtasks.push(subtask.clone());
            Ok(())
        })
    }

    fn add_subtasks(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtasks: &[Subtask],
    ) -> StoreResult<Goal> {
        validate_batch(goal_id, subtasks)?;
        self.mutate_goal(owner_id, goal_id, |state, goal| {
            if let Some(subtask_id) = state.taken_subtask_id(subtasks) {
                return Err(duplicate_subtask(subtask_id));
            }
            goal.subtasks.extend_from_slice(subtasks);
            Ok(())
        })
    }

    fn update_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        subtask.validate()?;
        self.mutate_goal(owner_id, subtask.goal_id, |_, goal| {
            let slot = goal
                .subtask_mut(subtask.id)
                .ok_or_else(|| StoreError::subtask_not_found(subtask.id))?;
            let created_at = slot.created_at;
            *slot = subtask.clone();
            slot.created_at = created_at;
            Ok(())
        })
    }

    fn set_subtask_completed(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
        completed: bool,
    ) -> StoreResult<Goal> {
        self.mutate_goal(owner_id, goal_id, |_, goal| {
            let subtask = goal
                .subtask_mut(subtask_id)
                .ok_or_else(|| StoreError::subtask_not_found(subtask_id))?;
            subtask.completed = completed;
            subtask.touch();
            Ok(())
        })
    }

    fn delete_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> StoreResult<Goal> {
        self.mutate_goal(owner_id, goal_id, |_, goal| {
            if goal.subtask(subtask_id).is_none() {
                return Err(StoreError::subtask_not_found(subtask_id));
            }
            goal.subtasks.retain(|subtask| subtask.id != subtask_id);
            Ok(())
        })
    }

    fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut state = self.write()?;
        let taken = state.users.contains_key(&user.id)
            || state
                .users
                .values()
                .any(|existing| existing.email == user.email);
        if taken {
            return Err(StoreError::Duplicate {
                kind: EntityKind::User,
                key: user.email.clone(),
            });
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.trim().to_ascii_lowercase();
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}
