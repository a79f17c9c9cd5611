//! SQLite-backed goal store.
//!
//! # Responsibility
//! - Persist goals, subtasks and users in the migrated SQLite schema.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Every multi-row write runs in one immediate transaction.
//! - Subtask rows are removed by `ON DELETE CASCADE` with their goal.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Subtasks are returned in insertion order (`sort_order ASC`).

use crate::completion::apply_completion_rule;
use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::goal::{Goal, GoalId, GoalStatus, Priority, Subtask, SubtaskId};
use crate::model::user::{User, UserId};
use crate::store::goal_store::{
    validate_batch, EntityKind, GoalListQuery, GoalStore, StoreError, StoreResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{
    ffi, params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    description,
    priority,
    status,
    due_date,
    created_at,
    updated_at
FROM goals";

const SUBTASK_SELECT_SQL: &str = "SELECT
    id,
    goal_id,
    title,
    description,
    completed,
    estimated_hours,
    category,
    skills,
    dependencies,
    created_at,
    updated_at
FROM subtasks";

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    password_hash,
    first_name,
    last_name,
    created_at
FROM users";

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Durable goal store over one migrated SQLite connection.
///
/// The connection sits behind a mutex so the store can be shared across
/// request threads.
pub struct SqliteGoalStore {
    conn: Mutex<Connection>,
}

impl SqliteGoalStore {
    /// Wraps a connection that already has migrations applied.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let actual = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected = latest_version();
        if actual != expected {
            return Err(StoreError::SchemaMismatch { expected, actual });
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory SQLite database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Closes the underlying connection, surfacing any close failure.
    pub fn close(self) -> StoreResult<()> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        conn.close().map_err(|(_, err)| err.into())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Loads a goal, lets `mutate` change it, then re-derives its status and
    /// commits everything in one transaction.
    fn mutate_goal<F>(&self, owner_id: UserId, goal_id: GoalId, mutate: F) -> StoreResult<Goal>
    where
        F: FnOnce(&Transaction<'_>, &mut Goal) -> StoreResult<()>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut goal = load_goal(&tx, owner_id, goal_id)?;

        mutate(&tx, &mut goal)?;
        apply_completion_rule(&mut goal);
        goal.touch();

        tx.execute(
            "UPDATE goals SET status = ?1, updated_at = ?2 WHERE id = ?3;",
            params![goal.status.as_str(), goal.updated_at, goal.id.to_string()],
        )?;
        tx.commit()?;
        Ok(goal)
    }
}

impl GoalStore for SqliteGoalStore {
    fn list_goals(&self, owner_id: UserId, query: &GoalListQuery) -> StoreResult<Vec<Goal>> {
        let conn = self.lock()?;
        let mut sql = format!("{GOAL_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner_id.to_string())];

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = query.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        if let Some(from) = query.due_from {
            sql.push_str(" AND due_date IS NOT NULL AND due_date >= ?");
            bind_values.push(Value::Text(from.format(DUE_DATE_FORMAT).to_string()));
        }
        if let Some(to) = query.due_to {
            sql.push_str(" AND due_date IS NOT NULL AND due_date <= ?");
            bind_values.push(Value::Text(to.format(DUE_DATE_FORMAT).to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }

        for goal in &mut goals {
            goal.subtasks = load_subtasks(&conn, goal.id)?;
        }
        Ok(goals)
    }

    fn get_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<Goal> {
        let conn = self.lock()?;
        load_goal(&conn, owner_id, goal_id)
    }

    fn create_goal(&self, goal: &Goal) -> StoreResult<()> {
        goal.validate()?;
        let mut goal = goal.clone();
        apply_completion_rule(&mut goal);

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO goals (
                id,
                owner_id,
                title,
                description,
                priority,
                status,
                due_date,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                goal.id.to_string(),
                goal.owner_id.to_string(),
                goal.title.as_str(),
                goal.description.as_deref(),
                goal.priority.as_str(),
                goal.status.as_str(),
                goal.due_date.map(format_due_date),
                goal.created_at,
                goal.updated_at,
            ],
        )
        .map_err(|err| map_unique_violation(err, EntityKind::Goal, goal.id.to_string()))?;

        for (order, subtask) in goal.subtasks.iter().enumerate() {
            insert_subtask(&tx, subtask, order as i64)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_goal(&self, goal: &Goal) -> StoreResult<Goal> {
        goal.validate()?;
        self.mutate_goal(goal.owner_id, goal.id, |tx, stored| {
            stored.title = goal.title.clone();
            stored.description = goal.description.clone();
            stored.priority = goal.priority;
            stored.status = goal.status;
            stored.due_date = goal.due_date;
            tx.execute(
                "UPDATE goals
                 SET
                    title = ?1,
                    description = ?2,
                    priority = ?3,
                    due_date = ?4
                 WHERE id = ?5;",
                params![
                    stored.title.as_str(),
                    stored.description.as_deref(),
                    stored.priority.as_str(),
                    stored.due_date.map(format_due_date),
                    stored.id.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    fn delete_goal(&self, owner_id: UserId, goal_id: GoalId) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM goals WHERE id = ?1 AND owner_id = ?2;",
            params![goal_id.to_string(), owner_id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::goal_not_found(goal_id));
        }
        Ok(())
    }

    fn add_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        subtask.validate()?;
        self.mutate_goal(owner_id, subtask.goal_id, |tx, goal| {
            let order: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM subtasks WHERE goal_id = ?1;",
                [goal.id.to_string()],
                |row| row.get(0),
            )?;
            insert_subtask(tx, subtask, order)?;
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
        self.mutate_goal(owner_id, goal_id, |tx, goal| {
            let first: i64 = tx.query_row(
                "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM subtasks WHERE goal_id = ?1;",
                [goal.id.to_string()],
                |row| row.get(0),
            )?;
            for (offset, subtask) in subtasks.iter().enumerate() {
                insert_subtask(tx, subtask, first + offset as i64)?;
            }
            goal.subtasks.extend_from_slice(subtasks);
            Ok(())
        })
    }

    fn update_subtask(&self, owner_id: UserId, subtask: &Subtask) -> StoreResult<Goal> {
        subtask.validate()?;
        self.mutate_goal(owner_id, subtask.goal_id, |tx, goal| {
            let slot = goal
                .subtask_mut(subtask.id)
                .ok_or_else(|| StoreError::subtask_not_found(subtask.id))?;
            let created_at = slot.created_at;
            *slot = subtask.clone();
            slot.created_at = created_at;

            tx.execute(
                "UPDATE subtasks
                 SET
                    title = ?1,
                    description = ?2,
                    completed = ?3,
                    estimated_hours = ?4,
                    category = ?5,
                    skills = ?6,
                    dependencies = ?7,
                    updated_at = ?8
                 WHERE id = ?9 AND goal_id = ?10;",
                params![
                    slot.title.as_str(),
                    slot.description.as_deref(),
                    bool_to_int(slot.completed),
                    slot.estimated_hours,
                    slot.category.as_deref(),
                    encode_list(&slot.skills)?,
                    encode_list(&slot.dependencies)?,
                    slot.updated_at,
                    slot.id.to_string(),
                    slot.goal_id.to_string(),
                ],
            )?;
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
        self.mutate_goal(owner_id, goal_id, |tx, goal| {
            let subtask = goal
                .subtask_mut(subtask_id)
                .ok_or_else(|| StoreError::subtask_not_found(subtask_id))?;
            subtask.completed = completed;
            subtask.touch();
            tx.execute(
                "UPDATE subtasks SET completed = ?1, updated_at = ?2 WHERE id = ?3 AND goal_id = ?4;",
                params![
                    bool_to_int(completed),
                    subtask.updated_at,
                    subtask_id.to_string(),
                    goal_id.to_string(),
                ],
            )?;
            Ok(())
        })
    }

    fn delete_subtask(
        &self,
        owner_id: UserId,
        goal_id: GoalId,
        subtask_id: SubtaskId,
    ) -> StoreResult<Goal> {
        self.mutate_goal(owner_id, goal_id, |tx, goal| {
            if goal.subtask(subtask_id).is_none() {
                return Err(StoreError::subtask_not_found(subtask_id));
            }
            tx.execute(
                "DELETE FROM subtasks WHERE id = ?1 AND goal_id = ?2;",
                params![subtask_id.to_string(), goal_id.to_string()],
            )?;
            goal.subtasks.retain(|subtask| subtask.id != subtask_id);
            Ok(())
        })
    }

    fn create_user(&self, user: &User) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (
                id,
                email,
                password_hash,
                first_name,
                last_name,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.first_name.as_str(),
                user.last_name.as_deref(),
                user.created_at,
            ],
        )
        .map_err(|err| map_unique_violation(err, EntityKind::User, user.email.clone()))?;
        Ok(())
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email.trim().to_ascii_lowercase()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }
}

fn load_goal(conn: &Connection, owner_id: UserId, goal_id: GoalId) -> StoreResult<Goal> {
    let mut goal = {
        let mut stmt = conn.prepare(&format!(
            "{GOAL_SELECT_SQL} WHERE id = ?1 AND owner_id = ?2;"
        ))?;
        stmt.query_row(
            params![goal_id.to_string(), owner_id.to_string()],
            |row| Ok(parse_goal_row(row)),
        )
        .optional()?
        .ok_or_else(|| StoreError::goal_not_found(goal_id))??
    };
    goal.subtasks = load_subtasks(conn, goal.id)?;
    Ok(goal)
}

fn load_subtasks(conn: &Connection, goal_id: GoalId) -> StoreResult<Vec<Subtask>> {
    let mut stmt = conn.prepare(&format!(
        "{SUBTASK_SELECT_SQL} WHERE goal_id = ?1 ORDER BY sort_order ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([goal_id.to_string()])?;
    let mut subtasks = Vec::new();
    while let Some(row) = rows.next()? {
        subtasks.push(parse_subtask_row(row)?);
    }
    Ok(subtasks)
}

fn insert_subtask(conn: &Connection, subtask: &Subtask, sort_order: i64) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO subtasks (
            id,
            goal_id,
            title,
            description,
            completed,
            estimated_hours,
            category,
            skills,
            dependencies,
            sort_order,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
        params![
            subtask.id.to_string(),
            subtask.goal_id.to_string(),
            subtask.title.as_str(),
            subtask.description.as_deref(),
            bool_to_int(subtask.completed),
            subtask.estimated_hours,
            subtask.category.as_deref(),
            encode_list(&subtask.skills)?,
            encode_list(&subtask.dependencies)?,
            sort_order,
            subtask.created_at,
            subtask.updated_at,
        ],
    )
    .map_err(|err| map_unique_violation(err, EntityKind::Subtask, subtask.id.to_string()))?;
    Ok(())
}

fn parse_goal_row(row: &Row<'_>) -> StoreResult<Goal> {
    let priority_text: String = row.get("priority")?;
    let priority = priority_text.parse::<Priority>().map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid priority `{priority_text}` in goals.priority"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<GoalStatus>().map_err(|_| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in goals.status"))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DUE_DATE_FORMAT).map_err(|_| {
            StoreError::InvalidData(format!("invalid due date `{value}` in goals.due_date"))
        })?),
        None => None,
    };

    Ok(Goal {
        id: parse_uuid(row.get("id")?, "goals.id")?,
        owner_id: parse_uuid(row.get("owner_id")?, "goals.owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority,
        status,
        due_date,
        subtasks: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_subtask_row(row: &Row<'_>) -> StoreResult<Subtask> {
    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid completed value `{other}` in subtasks.completed"
            )));
        }
    };

    let subtask = Subtask {
        id: parse_uuid(row.get("id")?, "subtasks.id")?,
        goal_id: parse_uuid(row.get("goal_id")?, "subtasks.goal_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed,
        estimated_hours: row.get("estimated_hours")?,
        category: row.get("category")?,
        skills: decode_list(row.get("skills")?, "subtasks.skills")?,
        dependencies: decode_list(row.get("dependencies")?, "subtasks.dependencies")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    subtask.validate()?;
    Ok(subtask)
}

fn parse_user_row(row: &Row<'_>) -> StoreResult<User> {
    Ok(User {
        id: parse_uuid(row.get("id")?, "users.id")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid(text: String, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(&text)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn format_due_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

fn encode_list(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode list column: {err}")))
}

fn decode_list(text: String, column: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(&text)
        .map_err(|_| StoreError::InvalidData(format!("invalid list value `{text}` in {column}")))
}

fn map_unique_violation(err: rusqlite::Error, kind: EntityKind, key: String) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            StoreError::Duplicate { kind, key }
        }
        other => other.into(),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
