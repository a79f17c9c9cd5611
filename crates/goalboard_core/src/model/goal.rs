//! Goal and subtask domain model.
//!
//! # Responsibility
//! - Define the canonical Goal/Subtask records shared by every store backend.
//! - Parse and validate user-facing enum and date inputs.
//!
//! # Invariants
//! - `id` values are stable for the entity lifetime and never reused.
//! - Every subtask carries the `goal_id` of the goal that owns it.
//! - Titles are stored trimmed and non-empty.
//! - `estimated_hours`, when set, is finite and `>= 0`.

use crate::model::user::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable goal identifier.
pub type GoalId = Uuid;

/// Stable subtask identifier.
pub type SubtaskId = Uuid;

/// Goal priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(ValidationError::InvalidPriority(value.to_string())),
        }
    }
}

/// Goal lifecycle status.
///
/// `Active <-> Completed` is driven by subtask completion once a goal has
/// subtasks. `Paused` and `Cancelled` are only ever set by the owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub const ALL: [GoalStatus; 4] = [
        GoalStatus::Active,
        GoalStatus::Completed,
        GoalStatus::Paused,
        GoalStatus::Cancelled,
    ];

    /// Stable wire/storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Paused => "PAUSED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns whether the owner pinned this status explicitly.
    pub fn is_user_pinned(self) -> bool {
        matches!(self, Self::Paused | Self::Cancelled)
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            "PAUSED" => Ok(Self::Paused),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ValidationError::InvalidStatus(value.to_string())),
        }
    }
}

/// Input validation failures. Nothing is persisted when one is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyTitle,
    InvalidPriority(String),
    InvalidStatus(String),
    InvalidDueDate(String),
    InvalidEstimatedHours(f64),
    /// A subtask claims a parent other than the goal it is stored under.
    SubtaskParentMismatch {
        subtask_id: SubtaskId,
        goal_id: GoalId,
    },
    /// `COMPLETED` was requested while an incomplete subtask exists.
    StatusConflictsWithSubtasks {
        goal_id: GoalId,
        requested: GoalStatus,
    },
    InvalidEmail(String),
    EmptyName,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::InvalidPriority(value) => {
                write!(f, "invalid priority `{value}`; expected HIGH|MEDIUM|LOW")
            }
            Self::InvalidStatus(value) => write!(
                f,
                "invalid status `{value}`; expected ACTIVE|COMPLETED|PAUSED|CANCELLED"
            ),
            Self::InvalidDueDate(value) => {
                write!(f, "invalid due date `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidEstimatedHours(value) => {
                write!(f, "estimated hours must be a non-negative number, got {value}")
            }
            Self::SubtaskParentMismatch {
                subtask_id,
                goal_id,
            } => write!(f, "subtask {subtask_id} does not belong to goal {goal_id}"),
            Self::StatusConflictsWithSubtasks { goal_id, requested } => write!(
                f,
                "goal {goal_id} cannot be {requested} while it has incomplete subtasks"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::EmptyName => write!(f, "name must not be blank"),
        }
    }
}

impl Error for ValidationError {}

/// One actionable item owned by exactly one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: SubtaskId,
    pub goal_id: GoalId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Informational estimate; never negative.
    pub estimated_hours: Option<f64>,
    pub category: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Titles of items this one should follow. Ordering hint only.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Subtask {
    /// Creates an incomplete subtask under `goal_id` with a generated ID.
    pub fn new(goal_id: GoalId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            goal_id,
            title: title.into(),
            description: None,
            completed: false,
            estimated_hours: None,
            category: None,
            skills: Vec::new(),
            dependencies: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates fields that storage relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if let Some(hours) = self.estimated_hours {
            validate_hours(hours)?;
        }
        Ok(())
    }

    /// Bumps `updated_at` without letting it go backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }
}

/// Top-level user objective composed of subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: GoalStatus,
    pub due_date: Option<NaiveDate>,
    /// Creation order.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Goal {
    /// Creates an active, medium-priority goal with a generated ID.
    pub fn new(owner_id: UserId, title: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            status: GoalStatus::default(),
            due_date: None,
            subtasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates the goal and every owned subtask.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        for subtask in &self.subtasks {
            if subtask.goal_id != self.id {
                return Err(ValidationError::SubtaskParentMismatch {
                    subtask_id: subtask.id,
                    goal_id: self.id,
                });
            }
            subtask.validate()?;
        }
        Ok(())
    }

    pub fn subtask(&self, id: SubtaskId) -> Option<&Subtask> {
        self.subtasks.iter().find(|subtask| subtask.id == id)
    }

    pub fn subtask_mut(&mut self, id: SubtaskId) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|subtask| subtask.id == id)
    }

    pub fn completed_subtask_count(&self) -> usize {
        self.subtasks.iter().filter(|subtask| subtask.completed).count()
    }

    /// Bumps `updated_at` without letting it go backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Trims a title and rejects blank input.
pub fn normalize_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Parses a due date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (date part is kept).
pub fn parse_due_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| ValidationError::InvalidDueDate(raw.to_string()))
}

/// Rejects negative, NaN and infinite hour estimates.
pub fn validate_hours(hours: f64) -> Result<f64, ValidationError> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(ValidationError::InvalidEstimatedHours(hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_case_insensitively_and_rejects_unknown() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!(matches!(
            "URGENT".parse::<Priority>(),
            Err(ValidationError::InvalidPriority(value)) if value == "URGENT"
        ));
    }

    #[test]
    fn status_round_trips_through_as_str() {
        for status in GoalStatus::ALL {
            assert_eq!(status.as_str().parse::<GoalStatus>().unwrap(), status);
        }
        assert!("DONE".parse::<GoalStatus>().is_err());
    }

    #[test]
    fn due_date_accepts_plain_and_rfc3339_inputs() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 30).unwrap();
        assert_eq!(parse_due_date("2025-10-30").unwrap(), expected);
        assert_eq!(parse_due_date("2025-10-30T09:00:00Z").unwrap(), expected);
        assert!(parse_due_date("2025-02-30").is_err());
        assert!(parse_due_date("next friday").is_err());
    }

    #[test]
    fn validate_rejects_blank_title_and_foreign_subtask() {
        let owner = Uuid::new_v4();
        let blank = Goal::new(owner, "   ");
        assert_eq!(blank.validate(), Err(ValidationError::EmptyTitle));

        let mut goal = Goal::new(owner, "Ship");
        goal.subtasks.push(Subtask::new(Uuid::new_v4(), "stray"));
        assert!(matches!(
            goal.validate(),
            Err(ValidationError::SubtaskParentMismatch { .. })
        ));
    }

    #[test]
    fn negative_hours_are_rejected() {
        let mut subtask = Subtask::new(Uuid::new_v4(), "Estimate");
        subtask.estimated_hours = Some(-1.0);
        assert!(subtask.validate().is_err());
        subtask.estimated_hours = Some(f64::NAN);
        assert!(subtask.validate().is_err());
        subtask.estimated_hours = Some(0.0);
        assert!(subtask.validate().is_ok());
    }

    #[test]
    fn goal_serializes_with_camel_case_and_upper_enums() {
        let mut goal = Goal::new(Uuid::new_v4(), "Launch MVP");
        goal.priority = Priority::High;
        goal.due_date = Some(NaiveDate::from_ymd_opt(2025, 10, 30).unwrap());

        let value = serde_json::to_value(&goal).unwrap();
        assert_eq!(value["priority"], "HIGH");
        assert_eq!(value["status"], "ACTIVE");
        assert_eq!(value["dueDate"], "2025-10-30");
        assert!(value.get("ownerId").is_some());
    }
}
