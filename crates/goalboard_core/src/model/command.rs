//! Caller-facing command inputs.
//!
//! These mirror the JSON bodies a presentation layer sends. Enum and date
//! fields stay raw strings here so that invalid values reach validation and
//! are rejected instead of being coerced during deserialization.

use serde::{Deserialize, Serialize};

/// Input for creating a goal, optionally with its initial subtasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    /// `HIGH|MEDIUM|LOW`; `MEDIUM` when absent.
    pub priority: Option<String>,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub subtasks: Vec<SubtaskDraft>,
}

impl GoalDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Input for creating one subtask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub estimated_hours: Option<f64>,
    pub category: Option<String>,
    pub skills: Vec<String>,
    pub dependencies: Vec<String>,
}

impl SubtaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial goal update. `None` keeps the stored value.
///
/// An empty string for `description` or `due_date` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

impl GoalPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}

/// Partial subtask update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubtaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub estimated_hours: Option<f64>,
    pub category: Option<String>,
    pub skills: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
}
