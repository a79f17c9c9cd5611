//! Subtask suggestions for a goal description.
//!
//! # Responsibility
//! - Define the suggestion payload shared by the provider and the fallback.
//! - Bound the wait on an external provider and degrade to the keyword
//!   fallback on any failure.
//!
//! # Invariants
//! - Callers always receive a plan; provider failures are logged, never
//!   surfaced.

pub mod fallback;
pub mod provider;
pub mod service;

use crate::model::command::SubtaskDraft;
use serde::{Deserialize, Serialize};

/// Advisory context for a suggestion request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionContext {
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub team_size: Option<u32>,
    pub skill_level: Option<String>,
    pub complexity: Option<String>,
}

/// One suggested subtask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_hours: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Where a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionSource {
    Provider,
    Fallback,
}

/// Ordered suggestion list with summary data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionPlan {
    pub subtasks: Vec<SuggestedTask>,
    /// Sum of `estimated_hours`. Providers may omit it.
    #[serde(default)]
    pub total_hours: Option<f64>,
    #[serde(default)]
    pub tips: Vec<String>,
    pub source: SuggestionSource,
}

impl SuggestionPlan {
    pub fn summed_hours(&self) -> f64 {
        self.subtasks.iter().map(|task| task.estimated_hours).sum()
    }
}

impl From<&SuggestedTask> for SubtaskDraft {
    fn from(task: &SuggestedTask) -> Self {
        Self {
            description: task.description.clone(),
            estimated_hours: Some(task.estimated_hours),
            category: task.category.clone(),
            skills: task.skills.clone(),
            dependencies: task.dependencies.clone(),
            ..SubtaskDraft::new(task.title.clone())
        }
    }
}
