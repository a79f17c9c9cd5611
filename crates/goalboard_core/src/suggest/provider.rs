//! External suggestion provider port.

use crate::suggest::{SuggestionContext, SuggestionPlan};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Provider failure. Absorbed by the suggestion service, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider is not configured or not reachable.
    Unavailable(String),
    /// Call was made but failed.
    Request(String),
    /// Response did not satisfy the plan contract.
    Malformed(String),
    /// No answer within the configured bound.
    Timeout(Duration),
}

impl ProviderError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "provider_unavailable",
            Self::Request(_) => "provider_request_failed",
            Self::Malformed(_) => "provider_malformed",
            Self::Timeout(_) => "provider_timeout",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "suggestion provider unavailable: {message}"),
            Self::Request(message) => write!(f, "suggestion request failed: {message}"),
            Self::Malformed(message) => write!(f, "malformed suggestion payload: {message}"),
            Self::Timeout(limit) => {
                write!(f, "suggestion provider timed out after {}ms", limit.as_millis())
            }
        }
    }
}

impl Error for ProviderError {}

/// Source of AI-generated suggestions.
///
/// Implementations may block; the caller bounds the wait.
pub trait SuggestionProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn provider_id(&self) -> &str;

    fn generate(
        &self,
        description: &str,
        context: &SuggestionContext,
    ) -> Result<SuggestionPlan, ProviderError>;
}

/// Checks a provider plan and fills in `total_hours` when it is missing.
///
/// # Errors
/// - `Malformed` for an empty list, a blank title, or hours that are
///   negative or not finite.
pub fn validate_plan(mut plan: SuggestionPlan) -> Result<SuggestionPlan, ProviderError> {
    if plan.subtasks.is_empty() {
        return Err(ProviderError::Malformed("no subtasks".to_string()));
    }
    for (index, task) in plan.subtasks.iter().enumerate() {
        if task.title.trim().is_empty() {
            return Err(ProviderError::Malformed(format!(
                "subtask {index} has a blank title"
            )));
        }
        if !task.estimated_hours.is_finite() || task.estimated_hours < 0.0 {
            return Err(ProviderError::Malformed(format!(
                "subtask {index} has invalid hours"
            )));
        }
    }
    if let Some(total) = plan.total_hours {
        if !total.is_finite() || total < 0.0 {
            return Err(ProviderError::Malformed("invalid total hours".to_string()));
        }
    } else {
        plan.total_hours = Some(plan.summed_hours());
    }
    Ok(plan)
}
