//! User account model.
//!
//! Password hashing happens outside core; `password_hash` is stored opaque.

use crate::model::goal::{now_epoch_ms, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Stable user identifier. Goals reference their owner through it.
pub type UserId = Uuid;

/// Account that owns goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Trimmed, lower-cased, unique.
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Builds a user with a generated ID, normalizing email and names.
    pub fn new(
        email: &str,
        password_hash: impl Into<String>,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let first_name = first_name.trim();
        if first_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            email: normalize_email(email)?,
            password_hash: password_hash.into(),
            first_name: first_name.to_string(),
            last_name: last_name
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            created_at: now_epoch_ms(),
        })
    }
}

/// Trims and lower-cases an email, rejecting values without `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(ValidationError::InvalidEmail(raw.to_string()));
    }
    Ok(normalized)
}
