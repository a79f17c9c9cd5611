//! User registration and lookup.
//!
//! Credentials are produced outside core; this service only stores the
//! opaque hash it is handed.

use crate::model::user::{normalize_email, User, UserId};
use crate::service::goal_service::{ServiceError, ServiceResult};
use crate::store::goal_store::{EntityKind, GoalStore};
use log::{info, warn};
use serde::Deserialize;

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// User use-case service over an injected store.
pub struct UserService<S: GoalStore> {
    store: S,
}

impl<S: GoalStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a user.
    ///
    /// # Errors
    /// - `Validation` for a malformed email or blank first name.
    /// - `Duplicate` when the normalized email is already registered.
    pub fn register(&self, input: NewUser) -> ServiceResult<User> {
        let user = User::new(
            &input.email,
            input.password_hash,
            &input.first_name,
            input.last_name.as_deref(),
        )?;
        if self.store.find_user_by_email(&user.email)?.is_some() {
            warn!("event=user_register module=service status=rejected error_code=duplicate");
            return Err(ServiceError::Duplicate {
                kind: EntityKind::User,
                key: user.email,
            });
        }

        match self.store.create_user(&user) {
            Ok(()) => {
                info!(
                    "event=user_register module=service status=ok user_id={}",
                    user.id
                );
                Ok(user)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    "event=user_register module=service status=rejected error_code={}",
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Looks up a user by email; matching ignores case and surrounding space.
    pub fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let email = normalize_email(email)?;
        Ok(self.store.find_user_by_email(&email)?)
    }

    /// Loads a user by id.
    pub fn get(&self, user_id: UserId) -> ServiceResult<User> {
        self.store
            .get_user(user_id)?
            .ok_or(ServiceError::NotFound {
                kind: EntityKind::User,
                id: user_id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewUser, UserService};
    use crate::service::goal_service::ServiceError;
    use crate::store::memory_store::MemoryGoalStore;

    fn ada() -> NewUser {
        NewUser {
            email: "Ada@Example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
        }
    }

    #[test]
    fn register_then_lookup_by_email_and_id() {
        let service = UserService::new(MemoryGoalStore::new());
        let user = service.register(ada()).unwrap();
        assert_eq!(user.email, "ada@example.com");

        let found = service.find_by_email(" ADA@example.com ").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(service.get(user.id).unwrap().first_name, "Ada");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let service = UserService::new(MemoryGoalStore::new());
        service.register(ada()).unwrap();

        let err = service
            .register(NewUser {
                email: "ada@example.com".to_string(),
                ..ada()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate { .. }));
        assert_eq!(err.code(), "duplicate");
    }

    #[test]
    fn unknown_user_id_is_not_found() {
        let service = UserService::new(MemoryGoalStore::new());
        let err = service.get(uuid::Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
