pub mod goal;
pub mod subtask;
pub mod suggest;

use std::sync::Arc;

use anyhow::{anyhow, bail};
use goalboard_core::{
    AppConfig, GoalService, GoalStore, NewUser, SuggestionService, UserId, UserService,
};
use serde::Serialize;

/// Services shared by every command, all over one store instance.
pub struct App {
    pub goals: GoalService<Arc<dyn GoalStore>>,
    pub users: UserService<Arc<dyn GoalStore>>,
    pub suggestions: SuggestionService,
    durable: bool,
}

impl App {
    pub fn new(store: Arc<dyn GoalStore>, config: &AppConfig) -> Self {
        Self {
            goals: GoalService::new(Arc::clone(&store)),
            users: UserService::new(store),
            // No network provider ships with the CLI.
            suggestions: SuggestionService::from_config(config, None),
            durable: config.uses_durable_store(),
        }
    }

    /// Resolves `--owner EMAIL` to a registered user id.
    pub fn owner_id(&self, owner: Option<&str>) -> anyhow::Result<UserId> {
        let Some(email) = owner else {
            bail!("--owner EMAIL is required for this command");
        };
        self.users
            .find_by_email(email)?
            .map(|user| user.id)
            .ok_or_else(|| {
                if self.durable {
                    anyhow!("no user registered with email `{email}`")
                } else {
                    anyhow!(
                        "no user registered with email `{email}`; the in-memory store starts \
                         empty on every run, pass --db or set GOALBOARD_DB_PATH"
                    )
                }
            })
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn register(
    app: &App,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: Option<&str>,
) -> anyhow::Result<()> {
    let user = app.users.register(NewUser {
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.map(str::to_string),
    })?;
    print_json(&user)
}

pub fn stats(app: &App, owner: Option<&str>) -> anyhow::Result<()> {
    let owner_id = app.owner_id(owner)?;
    let today = chrono::Local::now().date_naive();
    print_json(&app.goals.dashboard_stats(owner_id, today)?)
}

#[cfg(test)]
mod tests {
    use super::{register, App};
    use goalboard_core::{AppConfig, GoalStore, MemoryGoalStore, SqliteGoalStore};
    use std::sync::Arc;

    fn memory_app() -> App {
        let store: Arc<dyn GoalStore> = Arc::new(MemoryGoalStore::new());
        App::new(store, &AppConfig::default())
    }

    #[test]
    fn unknown_owner_on_memory_store_points_at_db_flag() {
        let app = memory_app();
        let err = app.owner_id(Some("ada@example.com")).unwrap_err();
        assert!(err.to_string().contains("pass --db"), "{err}");
        assert!(app.owner_id(None).is_err());
    }

    #[test]
    fn unknown_owner_on_durable_store_has_plain_message() {
        let store: Arc<dyn GoalStore> = Arc::new(SqliteGoalStore::open_in_memory().unwrap());
        let config = AppConfig {
            database_path: Some("goalboard.db".into()),
            ..AppConfig::default()
        };
        let app = App::new(store, &config);
        let err = app.owner_id(Some("ada@example.com")).unwrap_err();
        assert_eq!(err.to_string(), "no user registered with email `ada@example.com`");
    }

    #[test]
    fn registered_owner_resolves_within_one_run() {
        let app = memory_app();
        register(&app, "ada@example.com", "hash", "Ada", None).unwrap();
        let owner = app.owner_id(Some("ada@example.com")).unwrap();
        assert_eq!(app.users.get(owner).unwrap().email, "ada@example.com");
    }
}
