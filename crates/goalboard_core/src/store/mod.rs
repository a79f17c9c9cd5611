//! Goal store contract and backends.
//!
//! # Responsibility
//! - Define the storage port every command handler depends on.
//! - Provide the durable SQLite backend and the in-memory backend.
//! - Construct the configured backend at startup.
//!
//! # Invariants
//! - Both backends are observably identical through [`GoalStore`].
//! - Store instances are created explicitly and passed to services; there is
//!   no process-global store.

pub mod goal_store;
pub mod memory_store;
pub mod sqlite_store;

use crate::config::AppConfig;
use goal_store::{GoalStore, StoreResult};
use log::info;
use memory_store::MemoryGoalStore;
use sqlite_store::SqliteGoalStore;
use std::sync::Arc;

/// Builds the store backend selected by `config`.
///
/// A configured database path opens (and migrates) SQLite; otherwise an
/// empty in-memory store is returned.
pub fn open_store(config: &AppConfig) -> StoreResult<Arc<dyn GoalStore>> {
    match &config.database_path {
        Some(path) => {
            let store = SqliteGoalStore::open(path)?;
            info!("event=store_open module=store status=ok backend=sqlite");
            Ok(Arc::new(store))
        }
        None => {
            info!("event=store_open module=store status=ok backend=memory");
            Ok(Arc::new(MemoryGoalStore::new()))
        }
    }
}
