//! Shared helpers for persistence integration tests.

use std::time::Duration;

use common::{DatabaseConfig, PoolConfig};
use persistence::{Database, Persistence};

/// In-memory SQLite pool with a single connection and the given acquire timeout.
pub fn single_connection_config(timeout: Duration) -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        pool: PoolConfig {
            size: 1,
            max_overflow: 0,
            timeout,
            ..PoolConfig::default()
        },
        echo: false,
    }
}

/// Migrated single-connection database and a unit of work over it.
pub async fn setup(timeout: Duration) -> (Database, Persistence) {
    let db = Database::connect(&single_connection_config(timeout))
        .await
        .expect("in-memory database should open");
    let uow = Persistence::from(&db);
    (db, uow)
}
