//! Database connection pool and initialization.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, Statement,
};
use sea_orm_migration::MigratorTrait;

use super::migrations::Migrator;
use common::{AppResult, DatabaseConfig};

/// Translate pool settings into sea-orm connect options.
///
/// `size` connections are kept open; up to `max_overflow` more are opened
/// under load and closed again once idle. Every connection is replaced after
/// `recycle`, and waiting for a free one is bounded by `timeout`.
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let pool = &config.pool;
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(pool.max_connections())
        .min_connections(pool.size)
        .acquire_timeout(pool.timeout)
        .connect_timeout(pool.timeout)
        .max_lifetime(pool.recycle)
        .test_before_acquire(pool.pre_ping)
        .sqlx_logging(config.echo);

    if pool.max_overflow > 0 {
        options.idle_timeout(pool.overflow_idle);
    }

    options
}

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Open the pool and run pending migrations.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let db = Self::connect_without_migrations(config).await?;

        Migrator::up(&db.connection, None).await?;
        tracing::info!(
            pool_size = config.pool.size,
            max_overflow = config.pool.max_overflow,
            "Database connected and migrations applied"
        );

        Ok(db)
    }

    /// Open the pool without touching the schema (for CLI commands).
    pub async fn connect_without_migrations(config: &DatabaseConfig) -> AppResult<Self> {
        let connection = SeaDatabase::connect(connect_options(config)).await?;
        Ok(Self { connection })
    }

    /// Get a clone of the database connection (shares the same pool).
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Run pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Ok(Migrator::up(&self.connection, None).await?)
    }

    /// Rollback the last migration.
    pub async fn rollback_migration(&self) -> AppResult<()> {
        Ok(Migrator::down(&self.connection, Some(1)).await?)
    }

    /// Get migration status (list all migrations with applied status).
    pub async fn migration_status(&self) -> AppResult<Vec<(String, bool)>> {
        use sea_orm::{EntityTrait, QueryOrder};
        use sea_orm_migration::seaql_migrations;

        let applied: std::collections::HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let migrations = Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect();

        Ok(migrations)
    }

    /// Reset database and run all migrations fresh.
    pub async fn fresh_migrations(&self) -> AppResult<()> {
        Ok(Migrator::fresh(&self.connection).await?)
    }

    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> AppResult<()> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }

    /// Close every pooled connection.
    pub async fn close(self) -> AppResult<()> {
        Ok(self.connection.close().await?)
    }
}
