//! Db command - connectivity checks through the unit of work.

use common::{AppResult, Settings};
use persistence::{Database, Persistence, UnitOfWork};

use crate::cli::args::{DbArgs, DbAction};

/// Execute the db command
pub async fn execute(args: DbArgs, settings: &Settings) -> AppResult<()> {
    match args.action {
        DbAction::Ping => {
            let db = Database::connect_without_migrations(&settings.database).await?;
            let uow = Persistence::from(&db);

            // Goes through the pool the same way a request would
            let session = uow.begin().await?;
            let unit = session.id();
            session.rollback().await?;
            db.ping().await?;

            tracing::info!(
                unit = %unit,
                max_connections = settings.database.pool.max_connections(),
                "Database reachable"
            );
            println!("ok");
            db.close().await
        }
    }
}
