//! Unit of Work pattern implementation.
//!
//! A unit of work owns one pooled connection with an open transaction.
//! It ends in exactly one of commit or rollback, and the connection goes
//! back to the pool when the [`Session`] is consumed or dropped:
//!
//! - `Session::commit` and `Session::rollback` take `self`, so a finished
//!   session cannot be used or released a second time.
//! - Dropping an unfinished session (early return, panic) rolls back.
//! - `UnitOfWork::transaction` decides commit vs rollback from the unit's
//!   `Result` and returns the unit's error unchanged.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use uuid::Uuid;

use crate::infra::Database;
use crate::repository::TxAccountRepository;
use common::AppResult;

/// Future returned by a unit body; borrows the transaction context.
pub type UnitFuture<'a, T> = BoxFuture<'a, AppResult<T>>;

/// Unit of Work trait for dependency injection.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Acquire a connection and open a transaction on it.
    ///
    /// Fails with `ResourceExhausted` if the pool cannot supply a connection
    /// within its acquire timeout.
    async fn begin(&self) -> AppResult<Session>;

    /// Execute a closure within a transaction.
    ///
    /// Commits when the closure returns `Ok`; rolls back and returns the
    /// closure's error when it returns `Err`. Uses the engine's default
    /// isolation level.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> UnitFuture<'a, T> + Send,
        T: Send;

    /// Execute a closure within a serializable, read-write transaction.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> UnitFuture<'a, T> + Send,
        T: Send;
}

/// Transaction context providing repository access within a transaction.
///
/// All repository operations performed through this context are part
/// of the same database transaction.
#[derive(Clone, Copy)]
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Get account repository for this transaction
    pub fn accounts(&self) -> TxAccountRepository<'a> {
        TxAccountRepository::new(self.txn)
    }
}

/// An open unit of work holding one exclusive pooled connection.
pub struct Session {
    id: Uuid,
    txn: DatabaseTransaction,
}

impl Session {
    fn new(txn: DatabaseTransaction) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(unit = %id, "Database session opened");
        Self { id, txn }
    }

    /// Identifier used to correlate this unit's log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> TransactionContext<'_> {
        TransactionContext::new(&self.txn)
    }

    /// Get account repository for this session
    pub fn accounts(&self) -> TxAccountRepository<'_> {
        TxAccountRepository::new(&self.txn)
    }

    /// Make the unit's writes durable and release the connection.
    pub async fn commit(self) -> AppResult<()> {
        let id = self.id;
        match self.txn.commit().await {
            Ok(()) => {
                tracing::debug!(unit = %id, "Database session committed and closed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(unit = %id, error = %e, "Commit failed; session closed");
                Err(e.into())
            }
        }
    }

    /// Discard the unit's writes and release the connection.
    pub async fn rollback(self) -> AppResult<()> {
        let id = self.id;
        self.txn.rollback().await?;
        tracing::debug!(unit = %id, "Database session rolled back and closed");
        Ok(())
    }
}

/// Concrete implementation of UnitOfWork over a sea-orm connection pool
#[derive(Clone)]
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn open(&self, isolation: Option<IsolationLevel>) -> AppResult<Session> {
        let txn = match isolation {
            Some(level) => {
                self.db
                    .begin_with_config(Some(level), Some(AccessMode::ReadWrite))
                    .await
            }
            None => self.db.begin().await,
        }
        .map_err(|e| {
            tracing::warn!(error = %e, "Could not open database session");
            e
        })?;

        Ok(Session::new(txn))
    }

    async fn execute_transaction<F, T>(&self, isolation: Option<IsolationLevel>, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> UnitFuture<'a, T> + Send,
        T: Send,
    {
        let session = self.open(isolation).await?;

        let outcome = f(session.context()).await;

        match outcome {
            Ok(result) => {
                session.commit().await?;
                Ok(result)
            }
            Err(e) => {
                let id = session.id();
                tracing::error!(unit = %id, error = %e, "Unit of work failed; rolling back");
                if let Err(rollback_err) = session.rollback().await {
                    tracing::error!(unit = %id, error = %rollback_err, "Transaction rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl From<&Database> for Persistence {
    fn from(db: &Database) -> Self {
        Self::new(db.get_connection())
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    async fn begin(&self) -> AppResult<Session> {
        self.open(None).await
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> UnitFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(None, f).await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> UnitFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(Some(IsolationLevel::Serializable), f)
            .await
    }
}

/// Run a block as a unit of work.
///
/// ```ignore
/// let count = with_transaction!(uow, |ctx| ctx.accounts().count().await)?;
/// ```
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
