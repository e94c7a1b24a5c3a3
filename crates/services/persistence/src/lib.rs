//! Persistence Library
//!
//! Connection pool, unit-of-work sessions and the account table.
//! Every data operation runs inside a unit of work that either commits or
//! rolls back, and hands its connection back to the pool exactly once.

pub mod infra;
pub mod repository;
pub mod unit_of_work;

pub use infra::{Database, Migrator};
pub use repository::TxAccountRepository;
pub use unit_of_work::{Persistence, Session, TransactionContext, UnitFuture, UnitOfWork};
