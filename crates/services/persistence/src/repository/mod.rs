//! Repository layer for data access.

pub mod entities;
mod account_repository;

pub use account_repository::TxAccountRepository;
