//! Leyendas operator tooling.
//!
//! Account flows built on the credential service and the unit of work, plus
//! the CLI that drives them.

pub mod accounts;
pub mod cli;
pub mod commands;

pub use accounts::{require_role, AccountManager, AccountService};
