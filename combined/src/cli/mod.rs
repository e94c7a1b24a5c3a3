//! CLI module - Operator command-line interface.
//!
//! Provides commands for:
//! - `migrate` - Database migrations
//! - `account` - Register, log in, inspect and re-password accounts
//! - `token` - Issue and inspect access tokens
//! - `hash-password` - Print a password hash
//! - `db` - Connectivity checks

pub mod args;

pub use args::{Cli, Commands};
