//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module and receives the settings
//! loaded once at startup.

pub mod account;
pub mod db;
pub mod migrate;
pub mod token;
