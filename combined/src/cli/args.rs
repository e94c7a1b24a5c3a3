//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Leyendas - credential and session tooling for the catalog backend
#[derive(Parser, Debug)]
#[command(name = "leyendas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate(MigrateArgs),

    /// Manage accounts
    Account(AccountArgs),

    /// Issue and verify access tokens
    Token(TokenArgs),

    /// Hash a password with the configured scheme
    HashPassword {
        /// Plain-text password
        #[arg(long, env = "LEYENDAS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Database utilities
    Db(DbArgs),
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

/// Arguments for the account command
#[derive(Parser, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub action: AccountAction,
}

/// Account actions
#[derive(Subcommand, Debug)]
pub enum AccountAction {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LEYENDAS_PASSWORD", hide_env_values = true)]
        password: String,
        /// Role tag ("reader" or "admin")
        #[arg(long, default_value = "reader")]
        role: String,
    },
    /// Log in and print a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LEYENDAS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the account a token belongs to
    Whoami {
        /// Access token, with or without the "Bearer " prefix
        token: String,
    },
    /// Change an account's password
    Passwd {
        #[arg(long)]
        email: String,
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
}

/// Arguments for the token command
#[derive(Parser, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub action: TokenAction,
}

/// Token actions
#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Sign a token for an arbitrary subject
    Issue {
        /// Subject claim
        #[arg(long)]
        subject: String,
        /// Extra claim as name=value (value parsed as JSON when possible)
        #[arg(long = "claim", value_name = "NAME=VALUE")]
        claims: Vec<String>,
        /// Lifetime in minutes (defaults to ACCESS_TOKEN_EXPIRE_MINUTES)
        #[arg(long)]
        expires_minutes: Option<i64>,
    },
    /// Check a token and print its claims
    Verify {
        /// Access token, with or without the "Bearer " prefix
        token: String,
    },
}

/// Arguments for the db command
#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub action: DbAction,
}

/// Database actions
#[derive(Subcommand, Debug)]
pub enum DbAction {
    /// Open a session and run a trivial query
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_token_issue() {
        let cli = Cli::try_parse_from([
            "leyendas",
            "token",
            "issue",
            "--subject",
            "lector@leyendas.cr",
            "--claim",
            "scope=\"catalog\"",
            "--claim",
            "level=3",
            "--expires-minutes",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Token(TokenArgs {
                action:
                    TokenAction::Issue {
                        subject,
                        claims,
                        expires_minutes,
                    },
            }) => {
                assert_eq!(subject, "lector@leyendas.cr");
                assert_eq!(claims.len(), 2);
                assert_eq!(expires_minutes, Some(5));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["leyendas", "db", "ping", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
