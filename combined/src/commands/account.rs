//! Account command - account flows against the configured database.

use std::sync::Arc;

use common::{AppError, AppResult, Settings};
use credentials::CredentialManager;
use domain::{is_valid_role, AccountRole};
use persistence::{Database, Persistence};

use crate::accounts::{AccountManager, AccountService};
use crate::cli::args::{AccountAction, AccountArgs};
use crate::commands::token::strip_bearer;

/// Execute the account command
pub async fn execute(args: AccountArgs, settings: &Settings) -> AppResult<()> {
    let db = Database::connect(&settings.database).await?;
    let service = AccountManager::new(
        Arc::new(Persistence::from(&db)),
        CredentialManager::new(&settings.security)?,
    );

    let result = run(&service, args.action).await;
    finish(result, db.close().await)
}

/// The command's own error wins over a failure to close the pool.
fn finish(result: AppResult<()>, closed: AppResult<()>) -> AppResult<()> {
    if let (Err(_), Err(close_err)) = (&result, &closed) {
        tracing::warn!(error = %close_err, "Closing the database pool failed");
    }
    result.and(closed)
}

async fn run<S: AccountService>(service: &S, action: AccountAction) -> AppResult<()> {
    match action {
        AccountAction::Register {
            email,
            password,
            role,
        } => {
            let role = parse_role(&role)?;
            let account = service.register(email, password, role).await?;
            println!("{} {} {}", account.id, account.email, account.role);
        }
        AccountAction::Login { email, password } => {
            let token = service.login(email, password).await?;
            println!("{} {}", token.token_type, token.access_token);
        }
        AccountAction::Whoami { token } => {
            let account = service.authenticate(strip_bearer(&token)).await?;
            let rendered = serde_json::to_string_pretty(&account)
                .map_err(|e| AppError::internal(e.to_string()))?;
            println!("{}", rendered);
        }
        AccountAction::Passwd {
            email,
            current,
            new,
        } => {
            let account = service.change_password(email, current, new).await?;
            println!("{} password updated", account.email);
        }
    }

    Ok(())
}

fn parse_role(role: &str) -> AppResult<AccountRole> {
    let role = role.trim().to_lowercase();
    if !is_valid_role(&role) {
        return Err(AppError::validation(format!("unknown role {:?}", role)));
    }
    Ok(AccountRole::from(role.as_str()))
}
