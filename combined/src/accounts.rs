//! Account flows - registration, login and bearer authentication.
//!
//! Composes the credential service and the unit of work from the caller's
//! side: hashing and token work happen outside any transaction, storage
//! access happens inside one.

use std::sync::Arc;

use async_trait::async_trait;

use common::{AppError, AppResult};
use credentials::{ClaimSet, CredentialManager, CredentialService, TokenResponse};
use domain::{Account, AccountRole, Password};
use persistence::{with_transaction, UnitOfWork};

/// Account operations used by handlers and the CLI.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account
    async fn register(&self, email: String, password: String, role: AccountRole)
        -> AppResult<Account>;

    /// Check a password and issue an access token
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Resolve a bearer token to the stored account it names
    async fn authenticate(&self, token: &str) -> AppResult<Account>;

    /// Replace the password after checking the current one
    async fn change_password(
        &self,
        email: String,
        current: String,
        new_password: String,
    ) -> AppResult<Account>;
}

/// Reject callers whose stored role does not reach `required`.
pub fn require_role(account: &Account, required: AccountRole) -> AppResult<()> {
    if account.role.can_access(&required) {
        Ok(())
    } else {
        tracing::debug!(account = %account.id, required = %required, "Role check failed");
        Err(AppError::Forbidden)
    }
}

/// Concrete account service over a unit of work and a credential manager.
pub struct AccountManager<U: UnitOfWork> {
    uow: Arc<U>,
    credentials: CredentialManager,
    decoy: Password,
}

impl<U: UnitOfWork> AccountManager<U> {
    /// Builds the login decoy hash up front (one argon2 run).
    pub fn new(uow: Arc<U>, credentials: CredentialManager) -> Self {
        Self {
            uow,
            credentials,
            decoy: Password::decoy(),
        }
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    async fn find_by_email(&self, email: String) -> AppResult<Option<Account>> {
        with_transaction!(self.uow, |ctx| ctx.accounts().find_by_email(&email).await)
    }

    /// Look up an active account and check its password.
    ///
    /// A missing account is checked against a decoy hash so that unknown
    /// emails cost the same as wrong passwords.
    async fn check_password(&self, email: String, password: String) -> AppResult<Account> {
        let account = self.find_by_email(email).await?;

        let stored = match &account {
            Some(account) => account.password_hash.clone(),
            None => self.decoy.as_str().to_string(),
        };
        let password_valid = self
            .credentials
            .verify_password_blocking(password, stored)
            .await;

        match account {
            Some(account) if password_valid && account.is_active => Ok(account),
            _ => Err(AppError::InvalidCredentials),
        }
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let well_formed = matches!(
        email.split_once('@'),
        Some((local, host)) if !local.is_empty() && host.contains('.')
    );
    if !well_formed {
        return Err(AppError::validation("email address is malformed"));
    }
    Ok(email)
}

#[async_trait]
impl<U: UnitOfWork> AccountService for AccountManager<U> {
    async fn register(
        &self,
        email: String,
        password: String,
        role: AccountRole,
    ) -> AppResult<Account> {
        let email = normalize_email(&email)?;
        let password_hash = self.credentials.hash_password_blocking(password).await?;

        let account = with_transaction!(self.uow, |ctx| {
            let accounts = ctx.accounts();
            if accounts.find_by_email(&email).await?.is_some() {
                return Err(AppError::conflict("Account"));
            }
            accounts.create(email, password_hash, role).await
        })?;

        tracing::info!(account = %account.id, role = %account.role, "Account registered");
        Ok(account)
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let email = email.trim().to_lowercase();
        let account = self.check_password(email, password).await.map_err(|e| {
            tracing::debug!(error = %e, "Login rejected");
            e
        })?;

        let token = self
            .credentials
            .issue_bearer(ClaimSet::new(account.email.as_str()), None)?;
        tracing::info!(account = %account.id, "Login succeeded");
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> AppResult<Account> {
        let claims = self.credentials.verify_token(token)?;

        match self.find_by_email(claims.sub).await? {
            Some(account) if account.is_active => Ok(account),
            _ => Err(AppError::TokenInvalid),
        }
    }

    async fn change_password(
        &self,
        email: String,
        current: String,
        new_password: String,
    ) -> AppResult<Account> {
        let email = email.trim().to_lowercase();
        let account = self.check_password(email, current).await?;
        let password_hash = self
            .credentials
            .hash_password_blocking(new_password)
            .await?;

        let id = account.id;
        let account = with_transaction!(self.uow, |ctx| {
            ctx.accounts().update_password_hash(id, password_hash).await
        })?;

        tracing::info!(account = %account.id, "Password changed");
        Ok(account)
    }
}
