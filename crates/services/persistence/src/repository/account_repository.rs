//! Transaction-scoped account repository.
//!
//! Borrows the unit's transaction, so every read and write it performs
//! commits or rolls back together with the rest of the unit.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::account::{self, ActiveModel, Entity as AccountEntity};
use common::{AppError, AppResult, OptionExt};
use domain::{Account, AccountRole};

/// Account repository bound to one open transaction.
pub struct TxAccountRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxAccountRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Find account by ID
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        let result = AccountEntity::find_by_id(id).one(self.txn).await?;
        Ok(result.map(Account::from))
    }

    /// Find account by login email
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        let result = AccountEntity::find()
            .filter(account::Column::Email.eq(email))
            .one(self.txn)
            .await?;

        Ok(result.map(Account::from))
    }

    /// Create a new active, unverified account
    pub async fn create(
        &self,
        email: String,
        password_hash: String,
        role: AccountRole,
    ) -> AppResult<Account> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role.to_string()),
            is_active: Set(true),
            is_verified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(self.txn)
            .await
            .map_err(conflict_on_duplicate)?;

        Ok(Account::from(model))
    }

    /// Replace the stored password hash
    pub async fn update_password_hash(&self, id: Uuid, password_hash: String) -> AppResult<Account> {
        self.modify(id, |active| active.password_hash = Set(password_hash))
            .await
    }

    /// Change the role tag
    pub async fn set_role(&self, id: Uuid, role: AccountRole) -> AppResult<Account> {
        self.modify(id, |active| active.role = Set(role.to_string()))
            .await
    }

    /// Enable or disable login for the account
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<Account> {
        self.modify(id, |active| active.is_active = Set(is_active))
            .await
    }

    pub async fn mark_verified(&self, id: Uuid) -> AppResult<Account> {
        self.modify(id, |active| active.is_verified = Set(true))
            .await
    }

    /// Number of stored accounts
    pub async fn count(&self) -> AppResult<u64> {
        Ok(AccountEntity::find().count(self.txn).await?)
    }

    /// List accounts ordered by email
    pub async fn list(&self) -> AppResult<Vec<Account>> {
        let models = AccountEntity::find()
            .order_by_asc(account::Column::Email)
            .all(self.txn)
            .await?;

        Ok(models.into_iter().map(Account::from).collect())
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> AppResult<Account>
    where
        F: FnOnce(&mut ActiveModel),
    {
        let model = AccountEntity::find_by_id(id)
            .one(self.txn)
            .await?
            .ok_or_not_found()?;

        let mut active: ActiveModel = model.into();
        change(&mut active);
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.txn).await?;
        Ok(Account::from(model))
    }
}

fn conflict_on_duplicate(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Account"),
        _ => AppError::from(err),
    }
}
