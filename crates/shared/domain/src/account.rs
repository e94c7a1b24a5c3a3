//! Account domain entity and role tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_READER};

/// Account roles: catalog administrators and everyone else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    #[default]
    Reader,
}

impl AccountRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }

    /// Check if this role can access a required role
    pub fn can_access(&self, required: &AccountRole) -> bool {
        match self {
            AccountRole::Admin => true,
            AccountRole::Reader => matches!(required, AccountRole::Reader),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => ROLE_ADMIN,
            AccountRole::Reader => ROLE_READER,
        }
    }
}

impl From<&str> for AccountRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => AccountRole::Admin,
            _ => AccountRole::Reader,
        }
    }
}

impl From<AccountRole> for String {
    fn from(role: AccountRole) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account domain entity.
///
/// `password_hash` is the stored credential record; it is skipped on
/// serialization so it never leaves the process in a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: AccountRole,
    pub is_active: bool,
    /// Stored for the registration flow; not enforced at login.
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active, unverified account
    pub fn new(id: Uuid, email: String, password_hash: String, role: AccountRole) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            password_hash,
            role,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if account has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_defaults_to_reader() {
        assert_eq!(AccountRole::from("admin"), AccountRole::Admin);
        assert_eq!(AccountRole::from("reader"), AccountRole::Reader);
        assert_eq!(AccountRole::from("superuser"), AccountRole::Reader);
        assert_eq!(AccountRole::default(), AccountRole::Reader);
    }

    #[test]
    fn test_role_access() {
        assert!(AccountRole::Admin.can_access(&AccountRole::Reader));
        assert!(AccountRole::Admin.can_access(&AccountRole::Admin));
        assert!(!AccountRole::Reader.can_access(&AccountRole::Admin));
    }

    #[test]
    fn test_new_account_defaults() {
        let account = Account::new(
            Uuid::new_v4(),
            "lector@leyendas.cr".to_string(),
            "hash".to_string(),
            AccountRole::Reader,
        );
        assert!(account.is_active);
        assert!(!account.is_verified);
        assert!(!account.is_admin());
    }

    #[test]
    fn test_serialization_hides_password_hash() {
        let account = Account::new(
            Uuid::new_v4(),
            "admin@leyendas.cr".to_string(),
            "$argon2id$secret".to_string(),
            AccountRole::Admin,
        );
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
