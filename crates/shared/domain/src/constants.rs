//! Domain-level constants.
//!
//! These constants define business rules and security requirements.

// =============================================================================
// Account Roles
// =============================================================================

/// Default role assigned to new accounts
pub const ROLE_READER: &str = "reader";

/// Administrator role allowed to edit the catalog
pub const ROLE_ADMIN: &str = "admin";

/// All valid role values
pub const VALID_ROLES: &[&str] = &[ROLE_READER, ROLE_ADMIN];

/// Check if a role value is valid
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

// =============================================================================
// Authentication
// =============================================================================

/// Minimum secret key length for HMAC signing
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

/// Signing algorithms accepted for access tokens
pub const SUPPORTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Seconds per minute (for token expiration calculation)
pub const SECONDS_PER_MINUTE: i64 = 60;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Claim names owned by the token issuer; callers cannot set them.
pub const RESERVED_CLAIMS: &[&str] = &["sub", "exp", "iat"];
