//! Credential service - password hashing and access tokens.
//!
//! Tokens are HMAC-signed JWTs. The expiry check runs against the injected
//! [`Clock`] with zero leeway, so a token is valid strictly while `now < exp`.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clock::{Clock, SystemClock};
use common::{AppError, AppResult, SecurityConfig};
use domain::{Password, BEARER_TOKEN_PREFIX, RESERVED_CLAIMS, TOKEN_TYPE_BEARER};

/// Claims supplied by the caller when a token is issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet {
    /// Login identity the token speaks for
    pub subject: String,
    /// Additional caller-defined claims
    pub extra: Map<String, Value>,
}

impl ClaimSet {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            extra: Map::new(),
        }
    }

    /// Add an extra claim. Reserved names (`sub`, `exp`, `iat`) are
    /// overwritten by the issuer.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// JWT claims payload as verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Look up an extra claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Credential service trait for dependency injection.
pub trait CredentialService: Send + Sync {
    /// Hash a non-empty password into a self-describing PHC string
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Check a candidate against a stored hash; any failure is `false`
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Sign a claim set, expiring after `expires_in` or the configured default
    fn issue_token(&self, claims: ClaimSet, expires_in: Option<Duration>) -> AppResult<String>;

    /// Verify signature and expiry; every failure is `TokenInvalid`
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Concrete credential service built from the startup [`SecurityConfig`].
#[derive(Clone)]
pub struct CredentialManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    default_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialManager {
    /// Create a credential service using the wall clock
    pub fn new(config: &SecurityConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a credential service with an explicit time source
    pub fn with_clock(config: &SecurityConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let algorithm = Algorithm::from_str(config.algorithm()).map_err(|_| {
            AppError::internal(format!("Unsupported signing algorithm {}", config.algorithm()))
        })?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret_key_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key_bytes()),
            algorithm,
            default_lifetime: config.default_token_lifetime(),
            clock,
        })
    }

    /// Lifetime used when `issue_token` is called without one
    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    /// Issue a token and wrap it in a bearer response
    pub fn issue_bearer(
        &self,
        claims: ClaimSet,
        expires_in: Option<Duration>,
    ) -> AppResult<TokenResponse> {
        let lifetime = expires_in.unwrap_or(self.default_lifetime);
        let access_token = self.issue_token(claims, Some(lifetime))?;

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Hash on tokio's blocking pool so the async scheduler is not stalled.
    pub async fn hash_password_blocking(&self, password: String) -> AppResult<String> {
        tokio::task::spawn_blocking(move || {
            Password::new(&password)
                .map(Password::into_string)
                .map_err(AppError::from)
        })
        .await
        .map_err(|e| AppError::internal(format!("Hashing task failed: {}", e)))?
    }

    /// Verify on tokio's blocking pool. A failed task counts as a mismatch.
    pub async fn verify_password_blocking(&self, password: String, hash: String) -> bool {
        tokio::task::spawn_blocking(move || Password::from_hash(hash).verify(&password))
            .await
            .unwrap_or(false)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked against our clock below, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl CredentialService for CredentialManager {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        Ok(Password::new(password)?.into_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        Password::from_hash(hash).verify(password)
    }

    fn issue_token(&self, claims: ClaimSet, expires_in: Option<Duration>) -> AppResult<String> {
        if claims.subject.trim().is_empty() {
            return Err(AppError::validation("Token subject must not be empty"));
        }

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(expires_in.unwrap_or(self.default_lifetime))
            .ok_or_else(|| AppError::validation("Token lifetime out of range"))?;

        let mut extra = claims.extra;
        for name in RESERVED_CLAIMS {
            if extra.remove(*name).is_some() {
                tracing::debug!(claim = *name, "Ignoring caller-supplied reserved claim");
            }
        }

        let payload = Claims {
            sub: claims.subject,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            extra,
        };

        encode(&Header::new(self.algorithm), &payload, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token signing failed: {}", e)))
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AppError::TokenInvalid
            })?;

        if self.clock.now().timestamp() >= token_data.claims.exp {
            tracing::debug!("Token rejected: expired");
            return Err(AppError::TokenInvalid);
        }

        Ok(token_data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> AppResult<&str> {
    header_value
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
    const T0: i64 = 1_700_000_000;

    fn config(secret: &str, algorithm: &str, minutes: i64) -> SecurityConfig {
        SecurityConfig::new(secret, algorithm, minutes).unwrap()
    }

    /// Clock whose current second is controlled through the returned handle.
    fn manual_clock(start: i64) -> (Arc<AtomicI64>, Arc<dyn Clock>) {
        let now = Arc::new(AtomicI64::new(start));
        let handle = now.clone();
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(move || Utc.timestamp_opt(handle.load(Ordering::SeqCst), 0).unwrap());
        (now, Arc::new(clock))
    }

    fn manager_at(start: i64, minutes: i64) -> (Arc<AtomicI64>, CredentialManager) {
        let (now, clock) = manual_clock(start);
        let manager =
            CredentialManager::with_clock(&config(SECRET, "HS256", minutes), clock).unwrap();
        (now, manager)
    }

    #[test]
    fn test_password_round_trip() {
        let (_, manager) = manager_at(T0, 30);
        let hash = manager.hash_password("guanacaste").unwrap();

        assert!(manager.verify_password("guanacaste", &hash));
        assert!(!manager.verify_password("Guanacaste", &hash));
    }

    #[test]
    fn test_same_password_hashes_differ() {
        let (_, manager) = manager_at(T0, 30);
        let first = manager.hash_password("la-llorona").unwrap();
        let second = manager.hash_password("la-llorona").unwrap();

        assert_ne!(first, second);
        assert!(manager.verify_password("la-llorona", &first));
        assert!(manager.verify_password("la-llorona", &second));
    }

    #[test]
    fn test_verify_malformed_hash_is_false() {
        let (_, manager) = manager_at(T0, 30);
        assert!(!manager.verify_password("anything", "plaintext-in-the-column"));
        assert!(!manager.verify_password("anything", ""));
    }

    #[test]
    fn test_empty_password_rejected() {
        let (_, manager) = manager_at(T0, 30);
        assert!(matches!(
            manager.hash_password(""),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_token_round_trip_preserves_claims() {
        let (_, manager) = manager_at(T0, 30);
        let claim_set = ClaimSet::new("lector@leyendas.cr")
            .with_claim("province", "Cartago")
            .with_claim("scopes", json!(["read", "comment"]));

        let token = manager.issue_token(claim_set.clone(), None).unwrap();
        let claims = manager.verify_token(&token).unwrap();

        assert_eq!(claims.sub, claim_set.subject);
        assert_eq!(claims.extra, claim_set.extra);
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 30 * 60);
        assert_eq!(claims.get("province"), Some(&json!("Cartago")));
    }

    #[test]
    fn test_explicit_lifetime_overrides_default() {
        let (_, manager) = manager_at(T0, 30);
        let token = manager
            .issue_token(ClaimSet::new("a@b.cr"), Some(Duration::minutes(5)))
            .unwrap();

        let claims = manager.verify_token(&token).unwrap();
        assert_eq!(claims.exp, T0 + 5 * 60);
        assert_eq!(claims.expires_at(), Utc.timestamp_opt(T0 + 300, 0).single());
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let (now, manager) = manager_at(T0, 1);
        let token = manager.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();

        now.store(T0 + 30, Ordering::SeqCst);
        assert!(manager.verify_token(&token).is_ok());

        now.store(T0 + 60, Ordering::SeqCst);
        assert!(matches!(
            manager.verify_token(&token),
            Err(AppError::TokenInvalid)
        ));

        now.store(T0 + 61, Ordering::SeqCst);
        assert!(matches!(
            manager.verify_token(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_tokens_issued_at_different_instants_differ() {
        let (now, manager) = manager_at(T0, 10);
        let first = manager.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();
        now.store(T0 + 1, Ordering::SeqCst);
        let second = manager.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();

        assert_ne!(first, second);
        assert_eq!(manager.verify_token(&first).unwrap().exp, T0 + 600);
        assert_eq!(manager.verify_token(&second).unwrap().exp, T0 + 601);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let (_, clock) = manual_clock(T0);
        let issuer = CredentialManager::with_clock(
            &config("another-secret-that-is-also-long-enough", "HS256", 30),
            clock.clone(),
        )
        .unwrap();
        let verifier =
            CredentialManager::with_clock(&config(SECRET, "HS256", 30), clock).unwrap();

        let token = issuer.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();
        assert!(matches!(
            verifier.verify_token(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_token_with_other_algorithm_rejected() {
        let (_, clock) = manual_clock(T0);
        let issuer =
            CredentialManager::with_clock(&config(SECRET, "HS512", 30), clock.clone()).unwrap();
        let verifier =
            CredentialManager::with_clock(&config(SECRET, "HS256", 30), clock).unwrap();

        let token = issuer.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();
        assert!(issuer.verify_token(&token).is_ok());
        assert!(matches!(
            verifier.verify_token(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let (_, manager) = manager_at(T0, 30);
        let token = manager.issue_token(ClaimSet::new("a@b.cr"), None).unwrap();
        let other = manager.issue_token(ClaimSet::new("b@b.cr"), None).unwrap();

        // a@b.cr's header and payload under b@b.cr's signature
        let (signed_part, _) = token.rsplit_once('.').unwrap();
        let (_, other_signature) = other.rsplit_once('.').unwrap();
        let tampered = format!("{}.{}", signed_part, other_signature);

        for candidate in ["", "not-a-token", "a.b.c", tampered.as_str()] {
            assert!(
                matches!(manager.verify_token(candidate), Err(AppError::TokenInvalid)),
                "accepted {:?}",
                candidate
            );
        }
    }

    #[test]
    fn test_token_without_expiry_rejected() {
        #[derive(Serialize)]
        struct NoExpiry<'a> {
            sub: &'a str,
            iat: i64,
        }

        let (_, manager) = manager_at(T0, 30);
        let token = encode(
            &Header::default(),
            &NoExpiry { sub: "a@b.cr", iat: T0 },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            manager.verify_token(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn test_reserved_claims_cannot_be_overridden() {
        let (_, manager) = manager_at(T0, 30);
        let claim_set = ClaimSet::new("a@b.cr")
            .with_claim("exp", T0 + 999_999)
            .with_claim("sub", "admin@leyendas.cr");

        let token = manager.issue_token(claim_set, None).unwrap();
        let claims = manager.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "a@b.cr");
        assert_eq!(claims.exp, T0 + 30 * 60);
        assert!(claims.extra.is_empty());
    }

    #[test]
    fn test_empty_subject_rejected() {
        let (_, manager) = manager_at(T0, 30);
        assert!(matches!(
            manager.issue_token(ClaimSet::new("  "), None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_issue_bearer() {
        let (_, manager) = manager_at(T0, 15);
        let response = manager.issue_bearer(ClaimSet::new("a@b.cr"), None).unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 15 * 60);
        assert_eq!(manager.default_lifetime(), Duration::minutes(15));
        assert!(manager.verify_token(&response.access_token).is_ok());
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(matches!(bearer_token("Basic abc"), Err(AppError::Unauthorized)));
        assert!(matches!(bearer_token("Bearer "), Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let (_, manager) = manager_at(T0, 30);
        let hash = manager
            .hash_password_blocking("volcan-irazu".to_string())
            .await
            .unwrap();

        assert!(
            manager
                .verify_password_blocking("volcan-irazu".to_string(), hash.clone())
                .await
        );
        assert!(
            !manager
                .verify_password_blocking("volcan-poas".to_string(), hash)
                .await
        );
    }
}
