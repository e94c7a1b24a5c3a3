//! Token and hash-password commands. Neither touches the database.

use chrono::Duration;
use serde_json::Value;

use common::{AppError, AppResult, Settings};
use credentials::{bearer_token, ClaimSet, CredentialManager, CredentialService};
use domain::SECONDS_PER_MINUTE;

use crate::cli::args::{TokenAction, TokenArgs};

/// Execute the token command
pub async fn execute(args: TokenArgs, settings: &Settings) -> AppResult<()> {
    let credentials = CredentialManager::new(&settings.security)?;

    match args.action {
        TokenAction::Issue {
            subject,
            claims,
            expires_minutes,
        } => {
            let claim_set = claims
                .iter()
                .map(|raw| parse_claim(raw))
                .try_fold(ClaimSet::new(subject), |set, claim| {
                    claim.map(|(name, value)| set.with_claim(name, value))
                })?;

            let lifetime = expires_minutes.map(token_lifetime).transpose()?;
            let response = credentials.issue_bearer(claim_set, lifetime)?;
            tracing::info!(
                expires_in_minutes = response.expires_in / SECONDS_PER_MINUTE,
                "Token issued"
            );
            println!("{}", response.access_token);
        }
        TokenAction::Verify { token } => {
            let claims = credentials.verify_token(strip_bearer(&token))?;
            let rendered = serde_json::to_string_pretty(&claims)
                .map_err(|e| AppError::internal(e.to_string()))?;
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// Execute the hash-password command
pub async fn hash_password(password: String, settings: &Settings) -> AppResult<()> {
    let credentials = CredentialManager::new(&settings.security)?;
    println!("{}", credentials.hash_password_blocking(password).await?);
    Ok(())
}

/// Accept a token with or without its `Bearer ` prefix.
pub(crate) fn strip_bearer(raw: &str) -> &str {
    bearer_token(raw).unwrap_or_else(|_| raw.trim())
}

/// Lifetime from `--expires-minutes`; must be positive and representable.
fn token_lifetime(minutes: i64) -> AppResult<Duration> {
    if minutes <= 0 {
        return Err(AppError::validation("Token lifetime must be positive"));
    }
    Duration::try_minutes(minutes).ok_or_else(|| AppError::validation("Token lifetime out of range"))
}

/// Parse `name=value`; values that are not valid JSON are kept as strings.
fn parse_claim(raw: &str) -> AppResult<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| AppError::validation(format!("claim {:?} is not NAME=VALUE", raw)))?;

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_claim_values() {
        assert_eq!(parse_claim("level=3").unwrap(), ("level".into(), json!(3)));
        assert_eq!(
            parse_claim("scope=catalog").unwrap(),
            ("scope".into(), json!("catalog"))
        );
        assert_eq!(
            parse_claim("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".into(), json!(["a", "b"]))
        );
        assert_eq!(parse_claim("empty=").unwrap(), ("empty".into(), json!("")));
    }

    #[test]
    fn test_parse_claim_rejects_missing_name() {
        assert!(matches!(parse_claim("novalue"), Err(AppError::Validation(_))));
        assert!(matches!(parse_claim("=3"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_token_lifetime_bounds() {
        assert_eq!(token_lifetime(5).unwrap(), Duration::minutes(5));
        assert!(matches!(token_lifetime(0), Err(AppError::Validation(_))));
        assert!(matches!(token_lifetime(-10), Err(AppError::Validation(_))));
        assert!(matches!(token_lifetime(i64::MAX / 2), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_issue_with_huge_lifetime_is_rejected() {
        let settings = Settings::from_lookup(|key| match key {
            "SECRET_KEY" => Some("leyendas-cli-secret-0123456789abcdefghij".to_string()),
            "ALGORITHM" => Some("HS256".to_string()),
            "ACCESS_TOKEN_EXPIRE_MINUTES" => Some("30".to_string()),
            _ => None,
        })
        .unwrap();
        let args = TokenArgs {
            action: TokenAction::Issue {
                subject: "lector@leyendas.cr".into(),
                claims: Vec::new(),
                expires_minutes: Some(i64::MAX / 2),
            },
        };

        let result = execute(args, &settings).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_bearer(" abc.def.ghi "), "abc.def.ghi");
    }
}
