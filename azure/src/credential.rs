//! Access-token credentials
//!
//! Two credentials are provided:
//!
//! - [`AzureCliCredential`]: asks the ambient Azure CLI session for a token
//!   (`az account get-access-token`). Nothing runs until the first request
//!   needs a token; tokens are cached per audience until shortly before they
//!   expire.
//! - [`StaticTokenCredential`]: a fixed bearer token, for tests and for callers
//!   that obtain tokens elsewhere.

use crate::error::CredentialError;
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tokio::process::Command;
use tokio::sync::RwLock;

/// Tokens are refreshed this many seconds before they expire
const REFRESH_MARGIN_SECS: i64 = 300;

/// A bearer token and its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Bearer token
    pub token: String,
    /// Instant after which the token is rejected
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token can still be used at `now`
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now + TimeDelta::seconds(REFRESH_MARGIN_SECS) < self.expires_on
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for a given audience
///
/// **Edition 2024**: Uses RPITIT (Return Position Impl Trait In Traits)
pub trait TokenCredential: Send + Sync {
    /// Get a token valid for `resource` (e.g. `https://management.azure.com/`)
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if no token can be obtained
    fn get_token(
        &self,
        resource: &str,
    ) -> impl Future<Output = Result<AccessToken, CredentialError>> + Send;
}

/// Credential backed by the Azure CLI login session
pub struct AzureCliCredential {
    program: String,
    cache: RwLock<HashMap<String, AccessToken>>,
}

impl AzureCliCredential {
    /// Create a credential that runs `az`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("az")
    }

    /// Create a credential that runs a specific CLI executable
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn fetch(&self, resource: &str) -> Result<AccessToken, CredentialError> {
        tracing::debug!(resource, "requesting token from Azure CLI");

        let output = Command::new(&self.program)
            .args(["account", "get-access-token", "--output", "json", "--resource", resource])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CredentialError::CliUnavailable(e.to_string()))?;

        if !output.status.success() {
            return Err(CredentialError::CliFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_cli_token(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AzureCliCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureCliCredential")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, resource: &str) -> Result<AccessToken, CredentialError> {
        let now = Utc::now();
        if let Some(token) = self.cache.read().await.get(resource) {
            if token.is_fresh_at(now) {
                return Ok(token.clone());
            }
        }

        let token = self.fetch(resource).await?;
        self.cache
            .write()
            .await
            .insert(resource.to_string(), token.clone());
        Ok(token)
    }
}

/// Credential returning a fixed token
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    /// Create a credential that always returns `token`
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticTokenCredential(<redacted>)")
    }
}

impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _resource: &str) -> Result<AccessToken, CredentialError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: DateTime::<Utc>::MAX_UTC,
        })
    }
}

/// Output of `az account get-access-token`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Local wall-clock time, e.g. `2025-01-15 10:30:00.000000`
    expires_on: Option<String>,
    /// Unix timestamp (newer CLI versions)
    #[serde(rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

fn parse_cli_token(stdout: &str) -> Result<AccessToken, CredentialError> {
    let parsed: CliToken = serde_json::from_str(stdout)
        .map_err(|e| CredentialError::InvalidOutput(e.to_string()))?;

    let expires_on = match (parsed.expires_on_unix, parsed.expires_on.as_deref()) {
        (Some(secs), _) => DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| CredentialError::InvalidOutput(format!("bad expires_on: {secs}")))?,
        (None, Some(local)) => parse_local_expiry(local)?,
        (None, None) => {
            return Err(CredentialError::InvalidOutput(
                "missing token expiry".to_string(),
            ));
        }
    };

    Ok(AccessToken {
        token: parsed.access_token,
        expires_on,
    })
}

fn parse_local_expiry(value: &str) -> Result<DateTime<Utc>, CredentialError> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| CredentialError::InvalidOutput(format!("bad expiresOn '{value}': {e}")))?;

    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CredentialError::InvalidOutput(format!("nonexistent local time '{value}'")))
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_token_unix_expiry() {
        let stdout = r#"{
            "accessToken": "abc",
            "expiresOn": "2025-01-15 10:30:00.000000",
            "expires_on": 1736937000,
            "subscription": "sub",
            "tenant": "tenant",
            "tokenType": "Bearer"
        }"#;

        let token = parse_cli_token(stdout).expect("parses");
        assert_eq!(token.token, "abc");
        assert_eq!(token.expires_on.timestamp(), 1_736_937_000);
    }

    #[test]
    fn test_parse_cli_token_local_expiry() {
        let stdout = r#"{"accessToken": "abc", "expiresOn": "2025-01-15 10:30:00.123456"}"#;

        let token = parse_cli_token(stdout).expect("parses");
        let expected =
            NaiveDateTime::parse_from_str("2025-01-15 10:30:00.123456", "%Y-%m-%d %H:%M:%S%.f")
                .expect("naive")
                .and_local_timezone(Local)
                .earliest()
                .expect("local")
                .with_timezone(&Utc);
        assert_eq!(token.expires_on, expected);
    }

    #[test]
    fn test_parse_cli_token_missing_expiry() {
        let err = parse_cli_token(r#"{"accessToken": "abc"}"#).expect_err("should fail");
        assert!(matches!(err, CredentialError::InvalidOutput(_)));
    }

    #[test]
    fn test_parse_cli_token_garbage() {
        assert!(parse_cli_token("Please run 'az login'").is_err());
    }

    #[test]
    fn test_token_freshness() {
        let now = Utc::now();
        let token = AccessToken {
            token: "t".to_string(),
            expires_on: now + TimeDelta::minutes(30),
        };
        assert!(token.is_fresh_at(now));
        assert!(!token.is_fresh_at(now + TimeDelta::minutes(26)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken {
            token: "secret".to_string(),
            expires_on: Utc::now(),
        };
        assert!(!format!("{token:?}").contains("secret"));
        assert!(!format!("{:?}", StaticTokenCredential::new("secret")).contains("secret"));
    }

    #[test]
    fn test_static_credential() {
        let credential = StaticTokenCredential::new("fixed");
        let token = tokio_test::block_on(credential.get_token("https://management.azure.com/"))
            .expect("token");
        assert_eq!(token.token, "fixed");
        assert!(token.is_fresh_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_cli_credential_missing_program() {
        let credential = AzureCliCredential::with_program("definitely-not-an-installed-az-cli");
        let err = credential
            .get_token("https://management.azure.com/")
            .await
            .expect_err("should fail");
        assert!(matches!(err, CredentialError::CliUnavailable(_)));
    }
}
