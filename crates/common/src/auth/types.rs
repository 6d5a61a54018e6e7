//! OAuth 2.0 types and structures
//!
//! Credentials, the scope key tokens are cached under, and the access token
//! issued by a token endpoint.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Key identifying one cached token: client id plus optional tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialScope {
    pub client_id: String,
    pub tenant_id: Option<String>,
}

impl CredentialScope {
    #[must_use]
    pub fn new(client_id: impl Into<String>, tenant_id: Option<String>) -> Self {
        Self { client_id: client_id.into(), tenant_id }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tenant_id {
            Some(tenant) => write!(f, "{}@{}", self.client_id, tenant),
            None => write!(f, "{}", self.client_id),
        }
    }
}

/// OAuth client credentials for one destination.
///
/// Immutable for the run. `Debug` never prints secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    /// Tenant / customer identifier the credential acts for
    pub tenant_id: Option<String>,
}

impl Credential {
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
            tenant_id: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Scope this credential's token is cached under.
    #[must_use]
    pub fn scope(&self) -> CredentialScope {
        CredentialScope::new(self.client_id.clone(), self.tenant_id.clone())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

/// Access token issued by a token endpoint.
///
/// Owned by the token store; replaced wholesale, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token issued now, expiring after `expires_in` seconds when
    /// the endpoint reported a lifetime.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_in: Option<i64>) -> Self {
        let issued_at = Utc::now();
        let expires_at =
            expires_in.filter(|secs| *secs > 0).map(|secs| issued_at + Duration::seconds(secs));
        Self { token: token.into(), issued_at, expires_at }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// OAuth token response from an authorization server (RFC 6749 §5.1).
///
/// Only `access_token` is required; providers differ on the rest.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TokenResponse> for AccessToken {
    fn from(response: TokenResponse) -> Self {
        Self::new(response.access_token, response.expires_in)
    }
}

/// OAuth error response from an authorization server (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
