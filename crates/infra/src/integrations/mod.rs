//! Platform integrations
//!
//! Each destination implements [`adrelay_core::ConversionSink`]; Google Ads
//! also provides an [`adrelay_core::IdentifierLookup`] strategy. The
//! [`registry`] wires them from configuration.

use std::sync::Arc;

use adrelay_common::auth::{Credential, Grant, OAuthClient, TokenManager, TokenStore};
use adrelay_domain::{AdRelayError, CredentialConfig, GrantKind, Result};

use crate::http::{HttpClient, RequestAuthorizer};

pub mod ga4;
pub mod google_ads;
pub mod hashing;
pub mod hubspot;
pub mod registry;
pub mod snap;

pub use ga4::{Ga4Event, Ga4Sink};
pub use google_ads::{GoogleAdsAction, GoogleAdsSink, SearchStreamLookup};
pub use hubspot::HubSpotSink;
pub use registry::DestinationRegistry;
pub use snap::SnapSink;

/// Credential as the auth layer sees it.
pub fn credential_from(config: &CredentialConfig) -> Credential {
    Credential {
        client_id: config.client_id.clone(),
        client_secret: config.client_secret.clone(),
        refresh_token: config.refresh_token.clone(),
        tenant_id: config.tenant_id.clone(),
    }
}

pub fn grant_for(kind: GrantKind) -> Grant {
    match kind {
        GrantKind::RefreshToken => Grant::RefreshToken,
        GrantKind::ClientCredentialsBasic => Grant::ClientCredentialsBasic,
        GrantKind::ClientCredentialsForm => Grant::ClientCredentialsForm,
    }
}

/// Authorizer for one destination: an OAuth client on the destination's
/// token endpoint (or the configured override) sharing `store`.
pub fn authorizer_for(
    http: &HttpClient,
    config: &CredentialConfig,
    default_token_url: &str,
    store: Arc<dyn TokenStore>,
) -> Arc<RequestAuthorizer> {
    let token_url = config.token_url.as_deref().unwrap_or(default_token_url);
    let client = OAuthClient::with_client(http.inner().clone(), token_url, grant_for(config.grant));
    let tokens = Arc::new(TokenManager::new(Arc::new(client), store));
    Arc::new(RequestAuthorizer::new(http.clone(), tokens))
}

/// Base URL with any trailing slash removed.
pub(crate) fn base_url(configured: Option<&str>, default: &str) -> String {
    configured.unwrap_or(default).trim_end_matches('/').to_string()
}

/// Non-blank setting value, or a configuration error carrying `message`.
pub(crate) fn required_setting<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AdRelayError::Configuration(message.to_string()))
}
