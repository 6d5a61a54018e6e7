//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_RESOLVER_CACHE_CAPACITY};

/// Application configuration
///
/// Destination sections are optional; a destination without a section is
/// simply not available to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub google_ads: Option<GoogleAdsConfig>,
    #[serde(default)]
    pub snap: Option<SnapConfig>,
    #[serde(default)]
    pub hubspot: Option<HubSpotConfig>,
    #[serde(default)]
    pub ga4: Option<Ga4Config>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout_secs(), user_agent: default_user_agent() }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("adrelay/{}", env!("CARGO_PKG_VERSION"))
}

/// Identifier resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { cache_capacity: default_cache_capacity() }
    }
}

fn default_cache_capacity() -> u64 {
    DEFAULT_RESOLVER_CACHE_CAPACITY
}

/// OAuth2 grant used to obtain access tokens for a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    /// Form-encoded `refresh_token` grant
    #[default]
    RefreshToken,
    /// `client_credentials` with HTTP Basic auth and a JSON body
    ClientCredentialsBasic,
    /// `client_credentials` with client id/secret as form fields
    ClientCredentialsForm,
}

impl_domain_enum_conversions!(GrantKind {
    RefreshToken => "refresh_token",
    ClientCredentialsBasic => "client_credentials_basic",
    ClientCredentialsForm => "client_credentials_form",
});

/// OAuth client credentials for one destination.
///
/// Secrets are never serialized back out.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub grant: GrantKind,
    /// Token endpoint override (tests, sandboxes)
    #[serde(default)]
    pub token_url: Option<String>,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .field("grant", &self.grant)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Google Ads conversion upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAdsConfig {
    pub credentials: CredentialConfig,
    /// Account the conversions are uploaded to (digits, dashes tolerated)
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub developer_token: Option<String>,
    /// Manager account used for access, if different from `customer_id`
    #[serde(default)]
    pub login_customer_id: Option<String>,
    #[serde(default = "default_google_ads_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_google_ads_api_version() -> String {
    "v11".to_string()
}

/// Snap conversion channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapConversionType {
    #[default]
    Web,
    MobileApp,
    Offline,
}

impl_domain_enum_conversions!(SnapConversionType {
    Web => "web",
    MobileApp => "mobile_app",
    Offline => "offline",
});

/// Snap Conversions API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub conversion_type: SnapConversionType,
    #[serde(default)]
    pub pixel_id: Option<String>,
    #[serde(default)]
    pub snap_app_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// HubSpot custom behavioral event settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubSpotConfig {
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// GA4 Measurement Protocol settings (no OAuth)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ga4Config {
    #[serde(default)]
    pub measurement_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}
