//! Shared helpers for infra integration tests.
//!
//! Every destination is pointed at one wiremock server: uploads, lookups and
//! the OAuth token endpoint all live under its URI.

#![allow(dead_code)]

use std::sync::Once;

use adrelay_common::auth::{AccessToken, CredentialScope};
use adrelay_domain::{Config, ConversionEvent, Identity};
use adrelay_infra::DestinationRegistry;
use chrono::{TimeZone, Utc};
use serde_json::json;

pub const CLIENT_ID: &str = "client";
pub const CUSTOMER_ID: &str = "1234567890";
pub const TOKEN_PATH: &str = "/token";
pub const CLICK_UPLOAD_PATH: &str = "/v11/customers/1234567890:uploadClickConversions";
pub const SEARCH_STREAM_PATH: &str = "/v11/customers/1234567890/googleAds:searchStream";

static TRACING: Once = Once::new();

/// Route test logs through the test writer once per binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("debug").try_init();
    });
}

/// Google Ads configuration aimed at `server_uri`.
pub fn google_ads_config(server_uri: &str, customer_id: Option<&str>) -> Config {
    let config = json!({
        "google_ads": {
            "customer_id": customer_id,
            "developer_token": "dev-token",
            "base_url": server_uri,
            "credentials": {
                "client_id": CLIENT_ID,
                "client_secret": "secret",
                "refresh_token": "refresh",
                "token_url": format!("{server_uri}{TOKEN_PATH}")
            }
        }
    });
    serde_json::from_value(config).expect("test config should deserialize")
}

pub fn registry(config: &Config) -> DestinationRegistry {
    init_tracing();
    DestinationRegistry::from_config(config).expect("registry should build")
}

/// Store `token` as the cached token for the Google Ads account.
pub async fn seed_google_token(registry: &DestinationRegistry, token: &str) {
    let scope = CredentialScope::new(CLIENT_ID, Some(CUSTOMER_ID.to_string()));
    registry.token_store().put(&scope, AccessToken::new(token, Some(3600))).await;
}

/// Click conversion for `test@gmail.com` worth 200 USD.
pub fn click_event() -> ConversionEvent {
    ConversionEvent {
        identity: Identity { email: Some("test@gmail.com".into()), ..Identity::default() },
        value: Some(200.0),
        currency: Some("USD".into()),
        timestamp: Some(Utc.with_ymd_and_hms(2021, 6, 10, 18, 8, 4).unwrap()),
        action: Some("12345".into()),
        ..ConversionEvent::default()
    }
}

/// Upload response with no rejected conversions.
pub fn success_body(results: usize) -> serde_json::Value {
    json!({
        "partialFailureError": { "code": 0, "message": "" },
        "results": vec![json!({}); results]
    })
}
