//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading destination configuration from
//! files and building a registry from it.

use std::io::Write;

use adrelay_domain::{AdRelayError, GrantKind, SnapConversionType};
use adrelay_infra::{config, DestinationRegistry};
use tempfile::NamedTempFile;

fn write_config(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "http": { "timeout_secs": 10 },
        "google_ads": {
            "customer_id": "123-456-7890",
            "developer_token": "dev-token",
            "credentials": {
                "client_id": "client",
                "client_secret": "secret",
                "refresh_token": "refresh"
            }
        },
        "ga4": { "measurement_id": "G-TEST", "api_secret": "shh" }
    }"#;
    let file = write_config(json_content, ".json");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.http.timeout_secs, 10);
    let google = config.google_ads.expect("google_ads section");
    assert_eq!(google.customer_id.as_deref(), Some("123-456-7890"));
    assert_eq!(google.credentials.grant, GrantKind::RefreshToken);
    assert_eq!(config.ga4.and_then(|g| g.measurement_id).as_deref(), Some("G-TEST"));
    assert!(config.snap.is_none());
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[resolver]
cache_capacity = 500

[snap]
conversion_type = "OFFLINE"
pixel_id = "px-1"

[snap.credentials]
client_id = "snap-client"
client_secret = "snap-secret"
grant = "client_credentials_form"

[hubspot.credentials]
client_id = "hub-client"
client_secret = "hub-secret"
refresh_token = "hub-refresh"
"#;
    let file = write_config(toml_content, ".toml");

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.resolver.cache_capacity, 500);
    let snap = config.snap.clone().expect("snap section");
    assert_eq!(snap.conversion_type, SnapConversionType::Offline);
    assert_eq!(snap.credentials.grant, GrantKind::ClientCredentialsForm);

    let registry = DestinationRegistry::from_config(&config).expect("registry should build");
    assert_eq!(registry.names(), vec!["hubspot_custom_behavioral_event", "snap_conversions"]);
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/config.json".into()));

    match result {
        Err(AdRelayError::Configuration(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Configuration error, got {other:?}"),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let file = write_config(r#"{ "this is": "not valid" "#, ".json");

    match config::load_from_file(Some(file.path().to_path_buf())) {
        Err(AdRelayError::Configuration(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Configuration error, got {other:?}"),
    }
}

#[test]
fn test_validate_rejects_zero_capacity() {
    let file = write_config("[resolver]\ncache_capacity = 0\n", ".toml");
    let config = config::load_from_file(Some(file.path().to_path_buf())).unwrap();

    assert!(matches!(config::validate(&config), Err(AdRelayError::Configuration(_))));
}
