//! Configuration loader
//!
//! Loads destination configuration from a file and applies environment
//! overrides on top.
//!
//! ## Loading Strategy
//! 1. `ADRELAY_CONFIG_PATH`, if set, names the file (it must exist)
//! 2. Otherwise the standard locations are probed
//! 3. With no file at all, defaults are used (no destinations configured)
//! 4. Environment overrides are applied last
//!
//! JSON and TOML are supported, detected by file extension.
//!
//! ## Environment Variables
//! - `ADRELAY_CONFIG_PATH`: Config file path
//! - `ADRELAY_HTTP_TIMEOUT_SECS`: Per-call HTTP timeout in seconds
//! - `ADRELAY_GOOGLE_ADS_CUSTOMER_ID`: Google Ads customer id
//! - `ADRELAY_GOOGLE_ADS_DEVELOPER_TOKEN`: Google Ads developer token
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./adrelay.toml` or `./adrelay.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use adrelay_domain::{AdRelayError, Config, Result};

pub const CONFIG_PATH_ENV: &str = "ADRELAY_CONFIG_PATH";
pub const HTTP_TIMEOUT_ENV: &str = "ADRELAY_HTTP_TIMEOUT_SECS";
pub const GOOGLE_ADS_CUSTOMER_ID_ENV: &str = "ADRELAY_GOOGLE_ADS_CUSTOMER_ID";
pub const GOOGLE_ADS_DEVELOPER_TOKEN_ENV: &str = "ADRELAY_GOOGLE_ADS_DEVELOPER_TOKEN";

const CONFIG_FILE_NAMES: [&str; 4] = ["adrelay.toml", "adrelay.json", "config.toml", "config.json"];

/// Load configuration with the full strategy described above.
///
/// # Errors
/// Returns `AdRelayError::Configuration` if:
/// - `ADRELAY_CONFIG_PATH` names a missing file
/// - File format is invalid
/// - An environment override has an invalid value
/// - The resulting configuration is out of range
pub fn load() -> Result<Config> {
    let mut config = match env_var(CONFIG_PATH_ENV) {
        Some(path) => load_from_file(Some(PathBuf::from(path)))?,
        None => match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `AdRelayError::Configuration` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AdRelayError::Configuration(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AdRelayError::Configuration(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path).map_err(|e| {
        AdRelayError::Configuration(format!("Failed to read config file: {}", e))
    })?;

    parse_config(&contents, &config_path)
}

/// Apply `ADRELAY_*` overrides to `config`.
///
/// Google Ads overrides only apply when a `google_ads` section exists, since
/// credentials cannot come from the environment.
///
/// # Errors
/// Returns `AdRelayError::Configuration` for unparsable values.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(raw) = env_var(HTTP_TIMEOUT_ENV) {
        config.http.timeout_secs = raw.parse::<u64>().map_err(|e| {
            AdRelayError::Configuration(format!("Invalid {HTTP_TIMEOUT_ENV}: {}", e))
        })?;
    }

    let customer_id = env_var(GOOGLE_ADS_CUSTOMER_ID_ENV);
    let developer_token = env_var(GOOGLE_ADS_DEVELOPER_TOKEN_ENV);
    match config.google_ads.as_mut() {
        Some(google_ads) => {
            if customer_id.is_some() {
                google_ads.customer_id = customer_id;
            }
            if developer_token.is_some() {
                google_ads.developer_token = developer_token;
            }
        }
        None if customer_id.is_some() || developer_token.is_some() => {
            tracing::warn!("Google Ads overrides set but no google_ads section is configured");
        }
        None => {}
    }

    Ok(())
}

/// Reject values no destination can work with.
///
/// # Errors
/// Returns `AdRelayError::Configuration` naming the offending setting.
pub fn validate(config: &Config) -> Result<()> {
    if config.http.timeout_secs == 0 {
        return Err(AdRelayError::Configuration(
            "http.timeout_secs must be greater than zero".to_string(),
        ));
    }
    if config.resolver.cache_capacity == 0 {
        return Err(AdRelayError::Configuration(
            "resolver.cache_capacity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AdRelayError::Configuration` if format is invalid or parsing
/// fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdRelayError::Configuration(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdRelayError::Configuration(format!("Invalid JSON format: {}", e))),
        _ => Err(AdRelayError::Configuration(format!(
            "Unsupported config format: {}",
            extension
        ))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
