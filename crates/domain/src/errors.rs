//! Error types used throughout the pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of hard upload failures.
///
/// Callers drive their own retry policy (exponential backoff); this category
/// tells them whether a retry is worth attempting at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Network is offline or the host refused the connection
    NetworkOffline,

    /// Request did not complete within the caller's timeout
    NetworkTimeout,

    /// Platform returned a 5xx status
    ServerUnavailable,

    /// Platform returned 429
    RateLimited,

    /// Platform rejected the request body (4xx other than 401, 403, 429)
    Validation,

    /// Unclassified failure
    Unknown,
}

impl FailureCategory {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            400..=499 => Self::Validation,
            500..=599 => Self::ServerUnavailable,
            _ => Self::Unknown,
        }
    }

    /// Returns true if this failure should be retried by the caller
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkOffline | Self::NetworkTimeout | Self::ServerUnavailable | Self::RateLimited
        )
    }

    /// Returns recommended retry delay in seconds
    pub fn retry_delay_secs(self) -> Option<u64> {
        match self {
            Self::NetworkOffline => Some(30),
            Self::NetworkTimeout => Some(10),
            Self::ServerUnavailable => Some(60),
            Self::RateLimited => Some(120),
            Self::Validation | Self::Unknown => None,
        }
    }
}

impl_domain_enum_conversions!(FailureCategory {
    NetworkOffline => "network_offline",
    NetworkTimeout => "network_timeout",
    ServerUnavailable => "server_unavailable",
    RateLimited => "rate_limited",
    Validation => "validation",
    Unknown => "unknown",
});

/// Main error type for AdRelay
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum AdRelayError {
    /// A required destination setting is missing or invalid. Raised before
    /// any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The event fails a business rule. Raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Named custom attributes have no mapping on the platform.
    #[error("Unresolved custom variables: {}", .names.join(", "))]
    UnresolvedIdentifier { names: Vec<String> },

    /// Token acquisition failed, or the platform rejected a freshly
    /// refreshed token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The platform accepted the call but rejected some or all records.
    #[error("Partial failure (HTTP {status}): {message}")]
    PartialFailure { status: u16, message: String, failed_indices: Vec<usize> },

    /// Transport-level or platform-level hard failure.
    #[error("Upload failed{}: {body}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Upload { status: Option<u16>, body: String, category: FailureCategory },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdRelayError {
    /// Build an upload error from a non-success HTTP response.
    pub fn upload_status(status: u16, body: impl Into<String>) -> Self {
        Self::Upload {
            status: Some(status),
            body: body.into(),
            category: FailureCategory::from_status(status),
        }
    }

    /// Build an upload error for a failure that produced no response.
    pub fn transport(category: FailureCategory, message: impl Into<String>) -> Self {
        Self::Upload { status: None, body: message.into(), category }
    }

    /// Returns true if the caller's retry policy may re-send the event.
    ///
    /// Only hard upload failures qualify; every other kind is either fatal
    /// input or already processed by the platform.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upload { category, .. } => category.is_retryable(),
            _ => false,
        }
    }

    /// Suggested delay before a retry, if one is appropriate.
    pub fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Upload { category, .. } => category.retry_delay_secs(),
            _ => None,
        }
    }

    /// Stable label suitable for logging and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::UnresolvedIdentifier { .. } => "unresolved_identifier",
            Self::Auth(_) => "auth",
            Self::PartialFailure { .. } => "partial_failure",
            Self::Upload { .. } => "upload",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for AdRelay operations
pub type Result<T> = std::result::Result<T, AdRelayError>;
