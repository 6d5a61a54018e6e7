//! Conversions from external infrastructure errors into domain errors.

use adrelay_common::auth::AuthError;
use adrelay_domain::{AdRelayError, FailureCategory};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AdRelayError);

impl From<InfraError> for AdRelayError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AdRelayError> for InfraError {
    fn from(value: AdRelayError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAdRelayError {
    fn into_adrelay(self) -> AdRelayError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AdRelayError */
/* -------------------------------------------------------------------------- */

impl IntoAdRelayError for HttpError {
    fn into_adrelay(self) -> AdRelayError {
        if self.is_timeout() {
            return AdRelayError::transport(
                FailureCategory::NetworkTimeout,
                "HTTP request timed out",
            );
        }

        if self.is_connect() {
            return AdRelayError::transport(
                FailureCategory::NetworkOffline,
                format!("HTTP connection failure: {self}"),
            );
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => AdRelayError::Auth(message),
                _ => AdRelayError::upload_status(code, message),
            };
        }

        if self.is_builder() {
            return AdRelayError::Internal(format!("invalid HTTP request: {self}"));
        }

        AdRelayError::transport(FailureCategory::Unknown, self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_adrelay())
    }
}

/* -------------------------------------------------------------------------- */
/* AuthError → AdRelayError */
/* -------------------------------------------------------------------------- */

impl IntoAdRelayError for AuthError {
    fn into_adrelay(self) -> AdRelayError {
        match self {
            AuthError::Network { message, timed_out } => {
                let category = if timed_out {
                    FailureCategory::NetworkTimeout
                } else {
                    FailureCategory::NetworkOffline
                };
                AdRelayError::transport(category, format!("token request failed: {message}"))
            }
            AuthError::MissingCredential(field) => AdRelayError::Configuration(format!(
                "credential is missing {field}; set it in destination settings"
            )),
            rejected @ (AuthError::Rejected { .. } | AuthError::InvalidResponse(_)) => {
                AdRelayError::Auth(rejected.to_string())
            }
        }
    }
}

impl From<AuthError> for InfraError {
    fn from(value: AuthError) -> Self {
        InfraError(value.into_adrelay())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
