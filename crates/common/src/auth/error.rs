//! Authentication errors

use thiserror::Error;

/// Failure to obtain an access token.
///
/// Rejection by the authorization server is kept apart from transport
/// failures so callers can retry the latter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token endpoint answered with a non-success status
    #[error("token endpoint rejected the grant (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Request never produced a response
    #[error("token request failed: {message}")]
    Network { message: String, timed_out: bool },

    /// Success status but the body carried no usable token
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// Grant needs a credential field that is not configured
    #[error("credential is missing {0}")]
    MissingCredential(&'static str),
}

impl AuthError {
    /// Returns true if the failure happened below the OAuth layer.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
