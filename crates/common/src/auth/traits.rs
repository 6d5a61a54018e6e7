//! Traits for token acquisition and storage
//!
//! These traits enable dependency injection and testing by abstracting
//! external dependencies (authorization servers, token persistence).

use async_trait::async_trait;

use super::error::AuthError;
use super::types::{AccessToken, Credential, CredentialScope};

/// Executes an OAuth2 grant and returns a fresh access token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Obtain a new access token for `credential`.
    ///
    /// # Errors
    /// Returns [`AuthError::Rejected`] when the authorization server refuses
    /// the grant and [`AuthError::Network`] when no response was received.
    async fn refresh(&self, credential: &Credential) -> Result<AccessToken, AuthError>;
}

/// Holds at most one access token per credential scope.
///
/// The in-memory implementation is run-scoped; a persistent backend can be
/// plugged in behind this trait.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Cached token for `scope`, if any.
    async fn get(&self, scope: &CredentialScope) -> Option<AccessToken>;

    /// Replace the token for `scope`.
    async fn put(&self, scope: &CredentialScope, token: AccessToken);

    /// Drop the token for `scope`.
    async fn invalidate(&self, scope: &CredentialScope);
}
