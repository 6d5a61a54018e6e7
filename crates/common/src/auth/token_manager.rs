//! Token manager with single-flight refresh
//!
//! Hands out cached access tokens per credential scope and refreshes them
//! only when missing or after the platform rejected the cached one.
//! Concurrent misses for one scope collapse into a single grant call.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::traits::{Authenticator, TokenStore};
use super::types::{AccessToken, Credential, CredentialScope};

/// Cached token access backed by an [`Authenticator`] and a [`TokenStore`].
pub struct TokenManager {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn TokenStore>,
    scope_locks: DashMap<CredentialScope, Arc<Mutex<()>>>,
}

impl TokenManager {
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>, store: Arc<dyn TokenStore>) -> Self {
        Self { authenticator, store, scope_locks: DashMap::new() }
    }

    /// Current token for `credential`, refreshing synchronously when none is
    /// cached.
    ///
    /// # Errors
    /// Propagates the [`AuthError`] of a failed grant.
    pub async fn access_token(&self, credential: &Credential) -> Result<AccessToken, AuthError> {
        let scope = credential.scope();
        if let Some(token) = self.store.get(&scope).await {
            return Ok(token);
        }

        let lock = self.scope_lock(&scope);
        let _guard = lock.lock().await;

        // A concurrent caller may have filled the slot while we waited.
        if let Some(token) = self.store.get(&scope).await {
            debug!(scope = %scope, "token refreshed by concurrent caller");
            return Ok(token);
        }

        self.refresh_locked(credential, &scope).await
    }

    /// Replace a token the platform rejected.
    ///
    /// Refreshes only if the store still holds `rejected`; if another caller
    /// already swapped it out, the newer token is returned instead.
    ///
    /// # Errors
    /// Propagates the [`AuthError`] of a failed grant.
    pub async fn refresh_after_rejection(
        &self,
        credential: &Credential,
        rejected: &AccessToken,
    ) -> Result<AccessToken, AuthError> {
        let scope = credential.scope();
        let lock = self.scope_lock(&scope);
        let _guard = lock.lock().await;

        match self.store.get(&scope).await {
            Some(current) if current != *rejected => {
                debug!(scope = %scope, "rejected token already replaced");
                return Ok(current);
            }
            Some(_) => self.store.invalidate(&scope).await,
            None => {}
        }

        self.refresh_locked(credential, &scope).await
    }

    /// Drop the cached token for `credential`.
    pub async fn invalidate(&self, credential: &Credential) {
        self.store.invalidate(&credential.scope()).await;
    }

    async fn refresh_locked(
        &self,
        credential: &Credential,
        scope: &CredentialScope,
    ) -> Result<AccessToken, AuthError> {
        match self.authenticator.refresh(credential).await {
            Ok(token) => {
                self.store.put(scope, token.clone()).await;
                info!(scope = %scope, "access token refreshed");
                Ok(token)
            }
            Err(e) => {
                warn!(scope = %scope, error = %e, "access token refresh failed");
                Err(e)
            }
        }
    }

    fn scope_lock(&self, scope: &CredentialScope) -> Arc<Mutex<()>> {
        self.scope_locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager").field("scopes", &self.scope_locks.len()).finish()
    }
}
