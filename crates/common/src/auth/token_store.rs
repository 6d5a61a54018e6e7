//! Run-scoped in-memory token store

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::TokenStore;
use super::types::{AccessToken, CredentialScope};

/// Thread-safe token store backed by a concurrent map.
///
/// No eviction beyond explicit invalidation.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<CredentialScope, AccessToken>,
}

impl InMemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scopes holding a token.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, scope: &CredentialScope) -> Option<AccessToken> {
        self.tokens.get(scope).map(|entry| entry.value().clone())
    }

    async fn put(&self, scope: &CredentialScope, token: AccessToken) {
        self.tokens.insert(scope.clone(), token);
    }

    async fn invalidate(&self, scope: &CredentialScope) {
        self.tokens.remove(scope);
    }
}
