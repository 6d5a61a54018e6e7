//! Read-through custom variable cache with moka
//!
//! Maps custom attribute names to platform resource names per credential
//! scope. Names already cached never reach the network; misses for one scope
//! are serialized so concurrent callers share a single bulk lookup.
//!
//! # Error Handling
//!
//! Only successful lookups are cached. Names the platform does not know are
//! reported as [`AdRelayError::UnresolvedIdentifier`] every time and are
//! looked up again on the next call.

use std::collections::BTreeSet;
use std::sync::Arc;

use adrelay_common::auth::{Credential, CredentialScope};
use adrelay_core::{IdentifierLookup, IdentifierResolver};
use adrelay_domain::constants::DEFAULT_RESOLVER_CACHE_CAPACITY;
use adrelay_domain::{AdRelayError, ResolvedIdentifiers, ResolverConfig, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, info};

type CacheKey = (CredentialScope, String);

/// [`IdentifierResolver`] backed by a pluggable [`IdentifierLookup`].
pub struct CachingIdentifierResolver {
    lookup: Arc<dyn IdentifierLookup>,
    cache: Cache<CacheKey, String>,
    scope_locks: DashMap<CredentialScope, Arc<Mutex<()>>>,
}

impl CachingIdentifierResolver {
    /// Resolver with the default capacity.
    pub fn new(lookup: Arc<dyn IdentifierLookup>) -> Self {
        Self::with_capacity(lookup, DEFAULT_RESOLVER_CACHE_CAPACITY)
    }

    /// Resolver holding at most `capacity` name mappings across all scopes.
    pub fn with_capacity(lookup: Arc<dyn IdentifierLookup>, capacity: u64) -> Self {
        Self {
            lookup,
            cache: Cache::builder().max_capacity(capacity).build(),
            scope_locks: DashMap::new(),
        }
    }

    pub fn from_config(lookup: Arc<dyn IdentifierLookup>, config: &ResolverConfig) -> Self {
        Self::with_capacity(lookup, config.cache_capacity)
    }

    /// Drop every cached mapping for `scope`.
    pub async fn invalidate(&self, scope: &CredentialScope) {
        let stale: Vec<Arc<CacheKey>> =
            self.cache.iter().filter(|(key, _)| key.0 == *scope).map(|(key, _)| key).collect();
        for key in &stale {
            self.cache.invalidate(key.as_ref()).await;
        }
        info!(scope = %scope, dropped = stale.len(), "custom variable cache invalidated");
    }

    /// Split `names` into cached mappings and names still to look up.
    async fn partition(
        &self,
        scope: &CredentialScope,
        names: impl IntoIterator<Item = &String>,
        resolved: &mut ResolvedIdentifiers,
    ) -> Vec<String> {
        let mut missing = Vec::new();
        for name in names {
            match self.cache.get(&(scope.clone(), name.clone())).await {
                Some(resource_name) => resolved.insert(name.clone(), resource_name),
                None => missing.push(name.clone()),
            }
        }
        missing
    }

    fn scope_lock(&self, scope: &CredentialScope) -> Arc<Mutex<()>> {
        self.scope_locks
            .entry(scope.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

#[async_trait]
impl IdentifierResolver for CachingIdentifierResolver {
    async fn resolve(
        &self,
        credential: &Credential,
        names: &BTreeSet<String>,
    ) -> Result<ResolvedIdentifiers> {
        let scope = credential.scope();
        let mut resolved = ResolvedIdentifiers::new();

        let missing = self.partition(&scope, names, &mut resolved).await;
        if missing.is_empty() {
            debug!(scope = %scope, names = names.len(), "custom variables served from cache");
            return Ok(resolved);
        }

        let lock = self.scope_lock(&scope);
        let _guard = lock.lock().await;

        // A concurrent caller may have looked these up while we waited.
        let missing = self.partition(&scope, &missing, &mut resolved).await;
        if missing.is_empty() {
            return Ok(resolved);
        }

        debug!(scope = %scope, lookup = missing.len(), "looking up custom variables");
        let found = self.lookup.lookup(credential, &missing).await?;

        let wanted: BTreeSet<&String> = missing.iter().collect();
        for variable in found {
            if variable.resource_name.is_empty() || !wanted.contains(&variable.name) {
                continue;
            }
            self.cache
                .insert((scope.clone(), variable.name.clone()), variable.resource_name.clone())
                .await;
            resolved.insert(variable.name, variable.resource_name);
        }

        let unresolved: Vec<String> =
            missing.into_iter().filter(|name| resolved.get(name).is_none()).collect();
        if !unresolved.is_empty() {
            return Err(AdRelayError::UnresolvedIdentifier { names: unresolved });
        }

        Ok(resolved)
    }
}
