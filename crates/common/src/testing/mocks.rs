//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{AccessToken, AuthError, Authenticator, Credential};

/// Authenticator that issues `token-1`, `token-2`, ... without network calls
/// and counts how often it was asked.
#[derive(Debug, Default)]
pub struct MockAuthenticator {
    calls: AtomicUsize,
    delay: Option<Duration>,
    failure: Mutex<Option<AuthError>>,
    credentials_seen: Mutex<Vec<String>>,
}

impl MockAuthenticator {
    /// Create a mock that always succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every refresh, widening race windows.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make subsequent refreshes fail with `error`.
    pub fn fail_with(&self, error: AuthError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Make subsequent refreshes succeed again.
    pub fn succeed(&self) {
        *self.failure.lock().unwrap() = None;
    }

    /// Number of refresh calls received so far.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Client ids of every credential passed to `refresh`, in order.
    #[must_use]
    pub fn client_ids(&self) -> Vec<String> {
        self.credentials_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn refresh(&self, credential: &Credential) -> Result<AccessToken, AuthError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.credentials_seen.lock().unwrap().push(credential.client_id.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        Ok(AccessToken::new(format!("token-{call}"), Some(3600)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issues_sequential_tokens() {
        let mock = MockAuthenticator::new();
        let credential = Credential::new("client", "secret");

        assert_eq!(mock.refresh(&credential).await.unwrap().secret(), "token-1");
        assert_eq!(mock.refresh(&credential).await.unwrap().secret(), "token-2");
        assert_eq!(mock.refresh_count(), 2);
        assert_eq!(mock.client_ids(), vec!["client".to_string(), "client".to_string()]);
    }

    #[tokio::test]
    async fn failure_mode_toggles() {
        let mock = MockAuthenticator::new();
        let credential = Credential::new("client", "secret");

        mock.fail_with(AuthError::MissingCredential("refresh_token"));
        assert!(mock.refresh(&credential).await.is_err());

        mock.succeed();
        assert!(mock.refresh(&credential).await.is_ok());
        assert_eq!(mock.refresh_count(), 2);
    }
}
