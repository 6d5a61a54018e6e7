//! Bearer-token decoration with a single reactive refresh

use std::sync::Arc;

use adrelay_common::auth::{AccessToken, Credential, TokenManager};
use adrelay_domain::constants::AUTHORIZATION_HEADER;
use adrelay_domain::{AdRelayError, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::client::HttpClient;
use crate::errors::InfraError;

/// Attaches the current access token to outbound calls.
///
/// A 401 or 403 answer triggers one refresh and one retry. If the platform
/// also rejects the fresh token the call fails with [`AdRelayError::Auth`]
/// and no third attempt is made.
#[derive(Debug, Clone)]
pub struct RequestAuthorizer {
    http: HttpClient,
    tokens: Arc<TokenManager>,
}

impl RequestAuthorizer {
    pub fn new(http: HttpClient, tokens: Arc<TokenManager>) -> Self {
        Self { http, tokens }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Send `request` with a bearer token for `credential`.
    ///
    /// The body must be buffered (JSON or form) so the request can be
    /// replayed after a refresh.
    ///
    /// # Errors
    /// Token acquisition failures, transport failures, or
    /// [`AdRelayError::Auth`] when the refreshed token is rejected too.
    pub async fn send(&self, credential: &Credential, request: RequestBuilder) -> Result<Response> {
        let scope = credential.scope();
        let token = self.tokens.access_token(credential).await.map_err(InfraError::from)?;

        let replay = request.try_clone().ok_or_else(|| {
            AdRelayError::Internal(
                "request body cannot be cloned; buffer the body to enable token refresh".into(),
            )
        })?;

        let response = self.http.send(authorize(request, &token)).await?;
        if !is_rejection(response.status()) {
            return Ok(response);
        }

        warn!(scope = %scope, status = %response.status(), "platform rejected access token, refreshing");
        let fresh =
            self.tokens.refresh_after_rejection(credential, &token).await.map_err(InfraError::from)?;

        let retried = self.http.send(authorize(replay, &fresh)).await?;
        let status = retried.status();
        if is_rejection(status) {
            let body = retried.text().await.unwrap_or_default();
            warn!(scope = %scope, %status, "platform rejected refreshed access token");
            return Err(AdRelayError::Auth(format!(
                "platform rejected refreshed access token (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }

        debug!(scope = %scope, %status, "request succeeded after token refresh");
        Ok(retried)
    }
}

fn authorize(request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
    request.header(AUTHORIZATION_HEADER, token.bearer())
}

fn is_rejection(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}
