//! OAuth2 token acquisition and caching
//!
//! Destinations authenticate with either the client-credentials or the
//! refresh-token grant. Tokens are cached per credential scope and are only
//! replaced when missing or after the platform rejects them; there is no
//! proactive expiry.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  single-flight check-then-refresh per scope
//! └────────┬────────┘
//!          │
//!          ├──► TokenStore     (InMemoryTokenStore, or a persistent backend)
//!          │
//!          └──► Authenticator  (OAuthClient: HTTP grant execution)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: `Credential`, `CredentialScope`, `AccessToken`, token
//!   endpoint responses
//! - **[`error`]**: `AuthError`
//! - **[`traits`]**: `Authenticator` and `TokenStore` seams
//! - **[`token_store`]**: run-scoped in-memory store
//! - **[`token_manager`]**: cached access with single-flight refresh
//! - **[`client`]**: OAuth2 grant execution over HTTP (`platform` tier)

#[cfg(feature = "platform")]
pub mod client;
pub mod error;
pub mod token_manager;
pub mod token_store;
pub mod traits;
pub mod types;

#[cfg(feature = "platform")]
pub use client::{Grant, OAuthClient};
pub use error::AuthError;
pub use token_manager::TokenManager;
pub use token_store::InMemoryTokenStore;
pub use traits::{Authenticator, TokenStore};
pub use types::{AccessToken, Credential, CredentialScope, OAuthError, TokenResponse};
