//! Modular common utilities shared across AdRelay crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: OAuth token model, token store and single-flight token manager
//! - `platform`: HTTP-backed OAuth2 grants (`auth::client`)
//! - `test-utils`: mock authenticators for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", all(test, feature = "runtime")))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{Grant, OAuthClient};
#[cfg(feature = "runtime")]
pub use auth::{
    AccessToken, AuthError, Authenticator, Credential, CredentialScope, InMemoryTokenStore,
    TokenManager, TokenStore,
};
