//! Testing utilities and helpers
//!
//! - **[`mocks`]**: Mock implementations of the auth traits
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use adrelay_common::auth::{InMemoryTokenStore, TokenManager};
//! use adrelay_common::testing::MockAuthenticator;
//!
//! let authenticator = Arc::new(MockAuthenticator::new());
//! let manager = TokenManager::new(authenticator.clone(), Arc::new(InMemoryTokenStore::new()));
//! # let _ = manager;
//! assert_eq!(authenticator.refresh_count(), 0);
//! ```

pub mod mocks;

pub use mocks::MockAuthenticator;
