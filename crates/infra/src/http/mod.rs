//! HTTP transport and request authorization

pub mod authorizer;
pub mod client;

pub use authorizer::RequestAuthorizer;
pub use client::{HttpClient, HttpClientBuilder};
