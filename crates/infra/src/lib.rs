//! # AdRelay Infrastructure
//!
//! Infrastructure implementations of core conversion ports.
//!
//! This crate contains:
//! - HTTP transport and bearer-token request authorization
//! - The per-scope custom variable cache
//! - Upload execution and response interpretation
//! - Destination integrations (Google Ads, Snap, HubSpot, GA4)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `adrelay-core`
//! - Depends on `adrelay-common` and `adrelay-domain`
//! - Contains all "impure" code (network and file I/O)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod resolver;
pub mod upload;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RequestAuthorizer};
pub use integrations::{
    DestinationRegistry, Ga4Event, Ga4Sink, GoogleAdsAction, GoogleAdsSink, HubSpotSink,
    SearchStreamLookup, SnapSink,
};
pub use resolver::CachingIdentifierResolver;
pub use upload::{ResponseInterpreter, ResponseReport, StatusOnly, UploadExecutor};
