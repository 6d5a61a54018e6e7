//! Custom variable resolution
//!
//! Platform-specific lookup strategies live with their integrations; this
//! module holds the per-scope cache that sits in front of them.

pub mod cache;

pub use cache::CachingIdentifierResolver;
