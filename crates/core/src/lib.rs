//! # AdRelay Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for destinations and identifier lookup
//! - Pre-flight validation and timestamp normalization
//! - The field mapping evaluator
//! - The conversion upload pipeline service
//!
//! ## Architecture Principles
//! - Only depends on `adrelay-common` and `adrelay-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod conversion;
pub mod mapping;
pub mod pipeline;

// Re-export specific items to avoid ambiguity
pub use conversion::{validate_event, TimestampFormat};
pub use mapping::{Directive, Mapping};
pub use pipeline::{
    ConversionPipeline, ConversionSink, IdentifierLookup, IdentifierResolver, Payload,
};
