//! # AdRelay Domain
//!
//! Business domain types for the AdRelay conversion-upload pipeline.
//!
//! This crate contains:
//! - Conversion events, custom variables and upload results
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants (ISO 4217 table, defaults)
//!
//! ## Architecture
//! - No dependencies on other AdRelay crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

#[macro_use]
pub mod macros;

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
