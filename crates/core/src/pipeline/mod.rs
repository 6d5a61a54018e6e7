//! Conversion upload pipeline: ports and orchestration service

pub mod ports;
pub mod service;

pub use ports::{ConversionSink, IdentifierLookup, IdentifierResolver, Payload};
pub use service::ConversionPipeline;
