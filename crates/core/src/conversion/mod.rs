//! Conversion payload rules shared by every destination

pub mod timestamp;
pub mod validation;

pub use timestamp::TimestampFormat;
pub use validation::{require_identity, validate_event, validate_monetary};
