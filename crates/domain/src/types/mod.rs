//! Domain types and models

pub mod conversion;
pub mod custom_variable;
mod normalized;
pub mod upload;

pub use conversion::{ConversionEvent, Identity, IdentityField};
pub use custom_variable::{CustomVariable, ResolvedIdentifiers};
pub use upload::{RecordOutcome, UploadResult};
