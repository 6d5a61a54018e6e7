//! Upload execution

pub mod executor;

pub use executor::{ResponseInterpreter, ResponseReport, StatusOnly, UploadExecutor};
