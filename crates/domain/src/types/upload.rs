//! Upload outcomes returned to the calling framework.

use serde::{Deserialize, Serialize};

use crate::errors::{AdRelayError, Result};

/// Outcome for a single submitted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Position of the record in the submitted batch
    pub index: usize,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Structured result of one upload call.
///
/// `records` may be shorter than `submitted` when the platform reports only
/// failures or drops rows from its results array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Underlying HTTP status (always 2xx; hard failures are errors)
    pub status: u16,

    /// Raw response body for logging/telemetry
    pub body: String,

    /// Number of records carried by the request
    pub submitted: usize,

    pub records: Vec<RecordOutcome>,

    /// True when the platform accepted the call but rejected some records
    pub partial_failure: bool,

    /// Platform-provided failure message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Indices of rejected records, where the platform reports them
    pub failed_indices: Vec<usize>,
}

impl UploadResult {
    /// Returns true when every record was accepted.
    pub fn is_success(&self) -> bool {
        !self.partial_failure
    }

    /// Convert a partial failure into [`AdRelayError::PartialFailure`] for
    /// callers that treat any rejected record as an error.
    pub fn into_result(self) -> Result<Self> {
        if self.partial_failure {
            return Err(AdRelayError::PartialFailure {
                status: self.status,
                message: self.message.unwrap_or_else(|| "platform rejected records".to_string()),
                failed_indices: self.failed_indices,
            });
        }
        Ok(self)
    }
}
