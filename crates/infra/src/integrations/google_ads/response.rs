//! Google Ads partial-failure interpretation
//!
//! Upload calls run with `partialFailure: true`, so row errors come back in
//! a 2xx body as `partialFailureError` (a `google.rpc.Status`). Failing rows
//! are identified by the `conversions` element of each error's field path.

use std::collections::{BTreeMap, BTreeSet};

use adrelay_domain::{AdRelayError, RecordOutcome, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::upload::{ResponseInterpreter, ResponseReport};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    partial_failure_error: Option<RpcStatus>,
    /// Absent when the platform sends an empty report.
    #[serde(default)]
    results: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<FailureDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct FailureDetail {
    #[serde(default)]
    errors: Vec<RowError>,
}

#[derive(Debug, Default, Deserialize)]
struct RowError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    location: Option<ErrorLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorLocation {
    #[serde(default)]
    field_path_elements: Vec<FieldPathElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldPathElement {
    #[serde(default)]
    field_name: String,
    #[serde(default)]
    index: Option<usize>,
}

impl RowError {
    fn conversion_index(&self) -> Option<usize> {
        self.location
            .as_ref()?
            .field_path_elements
            .iter()
            .find(|element| element.field_name == "conversions")
            .and_then(|element| element.index)
    }
}

/// Reads `partialFailureError` and `results` from upload responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialFailureInterpreter;

impl ResponseInterpreter for PartialFailureInterpreter {
    fn interpret(&self, _status: u16, body: &str, submitted: usize) -> Result<ResponseReport> {
        let response: UploadResponse = if body.trim().is_empty() {
            UploadResponse::default()
        } else {
            serde_json::from_str(body).map_err(|e| {
                AdRelayError::Internal(format!("unreadable Google Ads upload response: {e}"))
            })?
        };

        let failure = response.partial_failure_error.filter(|status| status.code != 0);

        let mut row_messages: BTreeMap<usize, String> = BTreeMap::new();
        if let Some(status) = &failure {
            for error in status.details.iter().flat_map(|detail| &detail.errors) {
                if let Some(index) = error.conversion_index() {
                    row_messages
                        .entry(index)
                        .or_insert_with(|| error.message.clone().unwrap_or_default());
                }
            }
        }
        let failed: BTreeSet<usize> = row_messages.keys().copied().collect();

        // Without a results array every submitted record counts as returned.
        let returned = response.results.as_ref().map_or(submitted, Vec::len);
        let records: Vec<RecordOutcome> = (0..returned)
            .map(|index| RecordOutcome {
                index,
                accepted: !failed.contains(&index),
                message: row_messages.get(&index).filter(|m| !m.is_empty()).cloned(),
            })
            .collect();

        let short = returned < submitted;
        if failure.is_none() && !short {
            return Ok(ResponseReport { records, ..ResponseReport::default() });
        }

        let message = match failure {
            Some(status) if !status.message.is_empty() => status.message,
            Some(status) => format!("partial failure code {}", status.code),
            None => format!("platform returned {returned} results for {submitted} conversions"),
        };
        Ok(ResponseReport::partial(records, message, failed.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn interpret(body: Value, submitted: usize) -> ResponseReport {
        PartialFailureInterpreter.interpret(200, &body.to_string(), submitted).unwrap()
    }

    #[test]
    fn zero_code_with_full_results_is_success() {
        let report =
            interpret(json!({ "partialFailureError": { "code": 0, "message": "" }, "results": [{}] }), 1);
        assert!(!report.partial_failure);
        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].accepted);
    }

    #[test]
    fn absent_failure_report_is_success() {
        let report = interpret(json!({ "results": [{ "gclid": "a" }, { "gclid": "b" }] }), 2);
        assert!(!report.partial_failure);
        assert!(report.failed_indices.is_empty());
    }

    #[test]
    fn non_zero_code_reports_message_and_indices() {
        let body = json!({
            "partialFailureError": {
                "code": 3,
                "message": "The imported conversion action is not found., at conversions[1].conversion_action",
                "details": [{
                    "@type": "type.googleapis.com/google.ads.googleads.v11.errors.GoogleAdsFailure",
                    "errors": [{
                        "errorCode": { "conversionUploadError": "INVALID_CONVERSION_ACTION" },
                        "message": "The imported conversion action is not found.",
                        "location": {
                            "fieldPathElements": [
                                { "fieldName": "conversions", "index": 1 },
                                { "fieldName": "conversion_action" }
                            ]
                        }
                    }]
                }]
            },
            "results": [{ "callerId": "+1234567890" }, {}]
        });

        let report = interpret(body, 2);
        assert!(report.partial_failure);
        assert_eq!(report.failed_indices, vec![1]);
        assert!(report.message.unwrap().starts_with("The imported conversion action"));
        assert!(report.records[0].accepted);
        assert!(!report.records[1].accepted);
        assert_eq!(
            report.records[1].message.as_deref(),
            Some("The imported conversion action is not found.")
        );
    }

    #[test]
    fn empty_report_is_full_success() {
        for body in ["", "{}", "  "] {
            let report = PartialFailureInterpreter.interpret(201, body, 1).unwrap();
            assert!(!report.partial_failure, "body {body:?}");
            assert!(report.message.is_none());
            assert_eq!(report.records.len(), 1);
            assert!(report.records[0].accepted);
        }
    }

    #[test]
    fn empty_results_array_is_still_short() {
        let report = interpret(json!({ "results": [] }), 1);
        assert!(report.partial_failure);
        assert_eq!(report.message.as_deref(), Some("platform returned 0 results for 1 conversions"));
    }

    #[test]
    fn short_results_array_is_partial_failure() {
        let report = interpret(json!({ "results": [{}] }), 3);
        assert!(report.partial_failure);
        assert_eq!(report.message.as_deref(), Some("platform returned 1 results for 3 conversions"));
        assert!(report.failed_indices.is_empty());
    }

    #[test]
    fn failure_without_field_paths_keeps_message() {
        let report = interpret(
            json!({ "partialFailureError": { "code": 2, "message": "Unknown error" }, "results": [{}] }),
            1,
        );
        assert!(report.partial_failure);
        assert_eq!(report.message.as_deref(), Some("Unknown error"));
        assert!(report.failed_indices.is_empty());
    }

    #[test]
    fn malformed_body_is_internal_error() {
        let err = PartialFailureInterpreter.interpret(200, "<html>", 1).unwrap_err();
        assert!(matches!(err, AdRelayError::Internal(_)));
    }
}
