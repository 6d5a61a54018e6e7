//! Upload dispatch and response classification
//!
//! One HTTP call carries the whole batch. The response falls into one of
//! three outcomes:
//!
//! - 2xx with an empty or zero-code failure report: success
//! - 2xx reporting failed records (or fewer results than submitted): partial
//!   failure, returned as an [`UploadResult`] with `partial_failure` set
//! - any other status: [`AdRelayError::Upload`] with status and body
//!
//! Nothing is retried here.

use std::sync::Arc;

use adrelay_common::auth::Credential;
use adrelay_domain::{AdRelayError, RecordOutcome, Result, UploadResult};
use reqwest::{Method, RequestBuilder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::InfraError;
use crate::http::{HttpClient, RequestAuthorizer};

/// Per-record verdict extracted from a 2xx response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseReport {
    pub records: Vec<RecordOutcome>,
    pub partial_failure: bool,
    pub message: Option<String>,
    pub failed_indices: Vec<usize>,
}

impl ResponseReport {
    /// Every one of `submitted` records accepted.
    pub fn accepted(submitted: usize) -> Self {
        Self {
            records: (0..submitted)
                .map(|index| RecordOutcome { index, accepted: true, message: None })
                .collect(),
            ..Self::default()
        }
    }

    /// The platform rejected the records at `failed_indices` (or an unknown
    /// subset when empty) with `message`.
    pub fn partial(
        records: Vec<RecordOutcome>,
        message: impl Into<String>,
        failed_indices: Vec<usize>,
    ) -> Self {
        Self { records, partial_failure: true, message: Some(message.into()), failed_indices }
    }
}

/// Reads a platform's 2xx response body.
pub trait ResponseInterpreter: Send + Sync {
    /// Classify a 2xx response to a request carrying `submitted` records.
    ///
    /// # Errors
    /// [`AdRelayError::Internal`] when the body is not in the platform's
    /// documented shape.
    fn interpret(&self, status: u16, body: &str, submitted: usize) -> Result<ResponseReport>;
}

/// Interpreter for platforms whose success status is the whole answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnly;

impl ResponseInterpreter for StatusOnly {
    fn interpret(&self, _status: u16, _body: &str, submitted: usize) -> Result<ResponseReport> {
        Ok(ResponseReport::accepted(submitted))
    }
}

#[derive(Debug, Clone)]
enum Dispatch {
    Authorized { authorizer: Arc<RequestAuthorizer>, credential: Credential },
    Direct(HttpClient),
}

/// Sends built payloads and turns responses into [`UploadResult`]s.
#[derive(Debug, Clone)]
pub struct UploadExecutor {
    dispatch: Dispatch,
}

impl UploadExecutor {
    /// Executor that authorizes every call with `credential`'s token.
    pub fn authorized(authorizer: Arc<RequestAuthorizer>, credential: Credential) -> Self {
        Self { dispatch: Dispatch::Authorized { authorizer, credential } }
    }

    /// Executor for platforms that authenticate through request parameters.
    pub fn direct(http: HttpClient) -> Self {
        Self { dispatch: Dispatch::Direct(http) }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match &self.dispatch {
            Dispatch::Authorized { credential, .. } => Some(credential),
            Dispatch::Direct(_) => None,
        }
    }

    pub fn authorizer(&self) -> Option<&Arc<RequestAuthorizer>> {
        match &self.dispatch {
            Dispatch::Authorized { authorizer, .. } => Some(authorizer),
            Dispatch::Direct(_) => None,
        }
    }

    /// Request builder on the executor's transport.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http().request(method, url)
    }

    fn http(&self) -> &HttpClient {
        match &self.dispatch {
            Dispatch::Authorized { authorizer, .. } => authorizer.http(),
            Dispatch::Direct(http) => http,
        }
    }

    /// Send `request` carrying `submitted` records and classify the answer.
    ///
    /// # Errors
    /// Transport and auth failures, [`AdRelayError::Upload`] for non-2xx
    /// answers, or the interpreter's error for malformed bodies.
    pub async fn execute(
        &self,
        request: RequestBuilder,
        submitted: usize,
        interpreter: &dyn ResponseInterpreter,
    ) -> Result<UploadResult> {
        let correlation_id = Uuid::new_v4().to_string();
        debug!(%correlation_id, submitted, "dispatching upload");

        let response = match &self.dispatch {
            Dispatch::Authorized { authorizer, credential } => {
                authorizer.send(credential, request).await?
            }
            Dispatch::Direct(http) => http.send(request).await?,
        };

        let status = response.status();
        let body = response.text().await.map_err(InfraError::from)?;

        if !status.is_success() {
            warn!(%correlation_id, status = status.as_u16(), "upload rejected");
            return Err(AdRelayError::upload_status(status.as_u16(), body));
        }

        let report = interpreter.interpret(status.as_u16(), &body, submitted)?;
        if report.partial_failure {
            warn!(
                %correlation_id,
                status = status.as_u16(),
                failed = ?report.failed_indices,
                "upload accepted with record failures"
            );
        } else {
            info!(%correlation_id, status = status.as_u16(), submitted, "upload accepted");
        }

        Ok(UploadResult {
            status: status.as_u16(),
            body,
            submitted,
            records: report.records,
            partial_failure: report.partial_failure,
            message: report.message,
            failed_indices: report.failed_indices,
        })
    }
}
