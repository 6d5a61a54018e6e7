//! Google Ads offline conversion uploads
//!
//! Call and click conversions are uploaded in batches with
//! `partialFailure: true`. Custom variables referenced by events are
//! resolved to resource names through [`SearchStreamLookup`].

use std::sync::Arc;

use adrelay_common::auth::Credential;
use adrelay_core::{ConversionSink, Payload};
use adrelay_domain::{
    ConversionEvent, GoogleAdsConfig, IdentityField, ResolvedIdentifiers, Result, UploadResult,
};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

use super::{base_url, credential_from, required_setting};
use crate::http::RequestAuthorizer;
use crate::upload::UploadExecutor;

pub mod lookup;
pub mod payload;
pub mod response;

pub use lookup::SearchStreamLookup;
pub use response::PartialFailureInterpreter;

pub const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";
pub const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";

/// Google's per-request conversion limit.
pub const MAX_CONVERSIONS_PER_REQUEST: usize = 2000;

pub const MISSING_CUSTOMER_ID: &str =
    "Customer ID is required for this action. Please set it in destination settings.";

const CALL_IDENTITY: &[IdentityField] = &[IdentityField::CallerId];
const CLICK_IDENTITY: &[IdentityField] =
    &[IdentityField::ClickId, IdentityField::Email, IdentityField::Phone];

/// Which upload endpoint a sink targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoogleAdsAction {
    UploadCallConversions,
    UploadClickConversions,
}

impl GoogleAdsAction {
    fn method_suffix(self) -> &'static str {
        match self {
            Self::UploadCallConversions => ":uploadCallConversions",
            Self::UploadClickConversions => ":uploadClickConversions",
        }
    }
}

/// Account digits with the dashes Google's UI shows removed.
pub fn normalize_customer_id(raw: &str) -> String {
    raw.trim().replace('-', "")
}

/// API location plus the headers every Google Ads call carries.
#[derive(Debug, Clone)]
pub(crate) struct GoogleAdsEndpoint {
    base_url: String,
    api_version: String,
    developer_token: Option<String>,
    login_customer_id: Option<String>,
}

impl GoogleAdsEndpoint {
    fn from_config(config: &GoogleAdsConfig) -> Self {
        Self {
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            api_version: config.api_version.clone(),
            developer_token: config.developer_token.clone().filter(|t| !t.trim().is_empty()),
            login_customer_id: config
                .login_customer_id
                .as_deref()
                .map(normalize_customer_id)
                .filter(|id| !id.is_empty()),
        }
    }

    pub(crate) fn customer_url(&self, customer_id: &str, suffix: &str) -> String {
        format!("{}/{}/customers/{}{}", self.base_url, self.api_version, customer_id, suffix)
    }

    pub(crate) fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request;
        if let Some(token) = &self.developer_token {
            request = request.header("developer-token", token);
        }
        if let Some(login) = &self.login_customer_id {
            request = request.header("login-customer-id", login);
        }
        request
    }
}

/// Conversion sink for one Google Ads upload endpoint.
pub struct GoogleAdsSink {
    action: GoogleAdsAction,
    customer_id: Option<String>,
    endpoint: GoogleAdsEndpoint,
    executor: UploadExecutor,
}

impl GoogleAdsSink {
    /// Sink uploading to `config.customer_id`; the customer id doubles as
    /// the credential's tenant so tokens and custom variables are cached
    /// per account.
    pub fn new(
        config: &GoogleAdsConfig,
        action: GoogleAdsAction,
        authorizer: Arc<RequestAuthorizer>,
    ) -> Self {
        let customer_id = config
            .customer_id
            .as_deref()
            .map(normalize_customer_id)
            .filter(|id| !id.is_empty());

        let mut credential: Credential = credential_from(&config.credentials);
        if let Some(id) = &customer_id {
            credential.tenant_id = Some(id.clone());
        }

        Self {
            action,
            customer_id,
            endpoint: GoogleAdsEndpoint::from_config(config),
            executor: UploadExecutor::authorized(authorizer, credential),
        }
    }

    /// Lookup strategy sharing this sink's endpoint and token cache.
    pub fn lookup(&self) -> Option<SearchStreamLookup> {
        self.executor
            .authorizer()
            .map(|authorizer| SearchStreamLookup::new(self.endpoint.clone(), authorizer.clone()))
    }

    pub fn action(&self) -> GoogleAdsAction {
        self.action
    }

    fn customer_id(&self) -> Result<&str> {
        required_setting(self.customer_id.as_deref(), MISSING_CUSTOMER_ID)
    }
}

#[async_trait]
impl ConversionSink for GoogleAdsSink {
    fn name(&self) -> &'static str {
        match self.action {
            GoogleAdsAction::UploadCallConversions => "google_ads_call_conversions",
            GoogleAdsAction::UploadClickConversions => "google_ads_click_conversions",
        }
    }

    fn check_settings(&self) -> Result<()> {
        self.customer_id().map(|_| ())
    }

    fn accepted_identity(&self) -> &'static [IdentityField] {
        match self.action {
            GoogleAdsAction::UploadCallConversions => CALL_IDENTITY,
            GoogleAdsAction::UploadClickConversions => CLICK_IDENTITY,
        }
    }

    fn lookup_credential(&self) -> Option<&Credential> {
        self.executor.credential()
    }

    fn max_batch(&self) -> usize {
        MAX_CONVERSIONS_PER_REQUEST
    }

    fn build_record(
        &self,
        event: &ConversionEvent,
        resolved: &ResolvedIdentifiers,
    ) -> Result<Value> {
        let customer_id = self.customer_id()?;
        match self.action {
            GoogleAdsAction::UploadCallConversions => {
                payload::call_record(customer_id, event, resolved)
            }
            GoogleAdsAction::UploadClickConversions => {
                payload::click_record(customer_id, event, resolved)
            }
        }
    }

    fn assemble(&self, records: Vec<Value>) -> Result<Payload> {
        let count = records.len();
        Ok(Payload { body: json!({ "conversions": records, "partialFailure": true }), records: count })
    }

    async fn upload(&self, payload: Payload) -> Result<UploadResult> {
        let customer_id = self.customer_id()?;
        let url = self.endpoint.customer_url(customer_id, self.action.method_suffix());
        let request =
            self.endpoint.decorate(self.executor.request(Method::POST, &url)).json(&payload.body);
        self.executor.execute(request, payload.records, &PartialFailureInterpreter).await
    }
}

#[cfg(test)]
mod tests {
    use adrelay_common::auth::{InMemoryTokenStore, TokenManager};
    use adrelay_common::testing::MockAuthenticator;
    use adrelay_domain::AdRelayError;

    use super::*;
    use crate::http::HttpClient;

    fn config(customer_id: Option<&str>) -> GoogleAdsConfig {
        serde_json::from_value(json!({
            "credentials": { "client_id": "client", "client_secret": "secret", "refresh_token": "r" },
            "customer_id": customer_id,
            "login_customer_id": "111-222-3333",
            "developer_token": "dev"
        }))
        .unwrap()
    }

    fn sink(customer_id: Option<&str>, action: GoogleAdsAction) -> GoogleAdsSink {
        let tokens = Arc::new(TokenManager::new(
            Arc::new(MockAuthenticator::new()),
            Arc::new(InMemoryTokenStore::new()),
        ));
        let authorizer = Arc::new(RequestAuthorizer::new(HttpClient::new().unwrap(), tokens));
        GoogleAdsSink::new(&config(customer_id), action, authorizer)
    }

    #[test]
    fn missing_customer_id_names_the_setting() {
        let sink = sink(None, GoogleAdsAction::UploadCallConversions);
        assert_eq!(
            sink.check_settings().unwrap_err(),
            AdRelayError::Configuration(MISSING_CUSTOMER_ID.to_string())
        );
    }

    #[test]
    fn customer_id_becomes_credential_tenant() {
        let sink = sink(Some("123-456-7890"), GoogleAdsAction::UploadClickConversions);
        assert!(sink.check_settings().is_ok());
        assert_eq!(
            sink.lookup_credential().and_then(|c| c.tenant_id.as_deref()),
            Some("1234567890")
        );
        assert_eq!(sink.accepted_identity(), CLICK_IDENTITY);
        assert_eq!(sink.name(), "google_ads_click_conversions");
    }

    #[test]
    fn endpoint_urls_and_normalized_login_customer() {
        let endpoint = GoogleAdsEndpoint::from_config(&config(Some("1234")));
        assert_eq!(
            endpoint.customer_url("1234", ":uploadCallConversions"),
            "https://googleads.googleapis.com/v11/customers/1234:uploadCallConversions"
        );
        assert_eq!(endpoint.login_customer_id.as_deref(), Some("1112223333"));
    }

    #[test]
    fn assemble_wraps_records_with_partial_failure_flag() {
        let sink = sink(Some("1234"), GoogleAdsAction::UploadCallConversions);
        let payload = sink.assemble(vec![json!({ "a": 1 }), json!({ "b": 2 })]).unwrap();
        assert_eq!(payload.records, 2);
        assert_eq!(
            payload.body,
            json!({ "conversions": [{ "a": 1 }, { "b": 2 }], "partialFailure": true })
        );
    }
}
