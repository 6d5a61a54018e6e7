//! Custom variable lookup through `googleAds:searchStream`

use std::sync::Arc;

use adrelay_common::auth::Credential;
use adrelay_core::IdentifierLookup;
use adrelay_domain::{AdRelayError, CustomVariable, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{GoogleAdsEndpoint, MISSING_CUSTOMER_ID};
use crate::errors::InfraError;
use crate::http::RequestAuthorizer;

#[derive(Debug, Default, Deserialize)]
struct SearchStreamBatch {
    #[serde(default)]
    results: Vec<SearchRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRow {
    conversion_custom_variable: Option<CustomVariableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomVariableRow {
    #[serde(default)]
    resource_name: String,
    #[serde(default)]
    name: String,
}

/// GAQL query selecting the custom variables named in `names`.
pub fn custom_variable_query(names: &[String]) -> String {
    let quoted: Vec<String> = names
        .iter()
        .map(|name| format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!(
        "SELECT conversion_custom_variable.id, conversion_custom_variable.name, \
         conversion_custom_variable.resource_name FROM conversion_custom_variable \
         WHERE conversion_custom_variable.name IN ({})",
        quoted.join(", ")
    )
}

/// Bulk lookup filtered on the requested names, one call per resolve.
///
/// The customer id is the credential's tenant.
#[derive(Debug, Clone)]
pub struct SearchStreamLookup {
    endpoint: GoogleAdsEndpoint,
    authorizer: Arc<RequestAuthorizer>,
}

impl SearchStreamLookup {
    pub(crate) fn new(endpoint: GoogleAdsEndpoint, authorizer: Arc<RequestAuthorizer>) -> Self {
        Self { endpoint, authorizer }
    }
}

#[async_trait]
impl IdentifierLookup for SearchStreamLookup {
    async fn lookup(&self, credential: &Credential, names: &[String]) -> Result<Vec<CustomVariable>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let customer_id = credential
            .tenant_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AdRelayError::Configuration(MISSING_CUSTOMER_ID.to_string()))?;

        let url = self.endpoint.customer_url(customer_id, "/googleAds:searchStream");
        let request = self
            .endpoint
            .decorate(self.authorizer.http().request(Method::POST, &url))
            .json(&json!({ "query": custom_variable_query(names) }));

        let response = self.authorizer.send(credential, request).await?;
        let status = response.status();
        let body = response.text().await.map_err(InfraError::from)?;
        if !status.is_success() {
            return Err(AdRelayError::upload_status(status.as_u16(), body));
        }

        let batches: Vec<SearchStreamBatch> = serde_json::from_str(&body).map_err(|e| {
            AdRelayError::Internal(format!("unreadable Google Ads search response: {e}"))
        })?;

        let found: Vec<CustomVariable> = batches
            .into_iter()
            .flat_map(|batch| batch.results)
            .filter_map(|row| row.conversion_custom_variable)
            .map(|row| CustomVariable { name: row.name, resource_name: row.resource_name })
            .collect();

        debug!(requested = names.len(), found = found.len(), "custom variable lookup finished");
        Ok(found)
    }
}
