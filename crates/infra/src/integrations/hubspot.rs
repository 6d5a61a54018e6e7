//! HubSpot custom behavioral events
//!
//! Sends one occurrence of a predefined event to `/events/v3/send`. HubSpot
//! accepts only lowercased property names.

use std::sync::Arc;

use adrelay_common::auth::Credential;
use adrelay_core::{ConversionSink, Payload, TimestampFormat};
use adrelay_domain::{
    AdRelayError, ConversionEvent, HubSpotConfig, IdentityField, ResolvedIdentifiers, Result,
    UploadResult,
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};

use super::{base_url, credential_from};
use crate::http::RequestAuthorizer;
use crate::upload::{StatusOnly, UploadExecutor};

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";
pub const TOKEN_URL: &str = "https://api.hubapi.com/oauth/v1/token";

const IDENTITY: &[IdentityField] =
    &[IdentityField::Email, IdentityField::UserToken, IdentityField::ObjectId];

pub struct HubSpotSink {
    base_url: String,
    executor: UploadExecutor,
}

impl HubSpotSink {
    pub fn new(config: &HubSpotConfig, authorizer: Arc<RequestAuthorizer>) -> Self {
        let credential: Credential = credential_from(&config.credentials);
        Self {
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            executor: UploadExecutor::authorized(authorizer, credential),
        }
    }
}

/// Event properties plus custom attributes, keys lowercased.
fn event_properties(event: &ConversionEvent) -> Map<String, Value> {
    let mut properties: Map<String, Value> =
        event.properties.iter().map(|(key, value)| (key.to_lowercase(), value.clone())).collect();
    for (name, value) in &event.custom_attributes {
        properties.insert(name.to_lowercase(), json!(value));
    }
    properties
}

#[async_trait]
impl ConversionSink for HubSpotSink {
    fn name(&self) -> &'static str {
        "hubspot_custom_behavioral_event"
    }

    fn check_settings(&self) -> Result<()> {
        Ok(())
    }

    fn accepted_identity(&self) -> &'static [IdentityField] {
        IDENTITY
    }

    fn build_record(
        &self,
        event: &ConversionEvent,
        _resolved: &ResolvedIdentifiers,
    ) -> Result<Value> {
        let event_name = event
            .action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AdRelayError::Validation("event name is required".to_string()))?;

        let mut record = Map::new();
        record.insert("eventName".into(), json!(event_name));
        if let Some(ts) = &event.timestamp {
            record.insert("occurredAt".into(), json!(TimestampFormat::Iso8601.format(ts)));
        }
        let identity = &event.identity;
        if let Some(email) = identity.get(IdentityField::Email) {
            record.insert("email".into(), json!(email));
        }
        if let Some(utk) = identity.get(IdentityField::UserToken) {
            record.insert("utk".into(), json!(utk));
        }
        if let Some(object_id) = identity.get(IdentityField::ObjectId) {
            record.insert("objectId".into(), json!(object_id));
        }
        record.insert("properties".into(), Value::Object(event_properties(event)));
        Ok(Value::Object(record))
    }

    fn assemble(&self, mut records: Vec<Value>) -> Result<Payload> {
        match records.len() {
            1 => Ok(Payload { body: records.remove(0), records: 1 }),
            n => Err(AdRelayError::Internal(format!(
                "HubSpot behavioral events are sent one at a time, got {n}"
            ))),
        }
    }

    async fn upload(&self, payload: Payload) -> Result<UploadResult> {
        let url = format!("{}/events/v3/send", self.base_url);
        let request = self.executor.request(Method::POST, &url).json(&payload.body);
        self.executor.execute(request, payload.records, &StatusOnly).await
    }
}
