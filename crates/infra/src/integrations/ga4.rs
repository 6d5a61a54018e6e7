//! GA4 Measurement Protocol events (`generate_lead`, `view_item`)
//!
//! No OAuth: the measurement id and API secret travel as query parameters.
//! Extra event parameters and user properties come from the event's
//! `params` and `user_properties` properties; `view_item` products come from
//! `items`.

use adrelay_core::conversion::timestamp::epoch_micros;
use adrelay_core::conversion::validate_monetary;
use adrelay_core::{ConversionSink, Payload};
use adrelay_domain::{
    AdRelayError, ConversionEvent, Ga4Config, IdentityField, ResolvedIdentifiers, Result,
    UploadResult,
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};

use super::{base_url, required_setting};
use crate::http::HttpClient;
use crate::upload::{StatusOnly, UploadExecutor};

pub const DEFAULT_BASE_URL: &str = "https://www.google-analytics.com";

const IDENTITY: &[IdentityField] = &[IdentityField::ClientId, IdentityField::UserId];

const MISSING_MEASUREMENT_ID: &str =
    "Measurement ID is required for this action. Please set it in destination settings.";
const MISSING_API_SECRET: &str =
    "API Secret is required for this action. Please set it in destination settings.";

/// Product fields forwarded for each `view_item` entry.
const ITEM_FIELDS: &[&str] = &[
    "item_id",
    "item_name",
    "quantity",
    "affiliation",
    "coupon",
    "discount",
    "item_brand",
    "item_category",
    "item_variant",
    "price",
    "currency",
];

const MISSING_ITEM_IDENTITY: &str =
    "One of product name or product id is required for product or impression data.";

/// Measurement Protocol event a sink reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ga4Event {
    GenerateLead,
    /// Product view; requires a non-empty `items` array
    ViewItem,
}

impl Ga4Event {
    fn event_name(self) -> &'static str {
        match self {
            Self::GenerateLead => "generate_lead",
            Self::ViewItem => "view_item",
        }
    }
}

pub struct Ga4Sink {
    event: Ga4Event,
    measurement_id: Option<String>,
    api_secret: Option<String>,
    base_url: String,
    executor: UploadExecutor,
}

impl Ga4Sink {
    pub fn new(config: &Ga4Config, event: Ga4Event, http: HttpClient) -> Self {
        Self {
            event,
            measurement_id: config.measurement_id.clone(),
            api_secret: config.api_secret.clone(),
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            executor: UploadExecutor::direct(http),
        }
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let measurement_id =
            required_setting(self.measurement_id.as_deref(), MISSING_MEASUREMENT_ID)?;
        let api_secret = required_setting(self.api_secret.as_deref(), MISSING_API_SECRET)?;
        Ok((measurement_id, api_secret))
    }
}

/// Custom event parameters; nested values are not allowed.
fn event_params(properties: &Map<String, Value>) -> Result<Map<String, Value>> {
    let Some(params) = properties.get("params") else {
        return Ok(Map::new());
    };
    let params = params
        .as_object()
        .ok_or_else(|| AdRelayError::Validation("params must be an object".to_string()))?;

    for (key, value) in params {
        if value.is_object() || value.is_array() {
            return Err(AdRelayError::Validation(format!(
                "Param [{key}] has unsupported value; params must be scalars"
            )));
        }
    }
    Ok(params.clone())
}

/// `view_item` products, each carrying an id or a name and a valid
/// currency when one is given.
fn view_items(properties: &Map<String, Value>) -> Result<Value> {
    let items = properties
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AdRelayError::Validation("items are required for view_item".to_string()))?;

    let mut products = Vec::with_capacity(items.len());
    for item in items {
        let item = item
            .as_object()
            .ok_or_else(|| AdRelayError::Validation("each item must be an object".to_string()))?;
        let named = ["item_id", "item_name"]
            .iter()
            .any(|key| item.get(*key).is_some_and(|v| !v.is_null()));
        if !named {
            return Err(AdRelayError::Validation(MISSING_ITEM_IDENTITY.to_string()));
        }
        if let Some(currency) = item.get("currency").and_then(Value::as_str) {
            validate_monetary(None, Some(currency))?;
        }

        let product: Map<String, Value> = ITEM_FIELDS
            .iter()
            .filter_map(|key| item.get(*key).map(|value| ((*key).to_string(), value.clone())))
            .collect();
        products.push(Value::Object(product));
    }
    Ok(Value::Array(products))
}

/// User properties wrapped as `{"name": {"value": v}}`.
fn user_properties(properties: &Map<String, Value>) -> Result<Option<Value>> {
    let Some(raw) = properties.get("user_properties") else {
        return Ok(None);
    };
    let raw = raw
        .as_object()
        .ok_or_else(|| AdRelayError::Validation("user_properties must be an object".to_string()))?;

    let wrapped: Map<String, Value> =
        raw.iter().map(|(key, value)| (key.clone(), json!({ "value": value }))).collect();
    Ok(Some(Value::Object(wrapped)))
}

#[async_trait]
impl ConversionSink for Ga4Sink {
    fn name(&self) -> &'static str {
        match self.event {
            Ga4Event::GenerateLead => "ga4_generate_lead",
            Ga4Event::ViewItem => "ga4_view_item",
        }
    }

    fn check_settings(&self) -> Result<()> {
        self.credentials().map(|_| ())
    }

    fn accepted_identity(&self) -> &'static [IdentityField] {
        IDENTITY
    }

    fn build_record(
        &self,
        event: &ConversionEvent,
        _resolved: &ResolvedIdentifiers,
    ) -> Result<Value> {
        let mut params = Map::new();
        if let Some(currency) = &event.currency {
            params.insert("currency".into(), json!(currency.to_ascii_uppercase()));
        }
        if self.event == Ga4Event::ViewItem {
            params.insert("items".into(), view_items(&event.properties)?);
        }
        if let Some(value) = event.value {
            params.insert("value".into(), json!(value));
        }
        if let Some(engagement) = event.properties.get("engagement_time_msec") {
            params.insert("engagement_time_msec".into(), engagement.clone());
        }
        params.extend(event_params(&event.properties)?);

        let mut record = Map::new();
        if let Some(client_id) = event.identity.get(IdentityField::ClientId) {
            record.insert("client_id".into(), json!(client_id));
        }
        if let Some(user_id) = event.identity.get(IdentityField::UserId) {
            record.insert("user_id".into(), json!(user_id));
        }
        if let Some(ts) = &event.timestamp {
            record.insert("timestamp_micros".into(), json!(epoch_micros(ts)));
        }
        record.insert("events".into(), json!([{ "name": self.event.event_name(), "params": params }]));
        if let Some(user_properties) = user_properties(&event.properties)? {
            record.insert("user_properties".into(), user_properties);
        }
        Ok(Value::Object(record))
    }

    fn assemble(&self, mut records: Vec<Value>) -> Result<Payload> {
        match records.len() {
            1 => Ok(Payload { body: records.remove(0), records: 1 }),
            n => Err(AdRelayError::Internal(format!(
                "GA4 events are sent one at a time, got {n}"
            ))),
        }
    }

    async fn upload(&self, payload: Payload) -> Result<UploadResult> {
        let (measurement_id, api_secret) = self.credentials()?;
        let url = format!("{}/mp/collect", self.base_url);
        let request = self
            .executor
            .request(Method::POST, &url)
            .query(&[("measurement_id", measurement_id), ("api_secret", api_secret)])
            .json(&payload.body);
        self.executor.execute(request, payload.records, &StatusOnly).await
    }
}
