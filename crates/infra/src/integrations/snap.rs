//! Snap Conversions API
//!
//! Reports one conversion per call to `/v2/conversion`. Web and offline
//! events are attributed to a pixel, app events to a Snap app id plus the
//! store app id.

use std::sync::Arc;

use adrelay_common::auth::Credential;
use adrelay_core::conversion::timestamp::epoch_millis;
use adrelay_core::{ConversionSink, Payload};
use adrelay_domain::{
    AdRelayError, ConversionEvent, IdentityField, ResolvedIdentifiers, Result, SnapConfig,
    SnapConversionType, UploadResult,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::hashing::{hashed_email, hashed_phone};
use super::{base_url, credential_from, required_setting};
use crate::http::RequestAuthorizer;
use crate::upload::{ResponseInterpreter, ResponseReport, UploadExecutor};

pub const DEFAULT_BASE_URL: &str = "https://tr.snapchat.com";
pub const TOKEN_URL: &str = "https://accounts.snapchat.com/login/oauth2/access_token";

const IDENTITY: &[IdentityField] =
    &[IdentityField::Email, IdentityField::Phone, IdentityField::ClickId];

/// Where the conversion is attributed, derived from the conversion type.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attribution {
    Pixel(String),
    App { snap_app_id: String, app_id: String },
}

pub struct SnapSink {
    conversion_type: SnapConversionType,
    attribution: Result<Attribution>,
    base_url: String,
    executor: UploadExecutor,
}

impl SnapSink {
    pub fn new(config: &SnapConfig, authorizer: Arc<RequestAuthorizer>) -> Self {
        let credential: Credential = credential_from(&config.credentials);
        Self {
            conversion_type: config.conversion_type,
            attribution: attribution(config),
            base_url: base_url(config.base_url.as_deref(), DEFAULT_BASE_URL),
            executor: UploadExecutor::authorized(authorizer, credential),
        }
    }
}

fn attribution(config: &SnapConfig) -> Result<Attribution> {
    match config.conversion_type {
        SnapConversionType::Web | SnapConversionType::Offline => {
            let pixel = required_setting(
                config.pixel_id.as_deref(),
                "Pixel ID is required for web and offline conversions. Please set it in destination settings.",
            )?;
            Ok(Attribution::Pixel(pixel.to_string()))
        }
        SnapConversionType::MobileApp => {
            let message = "Snap App ID and App ID are required for app conversions. Please set them in destination settings.";
            let snap_app_id = required_setting(config.snap_app_id.as_deref(), message)?;
            let app_id = required_setting(config.app_id.as_deref(), message)?;
            Ok(Attribution::App { snap_app_id: snap_app_id.to_string(), app_id: app_id.to_string() })
        }
    }
}

fn conversion_type_name(conversion_type: SnapConversionType) -> &'static str {
    match conversion_type {
        SnapConversionType::Web => "WEB",
        SnapConversionType::MobileApp => "MOBILE_APP",
        SnapConversionType::Offline => "OFFLINE",
    }
}

#[async_trait]
impl ConversionSink for SnapSink {
    fn name(&self) -> &'static str {
        "snap_conversions"
    }

    fn check_settings(&self) -> Result<()> {
        self.attribution.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    fn accepted_identity(&self) -> &'static [IdentityField] {
        IDENTITY
    }

    fn build_record(
        &self,
        event: &ConversionEvent,
        _resolved: &ResolvedIdentifiers,
    ) -> Result<Value> {
        let attribution = self.attribution.as_ref().map_err(Clone::clone)?;
        let event_type = event
            .action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AdRelayError::Validation("event type is required".to_string()))?;
        let timestamp = event
            .timestamp
            .ok_or_else(|| AdRelayError::Validation("timestamp is required".to_string()))?;

        let mut record = Map::new();
        match attribution {
            Attribution::Pixel(pixel_id) => {
                record.insert("pixel_id".into(), json!(pixel_id));
            }
            Attribution::App { snap_app_id, app_id } => {
                record.insert("snap_app_id".into(), json!(snap_app_id));
                record.insert("app_id".into(), json!(app_id));
            }
        }
        record.insert("event_type".into(), json!(event_type.to_ascii_uppercase()));
        record.insert(
            "event_conversion_type".into(),
            json!(conversion_type_name(self.conversion_type)),
        );
        record.insert("timestamp".into(), json!(epoch_millis(&timestamp)));

        let identity = &event.identity;
        if let Some(email) = identity.get(IdentityField::Email) {
            record.insert("hashed_email".into(), json!(hashed_email(email)));
        }
        if let Some(phone) = identity.get(IdentityField::Phone) {
            record.insert("hashed_phone_number".into(), json!(hashed_phone(phone)));
        }
        if let Some(click_id) = identity.get(IdentityField::ClickId) {
            record.insert("click_id".into(), json!(click_id));
        }
        if let Some(value) = event.value {
            record.insert("price".into(), json!(value));
        }
        if let Some(currency) = &event.currency {
            record.insert("currency".into(), json!(currency.to_ascii_uppercase()));
        }
        if let Some(order_id) = &event.order_id {
            record.insert("transaction_id".into(), json!(order_id));
        }
        Ok(Value::Object(record))
    }

    fn assemble(&self, mut records: Vec<Value>) -> Result<Payload> {
        match records.len() {
            1 => Ok(Payload { body: records.remove(0), records: 1 }),
            n => Err(AdRelayError::Internal(format!(
                "Snap conversions are reported one at a time, got {n}"
            ))),
        }
    }

    async fn upload(&self, payload: Payload) -> Result<UploadResult> {
        let url = format!("{}/v2/conversion", self.base_url);
        let request = self.executor.request(Method::POST, &url).json(&payload.body);
        self.executor.execute(request, payload.records, &SnapStatusInterpreter).await
    }
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// A 2xx answer whose `status` is not `SUCCESS` means the event was dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapStatusInterpreter;

impl ResponseInterpreter for SnapStatusInterpreter {
    fn interpret(&self, _status: u16, body: &str, submitted: usize) -> Result<ResponseReport> {
        if body.trim().is_empty() {
            return Ok(ResponseReport::accepted(submitted));
        }
        let response: SnapResponse = serde_json::from_str(body).map_err(|e| {
            AdRelayError::Internal(format!("unreadable Snap conversion response: {e}"))
        })?;

        match response.status.as_deref() {
            None | Some("SUCCESS") => Ok(ResponseReport::accepted(submitted)),
            Some(other) => {
                let message = response.reason.unwrap_or_else(|| format!("status {other}"));
                let mut report = ResponseReport::accepted(submitted);
                for record in &mut report.records {
                    record.accepted = false;
                    record.message = Some(message.clone());
                }
                Ok(ResponseReport::partial(report.records, message, (0..submitted).collect()))
            }
        }
    }
}
