//! Google Ads conversion records
//!
//! Pure builders for `uploadCallConversions` and `uploadClickConversions`
//! request bodies.

use adrelay_core::TimestampFormat;
use adrelay_domain::{AdRelayError, ConversionEvent, IdentityField, ResolvedIdentifiers, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::integrations::hashing::{hashed_email, hashed_phone};

/// Resource name of a conversion action; full resource names pass through.
pub fn conversion_action(customer_id: &str, action: &str) -> String {
    if action.starts_with("customers/") {
        action.to_string()
    } else {
        format!("customers/{customer_id}/conversionActions/{action}")
    }
}

/// Record fields shared by call and click conversions.
pub fn base_record(
    customer_id: &str,
    event: &ConversionEvent,
    resolved: &ResolvedIdentifiers,
) -> Result<Map<String, Value>> {
    let action = event
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AdRelayError::Validation("conversion action is required".to_string()))?;
    let timestamp = required_timestamp(event.timestamp)?;

    let mut record = Map::new();
    record.insert("conversionAction".into(), json!(conversion_action(customer_id, action)));
    record.insert("conversionDateTime".into(), json!(TimestampFormat::GoogleAds.format(&timestamp)));
    if let Some(value) = event.value {
        record.insert("conversionValue".into(), json!(value));
    }
    if let Some(currency) = &event.currency {
        record.insert("currencyCode".into(), json!(currency.to_ascii_uppercase()));
    }
    if let Some(variables) = custom_variables(event, resolved)? {
        record.insert("customVariables".into(), variables);
    }
    Ok(record)
}

/// `uploadCallConversions` record.
pub fn call_record(
    customer_id: &str,
    event: &ConversionEvent,
    resolved: &ResolvedIdentifiers,
) -> Result<Value> {
    let mut record = base_record(customer_id, event, resolved)?;
    if let Some(caller_id) = event.identity.get(IdentityField::CallerId) {
        record.insert("callerId".into(), json!(caller_id));
    }
    if let Some(started) = &event.call_started_at {
        record.insert("callStartDateTime".into(), json!(TimestampFormat::GoogleAds.format(started)));
    }
    Ok(Value::Object(record))
}

/// `uploadClickConversions` record with hashed user identifiers.
pub fn click_record(
    customer_id: &str,
    event: &ConversionEvent,
    resolved: &ResolvedIdentifiers,
) -> Result<Value> {
    let mut record = base_record(customer_id, event, resolved)?;
    let identity = &event.identity;
    if let Some(gclid) = identity.get(IdentityField::ClickId) {
        record.insert("gclid".into(), json!(gclid));
    }
    if let Some(order_id) = &event.order_id {
        record.insert("orderId".into(), json!(order_id));
    }

    let mut identifiers = Vec::new();
    if let Some(email) = identity.get(IdentityField::Email) {
        identifiers.push(json!({ "hashedEmail": hashed_email(email) }));
    }
    if let Some(phone) = identity.get(IdentityField::Phone) {
        identifiers.push(json!({ "hashedPhoneNumber": hashed_phone(phone) }));
    }
    if !identifiers.is_empty() {
        record.insert("userIdentifiers".into(), Value::Array(identifiers));
    }
    Ok(Value::Object(record))
}

/// `customVariables` entries, failing if any attribute lacks a mapping.
fn custom_variables(
    event: &ConversionEvent,
    resolved: &ResolvedIdentifiers,
) -> Result<Option<Value>> {
    if event.custom_attributes.is_empty() {
        return Ok(None);
    }

    let mut entries = Vec::with_capacity(event.custom_attributes.len());
    let mut unresolved = Vec::new();
    for (name, value) in &event.custom_attributes {
        match resolved.get(name) {
            Some(resource_name) => entries.push(json!({
                "conversionCustomVariable": resource_name,
                "value": value,
            })),
            None => unresolved.push(name.clone()),
        }
    }

    if !unresolved.is_empty() {
        return Err(AdRelayError::UnresolvedIdentifier { names: unresolved });
    }
    Ok(Some(Value::Array(entries)))
}

fn required_timestamp(timestamp: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
    timestamp.ok_or_else(|| AdRelayError::Validation("timestamp is required".to_string()))
}
