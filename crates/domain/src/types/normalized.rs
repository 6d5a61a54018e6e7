//! Conversion events from normalized event input
//!
//! The mapping layer produces a flat JSON object. Recognized keys:
//!
//! | key                | type                               |
//! |--------------------|------------------------------------|
//! | identity fields    | string or number (see `IdentityField::as_str`) |
//! | `gclid` / `utk`    | aliases of `click_id` / `user_token` |
//! | `value`            | number or numeric string           |
//! | `currency`         | string, uppercased                 |
//! | `timestamp`        | RFC 3339 string or epoch millis    |
//! | `call_timestamp`   | RFC 3339 string or epoch millis    |
//! | `action`           | string or number                   |
//! | `order_id`         | string or number                   |
//! | `custom_variables` | object of name to scalar           |
//! | `properties`       | object                             |
//!
//! `null` and blank strings count as absent. Unknown keys are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use super::conversion::{ConversionEvent, Identity, IdentityField};
use crate::errors::{AdRelayError, Result};

const ALIASES: &[(&str, IdentityField)] =
    &[("gclid", IdentityField::ClickId), ("utk", IdentityField::UserToken)];

impl ConversionEvent {
    /// Build an event from a normalized event input object.
    ///
    /// # Errors
    /// Returns [`AdRelayError::Validation`] when the input is not an object
    /// or a recognized key has an unusable value.
    pub fn try_from_normalized(input: &Value) -> Result<Self> {
        let object = input.as_object().ok_or_else(|| {
            AdRelayError::Validation("normalized event input must be an object".to_string())
        })?;

        let mut identity = Identity::default();
        for field in IdentityField::ALL {
            if let Some(value) = scalar(object, field.as_str())? {
                identity.set(field, value);
            }
        }
        for (alias, field) in ALIASES {
            if identity.get(*field).is_none() {
                if let Some(value) = scalar(object, alias)? {
                    identity.set(*field, value);
                }
            }
        }

        Ok(Self {
            identity,
            value: monetary_value(object.get("value"))?,
            currency: scalar(object, "currency")?.map(|code| code.to_ascii_uppercase()),
            timestamp: timestamp(object, "timestamp")?,
            action: scalar(object, "action")?,
            order_id: scalar(object, "order_id")?,
            call_started_at: timestamp(object, "call_timestamp")?,
            custom_attributes: custom_variables(object.get("custom_variables"))?,
            properties: properties(object.get("properties"))?,
        })
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// String form of a scalar field, or `None` when absent.
fn scalar(object: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) if is_absent(value) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(AdRelayError::Validation(format!("{key} must be a scalar value"))),
    }
}

fn monetary_value(raw: Option<&Value>) -> Result<Option<f64>> {
    let parsed = match raw {
        None => return Ok(None),
        Some(value) if is_absent(value) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(AdRelayError::Validation("value must be a number".to_string())),
    }
}

fn timestamp(object: &Map<String, Value>, key: &str) -> Result<Option<DateTime<Utc>>> {
    match object.get(key) {
        None => Ok(None),
        Some(value) if is_absent(value) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| AdRelayError::Validation(format!("{key} is not an RFC 3339 timestamp: {e}"))),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(Some)
            .ok_or_else(|| AdRelayError::Validation(format!("{key} is out of range"))),
        Some(_) => Err(AdRelayError::Validation(format!("{key} must be a string or number"))),
    }
}

fn custom_variables(raw: Option<&Value>) -> Result<BTreeMap<String, String>> {
    let mut attributes = BTreeMap::new();
    let object = match raw {
        None | Some(Value::Null) => return Ok(attributes),
        Some(Value::Object(object)) => object,
        Some(_) => {
            return Err(AdRelayError::Validation("custom_variables must be an object".to_string()))
        }
    };

    for name in object.keys() {
        if let Some(value) = scalar(object, name)? {
            attributes.insert(name.clone(), value);
        }
    }
    Ok(attributes)
}

fn properties(raw: Option<&Value>) -> Result<Map<String, Value>> {
    match raw {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(object)) => Ok(object.clone()),
        Some(_) => Err(AdRelayError::Validation("properties must be an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_identity_money_and_time() {
        let event = ConversionEvent::try_from_normalized(&json!({
            "email": "test@gmail.com",
            "value": "200",
            "currency": "usd",
            "timestamp": "2021-06-10T18:08:04.000Z",
            "action": 12345,
            "ignored": true
        }))
        .unwrap();

        assert_eq!(event.identity.email.as_deref(), Some("test@gmail.com"));
        assert_eq!(event.value, Some(200.0));
        assert_eq!(event.currency.as_deref(), Some("USD"));
        assert_eq!(event.timestamp.unwrap().to_rfc3339(), "2021-06-10T18:08:04+00:00");
        assert_eq!(event.action.as_deref(), Some("12345"));
    }

    #[test]
    fn empty_value_string_is_unset() {
        let event = ConversionEvent::try_from_normalized(&json!({ "value": "" })).unwrap();
        assert_eq!(event.value, None);
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = ConversionEvent::try_from_normalized(&json!({ "value": "lots" })).unwrap_err();
        assert_eq!(err, AdRelayError::Validation("value must be a number".to_string()));
    }

    #[test]
    fn aliases_fill_identity_fields() {
        let event =
            ConversionEvent::try_from_normalized(&json!({ "gclid": "abc", "utk": "cookie" })).unwrap();
        assert_eq!(event.identity.click_id.as_deref(), Some("abc"));
        assert_eq!(event.identity.user_token.as_deref(), Some("cookie"));
    }

    #[test]
    fn custom_variables_and_properties() {
        let event = ConversionEvent::try_from_normalized(&json!({
            "custom_variables": { "username": "spongebob", "level": 3, "blank": "" },
            "properties": { "Plan": "pro" }
        }))
        .unwrap();

        assert_eq!(event.custom_attributes.get("username").map(String::as_str), Some("spongebob"));
        assert_eq!(event.custom_attributes.get("level").map(String::as_str), Some("3"));
        assert!(!event.custom_attributes.contains_key("blank"));
        assert_eq!(event.properties.get("Plan"), Some(&json!("pro")));
    }

    #[test]
    fn nested_custom_variable_is_rejected() {
        let err = ConversionEvent::try_from_normalized(&json!({
            "custom_variables": { "nested": { "a": 1 } }
        }))
        .unwrap_err();
        assert!(matches!(err, AdRelayError::Validation(_)));
    }

    #[test]
    fn epoch_millis_timestamp() {
        let event =
            ConversionEvent::try_from_normalized(&json!({ "timestamp": 1_623_348_484_000_i64 }))
                .unwrap();
        assert_eq!(event.timestamp.unwrap().to_rfc3339(), "2021-06-10T18:08:04+00:00");
    }

    #[test]
    fn rejects_non_object_input() {
        assert!(ConversionEvent::try_from_normalized(&json!(["email"])).is_err());
    }
}
