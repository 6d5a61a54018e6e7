//! Conversion events as they enter the upload pipeline.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity fields a platform may accept to attribute a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    Email,
    Phone,
    /// Ad click identifier (e.g. Google `gclid`)
    ClickId,
    CallerId,
    /// CRM browser cookie token (e.g. HubSpot `utk`)
    UserToken,
    ObjectId,
    /// Analytics client identifier (e.g. GA4 `client_id`)
    ClientId,
    UserId,
}

impl IdentityField {
    /// Field name used in normalized event input.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::ClickId => "click_id",
            Self::CallerId => "caller_id",
            Self::UserToken => "user_token",
            Self::ObjectId => "object_id",
            Self::ClientId => "client_id",
            Self::UserId => "user_id",
        }
    }

    pub const ALL: [Self; 8] = [
        Self::Email,
        Self::Phone,
        Self::ClickId,
        Self::CallerId,
        Self::UserToken,
        Self::ObjectId,
        Self::ClientId,
        Self::UserId,
    ];
}

/// Identity portion of a conversion event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Identity {
    /// Value of `field`, treating blank strings as absent.
    pub fn get(&self, field: IdentityField) -> Option<&str> {
        let raw = match field {
            IdentityField::Email => &self.email,
            IdentityField::Phone => &self.phone,
            IdentityField::ClickId => &self.click_id,
            IdentityField::CallerId => &self.caller_id,
            IdentityField::UserToken => &self.user_token,
            IdentityField::ObjectId => &self.object_id,
            IdentityField::ClientId => &self.client_id,
            IdentityField::UserId => &self.user_id,
        };
        raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    /// Set `field` to `value`.
    pub fn set(&mut self, field: IdentityField, value: String) {
        let slot = match field {
            IdentityField::Email => &mut self.email,
            IdentityField::Phone => &mut self.phone,
            IdentityField::ClickId => &mut self.click_id,
            IdentityField::CallerId => &mut self.caller_id,
            IdentityField::UserToken => &mut self.user_token,
            IdentityField::ObjectId => &mut self.object_id,
            IdentityField::ClientId => &mut self.client_id,
            IdentityField::UserId => &mut self.user_id,
        };
        *slot = Some(value);
    }

    /// Returns true if at least one of `accepted` is present.
    pub fn has_any(&self, accepted: &[IdentityField]) -> bool {
        accepted.iter().any(|field| self.get(*field).is_some())
    }
}

/// A normalized inbound event ready for payload construction.
///
/// Built once per inbound event and never mutated afterwards; dropped when
/// the upload attempt completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionEvent {
    pub identity: Identity,

    /// Monetary value of the conversion
    pub value: Option<f64>,

    /// ISO 4217 currency code, uppercased during normalization
    pub currency: Option<String>,

    /// When the conversion happened
    pub timestamp: Option<DateTime<Utc>>,

    /// Platform-specific action type (conversion action id, event type,
    /// event name)
    pub action: Option<String>,

    /// Merchant order / transaction identifier
    pub order_id: Option<String>,

    /// Start of the phone call, for call conversions
    pub call_started_at: Option<DateTime<Utc>>,

    /// Named custom attributes, keyed by the platform-side variable name
    pub custom_attributes: BTreeMap<String, String>,

    /// Free-form event properties forwarded as-is where the platform allows
    pub properties: Map<String, Value>,
}

impl ConversionEvent {
    /// Create an event carrying only identity fields.
    pub fn new(identity: Identity) -> Self {
        Self { identity, ..Self::default() }
    }

    /// Distinct custom attribute names referenced by this event.
    pub fn custom_attribute_names(&self) -> BTreeSet<String> {
        self.custom_attributes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_values_count_as_missing() {
        let identity = Identity {
            email: Some("   ".to_string()),
            caller_id: Some("+1234567890".to_string()),
            ..Identity::default()
        };

        assert_eq!(identity.get(IdentityField::Email), None);
        assert_eq!(identity.get(IdentityField::CallerId), Some("+1234567890"));
        assert!(identity.has_any(&[IdentityField::Email, IdentityField::CallerId]));
        assert!(!identity.has_any(&[IdentityField::Email, IdentityField::ClickId]));
    }

    #[test]
    fn set_then_get_round_trips_every_field() {
        let mut identity = Identity::default();
        for field in IdentityField::ALL {
            identity.set(field, format!("value-{}", field.as_str()));
        }
        for field in IdentityField::ALL {
            assert_eq!(identity.get(field), Some(format!("value-{}", field.as_str()).as_str()));
        }
    }

    #[test]
    fn custom_attribute_names_are_distinct_and_sorted() {
        let mut event = ConversionEvent::default();
        event.custom_attributes.insert("tier".into(), "gold".into());
        event.custom_attributes.insert("username".into(), "spongebob".into());

        let names: Vec<_> = event.custom_attribute_names().into_iter().collect();
        assert_eq!(names, vec!["tier".to_string(), "username".to_string()]);
    }
}
