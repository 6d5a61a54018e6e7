//! Pre-flight business rules for conversion events
//!
//! Every check here runs before any network call. Rule order matters: a
//! missing identity is reported before a monetary problem.

use adrelay_domain::constants::is_iso_4217;
use adrelay_domain::{AdRelayError, ConversionEvent, Identity, IdentityField, Result};

/// Require at least one identity field the platform accepts.
///
/// # Errors
/// Returns [`AdRelayError::Configuration`] naming the accepted fields; a
/// mapping that yields no identity is a destination misconfiguration.
pub fn require_identity(identity: &Identity, accepted: &[IdentityField]) -> Result<()> {
    if accepted.is_empty() || identity.has_any(accepted) {
        return Ok(());
    }

    let names: Vec<&str> = accepted.iter().map(|field| field.as_str()).collect();
    Err(AdRelayError::Configuration(format!(
        "At least one of the following identity fields is required: {}",
        names.join(", ")
    )))
}

/// Enforce the value/currency rules.
///
/// A non-zero value requires a currency; any currency present must be an
/// ISO 4217 alphabetic code. A currency without a value is fine.
///
/// # Errors
/// Returns [`AdRelayError::Validation`] when a rule is broken.
pub fn validate_monetary(value: Option<f64>, currency: Option<&str>) -> Result<()> {
    if let Some(code) = currency {
        if !is_iso_4217(&code.to_ascii_uppercase()) {
            return Err(AdRelayError::Validation(format!("{code} is not a valid currency code.")));
        }
    }

    match value {
        Some(v) if !v.is_finite() => {
            Err(AdRelayError::Validation("value must be a finite number".to_string()))
        }
        Some(v) if v != 0.0 && currency.is_none() => {
            Err(AdRelayError::Validation("Currency is required if value is set.".to_string()))
        }
        _ => Ok(()),
    }
}

/// Run every pre-flight check for `event` in precedence order.
///
/// # Errors
/// See [`require_identity`] and [`validate_monetary`].
pub fn validate_event(event: &ConversionEvent, accepted: &[IdentityField]) -> Result<()> {
    require_identity(&event.identity, accepted)?;
    validate_monetary(event.value, event.currency.as_deref())
}
