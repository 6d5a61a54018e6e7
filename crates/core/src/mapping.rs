//! Field mapping evaluator
//!
//! A mapping turns an arbitrary inbound event payload into the normalized
//! event input object. Each output field is a directive:
//!
//! - a literal JSON value
//! - `{"@path": "$.properties.email"}`: value at a dotted path
//! - `{"@if": {"exists": <directive>, "then": <directive>, "else": <directive>}}`
//! - an object of directives, evaluated field by field
//!
//! Missing paths evaluate to nothing and their fields are left out.

use std::collections::BTreeMap;

use adrelay_domain::{AdRelayError, Result};
use serde_json::{Map, Value};

const PATH_KEY: &str = "@path";
const IF_KEY: &str = "@if";

/// A single parsed mapping directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Literal(Value),
    Path(Vec<String>),
    If { exists: Box<Directive>, then: Box<Directive>, otherwise: Box<Directive> },
    Object(BTreeMap<String, Directive>),
}

impl Directive {
    /// Parse a directive from its JSON form.
    ///
    /// # Errors
    /// Returns [`AdRelayError::Configuration`] for malformed `@path` or `@if`
    /// directives.
    pub fn parse(raw: &Value) -> Result<Self> {
        let Value::Object(object) = raw else {
            return Ok(Self::Literal(raw.clone()));
        };

        if let Some(path) = object.get(PATH_KEY) {
            return parse_path(path).map(Self::Path);
        }

        if let Some(condition) = object.get(IF_KEY) {
            let branch = |key: &str| -> Result<Box<Directive>> {
                match condition.get(key) {
                    Some(raw) => Ok(Box::new(Self::parse(raw)?)),
                    None => Ok(Box::new(Self::Literal(Value::Null))),
                }
            };
            let exists = condition.get("exists").ok_or_else(|| {
                AdRelayError::Configuration("@if directive requires an `exists` clause".to_string())
            })?;
            return Ok(Self::If {
                exists: Box::new(Self::parse(exists)?),
                then: branch("then")?,
                otherwise: branch("else")?,
            });
        }

        object
            .iter()
            .map(|(key, value)| Ok((key.clone(), Self::parse(value)?)))
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Self::Object)
    }

    /// Evaluate against `event`; `None` means the field is absent.
    pub fn evaluate(&self, event: &Value) -> Option<Value> {
        match self {
            Self::Literal(Value::Null) => None,
            Self::Literal(value) => Some(value.clone()),
            Self::Path(segments) => lookup(event, segments).filter(|v| !v.is_null()).cloned(),
            Self::If { exists, then, otherwise } => {
                if exists.evaluate(event).is_some() {
                    then.evaluate(event)
                } else {
                    otherwise.evaluate(event)
                }
            }
            Self::Object(fields) => Some(Value::Object(evaluate_fields(fields, event))),
        }
    }
}

/// A set of output fields, each computed by a directive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    fields: BTreeMap<String, Directive>,
}

impl Mapping {
    /// Parse a mapping from a JSON object of directives.
    ///
    /// # Errors
    /// Returns [`AdRelayError::Configuration`] if `raw` is not an object or a
    /// directive is malformed.
    pub fn parse(raw: &Value) -> Result<Self> {
        let object = raw.as_object().ok_or_else(|| {
            AdRelayError::Configuration("mapping must be a JSON object".to_string())
        })?;
        let fields = object
            .iter()
            .map(|(key, value)| Ok((key.clone(), Directive::parse(value)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { fields })
    }

    /// Produce the normalized event input object for `event`.
    pub fn evaluate(&self, event: &Value) -> Value {
        Value::Object(evaluate_fields(&self.fields, event))
    }
}

fn evaluate_fields(fields: &BTreeMap<String, Directive>, event: &Value) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|(key, directive)| directive.evaluate(event).map(|value| (key.clone(), value)))
        .collect()
}

fn parse_path(raw: &Value) -> Result<Vec<String>> {
    let path = raw.as_str().ok_or_else(|| {
        AdRelayError::Configuration("@path directive must be a string".to_string())
    })?;
    let trimmed = path.strip_prefix("$.").or_else(|| path.strip_prefix('$')).unwrap_or(path);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<String> = trimmed.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return Err(AdRelayError::Configuration(format!("invalid @path {path:?}")));
    }
    Ok(segments)
}

fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(object) => object.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}
