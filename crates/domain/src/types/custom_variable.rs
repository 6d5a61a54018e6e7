//! Custom variable mappings resolved from the platform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A platform-side custom conversion variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomVariable {
    /// Case-sensitive name, unique within a credential scope
    pub name: String,

    /// Platform resource identifier (e.g.
    /// `customers/1234/conversionCustomVariables/123445`)
    pub resource_name: String,
}

/// Name to resource-identifier mapping produced by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIdentifiers {
    entries: HashMap<String, String>,
}

impl ResolvedIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, resource_name: impl Into<String>) {
        self.entries.insert(name.into(), resource_name.into());
    }

    /// Resource identifier for `name`, if resolved.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CustomVariable> for ResolvedIdentifiers {
    fn from_iter<I: IntoIterator<Item = CustomVariable>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|var| (var.name, var.resource_name)).collect(),
        }
    }
}
