//! Desired and observed resource records.

use crate::resource::key::ResourceKey;
use crate::resource::kind::{Ensure, ResourceKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Attribute mapping of a resource, ordered by attribute name.
pub type Attributes = BTreeMap<String, Value>;

/// Attributes whose values are never written to logs or debug output.
const SECRET_ATTRIBUTES: &[&str] = &["password"];

/// Copy of `attributes` with secret values masked.
pub fn redacted(attributes: &Attributes) -> Attributes {
    attributes
        .iter()
        .map(|(name, value)| {
            if SECRET_ATTRIBUTES.contains(&name.as_str()) {
                (name.clone(), Value::String("<redacted>".to_string()))
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

/// A resource as the configuration wants it to be.
#[derive(Clone, PartialEq)]
pub struct DesiredResource {
    key: ResourceKey,
    attributes: Attributes,
    ensure: Ensure,
}

impl DesiredResource {
    pub fn present(key: ResourceKey, attributes: Attributes) -> Self {
        Self {
            key,
            attributes,
            ensure: Ensure::Present,
        }
    }

    /// An absent resource carries no attributes.
    pub fn absent(key: ResourceKey) -> Self {
        Self {
            key,
            attributes: Attributes::new(),
            ensure: Ensure::Absent,
        }
    }

    pub fn new(key: ResourceKey, attributes: Attributes, ensure: Ensure) -> Self {
        match ensure {
            Ensure::Present => Self::present(key, attributes),
            Ensure::Absent => Self::absent(key),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.key.kind()
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Name of the first required attribute this resource lacks, if any.
    ///
    /// Absent resources are never incomplete.
    pub fn missing_attribute(&self) -> Option<&'static str> {
        if !self.ensure.is_present() {
            return None;
        }
        self.kind()
            .required_attributes()
            .iter()
            .find(|name| matches!(self.attributes.get(**name), None | Some(Value::Null)))
            .copied()
    }

    /// Attributes that differ from what the store holds.
    ///
    /// Attributes present in the store but not declared here are left alone.
    pub fn diff(&self, observed: &ObservedResource) -> Attributes {
        self.attributes
            .iter()
            .filter(|(name, value)| observed.attributes.get(*name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for DesiredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredResource")
            .field("kind", &self.kind())
            .field("key", &self.key.to_string())
            .field("attributes", &redacted(&self.attributes))
            .field("ensure", &self.ensure)
            .finish()
    }
}

/// A resource as the identity store last reported it.
#[derive(Clone, PartialEq)]
pub struct ObservedResource {
    pub key: ResourceKey,
    pub attributes: Attributes,
}

impl ObservedResource {
    pub fn new(key: ResourceKey, attributes: Attributes) -> Self {
        Self { key, attributes }
    }

    pub fn kind(&self) -> ResourceKind {
        self.key.kind()
    }
}

impl fmt::Debug for ObservedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedResource")
            .field("kind", &self.kind())
            .field("key", &self.key.to_string())
            .field("attributes", &redacted(&self.attributes))
            .finish()
    }
}
