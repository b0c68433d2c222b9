//! The desired state of one reconciliation pass.

use crate::error::ConfigError;
use crate::resource::key::ResourceKey;
use crate::resource::kind::{ResourceKind, Tier};
use crate::resource::types::DesiredResource;
use std::collections::{BTreeMap, BTreeSet};

/// Every resource declared for a pass, plus the kinds the pass manages.
///
/// A kind is *managed* when the configuration expressed an opinion about it,
/// even if that opinion is that no resource of the kind should exist. Store
/// records of an unmanaged kind are never created, updated or deleted.
///
/// A `DesiredState` is validated on construction and immutable afterwards;
/// a new pass builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
    resources: BTreeMap<ResourceKey, DesiredResource>,
    managed: BTreeSet<ResourceKind>,
}

impl DesiredState {
    /// Validate and assemble a desired state.
    ///
    /// The kind of every declared resource is managed implicitly; `managed`
    /// adds kinds that are managed without any declaration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateKey`] when a key is declared twice
    /// - [`ConfigError::MissingAttribute`] when a present resource lacks a
    ///   required attribute of its kind
    pub fn new(
        resources: impl IntoIterator<Item = DesiredResource>,
        managed: impl IntoIterator<Item = ResourceKind>,
    ) -> Result<Self, ConfigError> {
        let mut managed: BTreeSet<ResourceKind> = managed.into_iter().collect();
        let mut declared = BTreeMap::new();

        for resource in resources {
            if let Some(attribute) = resource.missing_attribute() {
                return Err(ConfigError::MissingAttribute {
                    kind: resource.kind(),
                    key: resource.key().to_string(),
                    attribute: attribute.to_string(),
                });
            }
            managed.insert(resource.kind());
            let key = resource.key().clone();
            if declared.insert(key.clone(), resource).is_some() {
                return Err(ConfigError::DuplicateKey {
                    kind: key.kind(),
                    key: key.to_string(),
                });
            }
        }

        Ok(Self {
            resources: declared,
            managed,
        })
    }

    /// A desired state managing exactly the kinds it declares.
    pub fn from_resources(
        resources: impl IntoIterator<Item = DesiredResource>,
    ) -> Result<Self, ConfigError> {
        Self::new(resources, std::iter::empty::<ResourceKind>())
    }

    pub fn is_managed(&self, kind: ResourceKind) -> bool {
        self.managed.contains(&kind)
    }

    pub fn managed_kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.managed.iter().copied()
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&DesiredResource> {
        self.resources.get(key)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.contains_key(key)
    }

    /// All declared resources, ordered by key.
    pub fn resources(&self) -> impl Iterator<Item = &DesiredResource> {
        self.resources.values()
    }

    /// Declared resources of one kind.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &DesiredResource> {
        self.resources.values().filter(move |r| r.kind() == kind)
    }

    /// Declared resources of one tier.
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &DesiredResource> {
        self.resources.values().filter(move |r| r.kind().tier() == tier)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
