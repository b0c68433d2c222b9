//! In-memory identity store.
//!
//! A thread-safe implementation of [`IdentityStore`] backed by an ordered map
//! behind tokio's `RwLock`. It is used for tests, dry runs, and as the cache
//! underneath [`JsonFileIdentityStore`](super::JsonFileIdentityStore).
//!
//! Every successful `apply` is recorded in an operation journal so callers
//! can check exactly which writes a pass issued.
//!
//! # Example Usage
//!
//! ```rust
//! use ironic_keystone_auth::resource::{Attributes, Ensure, ObservedResource, ResourceKey};
//! use ironic_keystone_auth::store::{IdentityStore, InMemoryIdentityStore};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut attributes = Attributes::new();
//! attributes.insert("password".to_string(), json!("secret"));
//! let user = ObservedResource::new(ResourceKey::user("ironic")?, attributes);
//!
//! // Seeded records do not show up in the journal
//! let store = InMemoryIdentityStore::with_resources([user]);
//! assert!(store.operations().await.is_empty());
//!
//! store
//!     .apply(&ResourceKey::user("ironic")?, &Attributes::new(), Ensure::Absent)
//!     .await?;
//! assert_eq!(store.operations().await.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::resource::{Attributes, Ensure, ObservedResource, ResourceKey, ResourceKind};
use crate::store::{ApplyError, IdentityStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One write the store accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOperation {
    pub key: ResourceKey,
    pub ensure: Ensure,
    /// Names of the attributes sent with the write.
    pub attributes: Vec<String>,
}

impl StoreOperation {
    pub fn kind(&self) -> ResourceKind {
        self.key.kind()
    }
}

/// Thread-safe in-memory identity store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    records: Arc<RwLock<BTreeMap<ResourceKey, Attributes>>>,
    journal: Arc<Mutex<Vec<StoreOperation>>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds the given records.
    pub fn with_resources(resources: impl IntoIterator<Item = ObservedResource>) -> Self {
        let records = resources
            .into_iter()
            .map(|resource| (resource.key, resource.attributes))
            .collect();
        Self {
            records: Arc::new(RwLock::new(records)),
            journal: Arc::default(),
        }
    }

    /// Insert or replace a record without journaling it.
    pub async fn seed(&self, resource: ObservedResource) {
        let mut records = self.records.write().await;
        records.insert(resource.key, resource.attributes);
    }

    /// Every record, ordered by key.
    pub async fn snapshot(&self) -> Vec<ObservedResource> {
        let records = self.records.read().await;
        records
            .iter()
            .map(|(key, attributes)| ObservedResource::new(key.clone(), attributes.clone()))
            .collect()
    }

    /// Writes accepted so far, in the order they were applied.
    pub async fn operations(&self) -> Vec<StoreOperation> {
        self.journal.lock().await.clone()
    }

    /// Writes accepted so far for one kind.
    pub async fn operations_for(&self, kind: ResourceKind) -> Vec<StoreOperation> {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|op| op.kind() == kind)
            .cloned()
            .collect()
    }

    pub async fn clear_operations(&self) {
        self.journal.lock().await.clear();
    }

    /// Remove all records and the journal.
    pub async fn clear(&self) {
        self.records.write().await.clear();
        self.clear_operations().await;
    }

    /// Record counts for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStoreStats {
        let records = self.records.read().await;
        let mut per_kind = BTreeMap::new();
        for key in records.keys() {
            *per_kind.entry(key.kind()).or_insert(0) += 1;
        }
        InMemoryStoreStats {
            total_resources: records.len(),
            per_kind,
        }
    }
}

impl IdentityStore for InMemoryIdentityStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<ObservedResource>, ApplyError> {
        let records = self.records.read().await;
        Ok(records
            .get(key)
            .map(|attributes| ObservedResource::new(key.clone(), attributes.clone())))
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<ObservedResource>, ApplyError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|(key, _)| key.kind() == kind)
            .map(|(key, attributes)| ObservedResource::new(key.clone(), attributes.clone()))
            .collect())
    }

    async fn apply(
        &self,
        key: &ResourceKey,
        attributes: &Attributes,
        ensure: Ensure,
    ) -> Result<(), ApplyError> {
        merge_record(&mut *self.records.write().await, key, attributes, ensure);

        let attribute_names = match ensure {
            Ensure::Present => attributes.keys().cloned().collect(),
            Ensure::Absent => Vec::new(),
        };
        self.journal.lock().await.push(StoreOperation {
            key: key.clone(),
            ensure,
            attributes: attribute_names,
        });
        Ok(())
    }
}

/// Apply one write to a record set.
///
/// Present merges `attributes` into the record, creating it when missing.
/// Absent removes the record.
pub(crate) fn merge_record(
    records: &mut BTreeMap<ResourceKey, Attributes>,
    key: &ResourceKey,
    attributes: &Attributes,
    ensure: Ensure,
) {
    match ensure {
        Ensure::Present => {
            let record = records.entry(key.clone()).or_default();
            for (name, value) in attributes {
                record.insert(name.clone(), value.clone());
            }
        }
        Ensure::Absent => {
            records.remove(key);
        }
    }
}

/// Record counts of an [`InMemoryIdentityStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStoreStats {
    pub total_resources: usize,
    pub per_kind: BTreeMap<ResourceKind, usize>,
}

impl InMemoryStoreStats {
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.per_kind.get(&kind).copied().unwrap_or(0)
    }
}
