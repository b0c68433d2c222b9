//! Identity store abstraction.
//!
//! The reconciliation engine never talks to Keystone directly. It reads and
//! writes through an [`IdentityStore`], which owns the observed state
//! between passes.
//!
//! # Design
//!
//! At the store level, create and update are the same operation: applying a
//! present resource merges the given attributes into whatever the store
//! holds for that key, creating the record when there is none. Whether a
//! call is a create or an update is decided by the engine, which only sends
//! the attributes that differ.
//!
//! # Example Usage
//!
//! ```rust
//! use ironic_keystone_auth::resource::{Attributes, Ensure, ResourceKey, ResourceKind};
//! use ironic_keystone_auth::store::{IdentityStore, InMemoryIdentityStore};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryIdentityStore::new();
//! let key = ResourceKey::service("ironic", "baremetal")?;
//!
//! let mut attributes = Attributes::new();
//! attributes.insert("description".to_string(), json!("Ironic Bare Metal Provisioning Service"));
//! store.apply(&key, &attributes, Ensure::Present).await?;
//!
//! let observed = store.get(&key).await?;
//! assert!(observed.is_some());
//!
//! store.apply(&key, &Attributes::new(), Ensure::Absent).await?;
//! assert!(store.list(ResourceKind::Service).await?.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;
pub mod json_file;


pub use errors::{ApplyError, ErrorClass};
pub use in_memory::{InMemoryIdentityStore, InMemoryStoreStats, StoreOperation};
pub use json_file::JsonFileIdentityStore;

use crate::resource::{Attributes, Ensure, ObservedResource, ResourceKey, ResourceKind};
use std::future::Future;

/// Read and apply access to the records of an identity service.
///
/// The kind of every record is carried by its [`ResourceKey`].
///
/// Implementations must tolerate concurrent calls for distinct keys: the
/// engine applies the resources of one tier concurrently.
pub trait IdentityStore: Send + Sync {
    /// Fetch the current record for a key.
    ///
    /// Returns `None` when the record does not exist.
    fn get(
        &self,
        key: &ResourceKey,
    ) -> impl Future<Output = Result<Option<ObservedResource>, ApplyError>> + Send;

    /// List every record of one kind, ordered by key.
    fn list(
        &self,
        kind: ResourceKind,
    ) -> impl Future<Output = Result<Vec<ObservedResource>, ApplyError>> + Send;

    /// Converge one record.
    ///
    /// # Behavior
    /// - `Ensure::Present` merges `attributes` into the stored record,
    ///   creating it when missing
    /// - `Ensure::Absent` removes the record; `attributes` is ignored and
    ///   removing a missing record succeeds
    fn apply(
        &self,
        key: &ResourceKey,
        attributes: &Attributes,
        ensure: Ensure,
    ) -> impl Future<Output = Result<(), ApplyError>> + Send;
}
