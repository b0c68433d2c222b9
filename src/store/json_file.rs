//! JSON file backed identity store.
//!
//! Keeps observed state on disk between invocations. The whole record set
//! is held in an [`InMemoryIdentityStore`]. Every `apply` writes the
//! resulting record set to disk first, through a temporary file and a
//! rename, and only updates the cache once the document is in place. A
//! failed or cancelled write leaves the cache as it was.
//!
//! # Document format
//!
//! ```json
//! {
//!   "version": 1,
//!   "updated_at": "2026-10-15T09:30:00Z",
//!   "resources": [
//!     { "kind": "User", "key": "ironic", "attributes": { "password": "..." } }
//!   ]
//! }
//! ```

use crate::resource::{Attributes, Ensure, ObservedResource, ResourceKey, ResourceKind};
use crate::store::in_memory::merge_record;
use crate::store::{ApplyError, IdentityStore, InMemoryIdentityStore};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    updated_at: DateTime<Utc>,
    resources: Vec<StateRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    kind: ResourceKind,
    key: String,
    #[serde(default)]
    attributes: Attributes,
}

/// Identity store persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileIdentityStore {
    path: PathBuf,
    cache: InMemoryIdentityStore,
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileIdentityStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// [`ApplyError::Corrupt`] when the document cannot be parsed, has an
    /// unknown version, or holds a key that does not parse for its kind.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let path = path.into();
        let resources = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_document(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };
        debug!(
            "Loaded {} resource(s) from {}",
            resources.len(),
            path.display()
        );

        Ok(Self {
            path,
            cache: InMemoryIdentityStore::with_resources(resources),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view of the persisted records.
    pub fn cache(&self) -> &InMemoryIdentityStore {
        &self.cache
    }

    async fn persist(
        &self,
        records: &BTreeMap<ResourceKey, Attributes>,
    ) -> Result<(), ApplyError> {
        let document = StateDocument {
            version: FORMAT_VERSION,
            updated_at: Utc::now(),
            resources: records
                .iter()
                .map(|(key, attributes)| StateRecord {
                    kind: key.kind(),
                    key: key.to_string(),
                    attributes: attributes.clone(),
                })
                .collect(),
        };
        let contents = serde_json::to_string_pretty(&document).map_err(|e| ApplyError::Io {
            message: format!("Failed to serialize state: {}", e),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        trace!(
            "Persisted {} resource(s) to {}",
            document.resources.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn parse_document(contents: &str) -> Result<Vec<ObservedResource>, ApplyError> {
    let document: StateDocument =
        serde_json::from_str(contents).map_err(|e| ApplyError::Corrupt {
            message: format!("Failed to parse state document: {}", e),
        })?;
    if document.version != FORMAT_VERSION {
        return Err(ApplyError::Corrupt {
            message: format!("Unsupported state document version {}", document.version),
        });
    }
    document
        .resources
        .into_iter()
        .map(|record| {
            let key =
                ResourceKey::parse(record.kind, &record.key).map_err(|e| ApplyError::Corrupt {
                    message: e.to_string(),
                })?;
            Ok(ObservedResource::new(key, record.attributes))
        })
        .collect()
}

impl IdentityStore for JsonFileIdentityStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<ObservedResource>, ApplyError> {
        self.cache.get(key).await
    }

    async fn list(&self, kind: ResourceKind) -> Result<Vec<ObservedResource>, ApplyError> {
        self.cache.list(kind).await
    }

    async fn apply(
        &self,
        key: &ResourceKey,
        attributes: &Attributes,
        ensure: Ensure,
    ) -> Result<(), ApplyError> {
        let _guard = self.write_lock.lock().await;
        let mut records: BTreeMap<ResourceKey, Attributes> = self
            .cache
            .snapshot()
            .await
            .into_iter()
            .map(|resource| (resource.key, resource.attributes))
            .collect();
        merge_record(&mut records, key, attributes, ensure);

        self.persist(&records).await?;
        self.cache.apply(key, attributes, ensure).await
    }
}
