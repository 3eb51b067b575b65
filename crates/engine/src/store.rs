//! Where declared resources live and where the reconciler writes status back.

use common::types::{ManagedKsql, ManagedKsqlStatus, ResourceKey};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource {0} does not exist")]
    Missing(ResourceKey),
}

pub trait ResourceStore: Send + Sync {
    /// `None` once the resource has been deleted.
    fn get(&self, key: &ResourceKey) -> Result<Option<ManagedKsql>, StoreError>;
    fn update_status(&self, key: &ResourceKey, status: &ManagedKsqlStatus)
        -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<ManagedKsql>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    inner: RwLock<BTreeMap<ResourceKey, ManagedKsql>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the declared part of a resource. The status already
    /// held for the key is kept; the version is bumped whenever the statement
    /// text changes without the caller advancing it. Returns whether anything
    /// the reconciler cares about changed.
    pub fn upsert(&self, mut resource: ManagedKsql) -> bool {
        let key = resource.key();
        let mut g = self.inner.write();
        match g.get_mut(&key) {
            Some(existing) => {
                let text_changed = existing.statement != resource.statement;
                if !text_changed && resource.resource_version <= existing.resource_version {
                    return false;
                }
                if resource.resource_version <= existing.resource_version {
                    resource.resource_version = existing.resource_version + 1;
                }
                existing.resource_version = resource.resource_version;
                existing.statement = resource.statement;
                true
            }
            None => {
                g.insert(key, resource);
                true
            }
        }
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<ManagedKsql> {
        self.inner.write().remove(key)
    }

    pub fn keys(&self) -> Vec<ResourceKey> {
        self.inner.read().keys().cloned().collect()
    }
}

impl ResourceStore for MemoryResourceStore {
    fn get(&self, key: &ResourceKey) -> Result<Option<ManagedKsql>, StoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn update_status(
        &self,
        key: &ResourceKey,
        status: &ManagedKsqlStatus,
    ) -> Result<(), StoreError> {
        let mut g = self.inner.write();
        let resource = g.get_mut(key).ok_or_else(|| StoreError::Missing(key.clone()))?;
        resource.status = status.clone();
        Ok(())
    }

    fn list(&self) -> Result<Vec<ManagedKsql>, StoreError> {
        Ok(self.inner.read().values().cloned().collect())
    }
}
