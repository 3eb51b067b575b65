//! Keeps the in-memory resource store in line with the manifests directory.

use common::config::{load_manifests, ConfigError};
use common::types::ResourceKey;
use engine::{Controller, MemoryResourceStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct ManifestWatcher {
    dir: PathBuf,
    store: Arc<MemoryResourceStore>,
}

impl ManifestWatcher {
    pub fn new(dir: PathBuf, store: Arc<MemoryResourceStore>) -> Self {
        Self { dir, store }
    }

    /// Loads every manifest once and returns the keys that need a pass:
    /// resources that are new or changed, and resources whose file is gone.
    pub fn sync_once(&self) -> Result<Vec<ResourceKey>, ConfigError> {
        let manifests = load_manifests(&self.dir)?;
        let on_disk: HashSet<ResourceKey> = manifests.iter().map(|m| m.key()).collect();

        let mut changed = Vec::new();
        for resource in manifests {
            let key = resource.key();
            if self.store.upsert(resource) {
                debug!(%key, "manifest changed");
                changed.push(key);
            }
        }
        for key in self.store.keys() {
            if !on_disk.contains(&key) {
                info!(%key, "manifest removed");
                self.store.remove(&key);
                changed.push(key);
            }
        }
        Ok(changed)
    }

    /// Resyncs every `every` until `stop` flips to true. Every resource is
    /// enqueued on each tick so live drift is picked up even when nothing
    /// changed on disk.
    pub async fn run(
        self,
        controller: Arc<Controller>,
        every: Duration,
        mut stop: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sync_once() {
                        Ok(changed) => {
                            let mut keys: HashSet<ResourceKey> = self.store.keys().into_iter().collect();
                            keys.extend(changed);
                            debug!(resources = keys.len(), "resync");
                            for key in keys {
                                controller.enqueue(key);
                            }
                        }
                        Err(e) => error!(dir = %self.dir.display(), "failed to load manifests: {e}"),
                    }
                }
                res = stop.changed() => {
                    if res.is_err() || *stop.borrow() {
                        info!("manifest watcher stopped");
                        return;
                    }
                }
            }
        }
    }
}
