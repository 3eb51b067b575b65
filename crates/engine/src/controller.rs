use crate::cache::StateCache;
use crate::error::{tolerate_not_found, ReconcileError};
use crate::queue::WorkQueue;
use crate::reconciler::Reconciler;
use crate::store::ResourceStore;
use common::config::OperatorConfig;
use common::types::{ManagedKsqlStatus, ResourceKey, ResourceStatus};
use ksqlparser::{ActionKind, Statement};
use shared_clients::KsqlApi;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub struct Controller {
    reconciler: Reconciler,
    cache: StateCache,
    store: Arc<dyn ResourceStore>,
    queue: Arc<WorkQueue<ResourceKey>>,
}

impl Controller {
    pub fn new(
        client: Arc<dyn KsqlApi>,
        store: Arc<dyn ResourceStore>,
        config: &OperatorConfig,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(client, config.poll.clone()),
            cache: StateCache::new(),
            store,
            queue: Arc::new(WorkQueue::new(config.backoff.clone(), &config.queue)),
        }
    }

    pub fn queue(&self) -> &Arc<WorkQueue<ResourceKey>> {
        &self.queue
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn enqueue(&self, key: ResourceKey) {
        self.queue.add(key);
    }

    /// One reconcile pass for a resource. Safe to repeat.
    ///
    /// Status is written back to the store whenever statement processing
    /// started, whether or not the pass succeeded. Parse and dependency
    /// failures abort before anything is written.
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<(), ReconcileError> {
        let started = Instant::now();
        info!(%key, "reconciling");

        let Some(mut resource) = self.store.get(key)? else {
            self.cleanup_deleted(key).await;
            return Ok(());
        };

        let statements = self.cache.statements_for(&resource)?;
        resource.status.applied = ResourceStatus::Pending;
        let result = self.apply(&statements, &mut resource.status).await;

        if let Err(e) = self.store.update_status(key, &resource.status) {
            error!(%key, "failed to persist status: {e}");
            return result.and(Err(e.into()));
        }
        self.cache.refresh(&resource);

        match &result {
            Ok(()) => info!(%key, elapsed_ms = started.elapsed().as_millis() as u64, "applied"),
            Err(e) => warn!(%key, "reconcile failed: {e}"),
        }
        result
    }

    async fn apply(
        &self,
        statements: &[Statement],
        status: &mut ManagedKsqlStatus,
    ) -> Result<(), ReconcileError> {
        let mut declared = HashSet::new();
        for stmt in statements {
            let name = stmt.name().into_owned();
            let mut item = status.item_status.get(&name).cloned().unwrap_or_default();
            let res = self.reconciler.process(stmt, &mut item).await;
            status.item_status.insert(name.clone(), item);
            declared.insert(name);
            res?;
        }

        let orphans: Vec<String> = status
            .item_status
            .keys()
            .filter(|name| !declared.contains(*name))
            .cloned()
            .collect();
        // a failed orphan keeps its entry so the next pass retries it
        let mut first_failure = None;
        for name in orphans {
            let Some(item) = status.item_status.get(&name) else {
                continue;
            };
            match self.reconciler.drop_orphan(&name, item).await {
                Ok(()) => {
                    status.item_status.remove(&name);
                }
                Err(e) => {
                    error!(%name, "failed to clean up orphaned statement: {e}");
                    first_failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_failure {
            return Err(e);
        }

        status.applied = ResourceStatus::Applied;
        Ok(())
    }

    /// Best effort teardown of everything a deleted resource created. Every
    /// failure is logged and the remaining items are still attempted.
    async fn cleanup_deleted(&self, key: &ResourceKey) {
        let Some(item) = self.cache.get(key) else {
            warn!(%key, "resource has never been seen by this controller, nothing to clean up");
            return;
        };
        info!(%key, "resource deleted, tearing down");

        for (name, status) in &item.resource.status.item_status {
            if !status.has_query() {
                continue;
            }
            info!(%name, query_id = %status.query_id, "terminating");
            if let Err(e) = tolerate_not_found(self.reconciler.terminate(&status.query_id).await) {
                error!(%name, query_id = %status.query_id, "error terminating query: {e}");
            }
        }

        for stmt in item.statements.iter() {
            let (ActionKind::Create | ActionKind::CreateOrReplace, Some(kind)) =
                (stmt.action(), stmt.object_kind())
            else {
                continue;
            };
            let name = stmt.name();
            info!(%kind, %name, "dropping");
            if let Err(e) = tolerate_not_found(self.reconciler.drop_object(kind, &name).await) {
                error!(%kind, %name, "error dropping: {e}");
            }
        }

        self.cache.remove(key);
    }

    /// Runs `workers` workers until `shutdown` resolves, then lets in-flight
    /// passes finish.
    pub async fn run<F>(self: Arc<Self>, workers: usize, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut pool = JoinSet::new();
        for id in 0..workers {
            let controller = Arc::clone(&self);
            pool.spawn(async move { controller.worker(id).await });
        }
        info!(workers, "controller started");

        shutdown.await;
        info!("shutting down workers");
        self.queue.shutdown();
        while let Some(res) = pool.join_next().await {
            if let Err(e) = res {
                error!("worker panicked: {e}");
            }
        }
        info!("controller stopped");
    }

    async fn worker(&self, id: usize) {
        info!(worker = id, "worker started");
        while let Some(key) = self.queue.get().await {
            match self.reconcile(&key).await {
                Ok(()) => self.queue.forget(&key),
                Err(e) => {
                    error!(worker = id, %key, "error syncing, requeueing: {e}");
                    self.queue.add_rate_limited(key.clone());
                }
            }
            self.queue.done(&key);
        }
        info!(worker = id, "worker stopped");
    }
}
