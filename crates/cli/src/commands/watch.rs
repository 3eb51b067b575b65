use crate::error::CliError;
use crate::watcher::ManifestWatcher;
use common::config::read_config;
use engine::{Controller, MemoryResourceStore};
use shared_clients::{KsqlApi, KsqlClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::{error, info};

/// Long running mode: the manifests directory is the declared state, a pool
/// of workers reconciles it until Ctrl-C.
pub fn handle_watch(config_path: Option<PathBuf>) -> Result<(), CliError> {
    let cfg = read_config(config_path)?;
    let client: Arc<dyn KsqlApi> = Arc::new(KsqlClient::from_config(&cfg.ksql)?);
    let store = Arc::new(MemoryResourceStore::new());
    let controller = Arc::new(Controller::new(client, store.clone(), &cfg));
    let watcher = ManifestWatcher::new(cfg.manifests_dir.clone(), store);

    // fail fast on a broken manifests dir instead of logging it every tick
    let initial = watcher.sync_once()?;
    info!(
        dir = %cfg.manifests_dir.display(),
        resources = initial.len(),
        ksql = %cfg.ksql.url,
        "starting operator"
    );

    let rt = Runtime::new()?;
    rt.block_on(async move {
        let (stop_tx, stop_rx) = watch::channel(false);
        let every = cfg.resync_interval().max(std::time::Duration::from_secs(1));
        let watch_task = tokio::spawn(watcher.run(controller.clone(), every, stop_rx));

        controller
            .run(cfg.workers, async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for shutdown signal: {e}");
                }
                info!("shutdown requested");
                let _ = stop_tx.send(true);
            })
            .await;

        if let Err(e) = watch_task.await {
            error!("manifest watcher panicked: {e}");
        }
    });
    Ok(())
}
