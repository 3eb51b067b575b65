use crate::commands::read_statements;
use crate::error::CliError;
use clap::Args;
use common::config::{read_config, OperatorConfig};
use common::types::{ManagedKsql, ManagedKsqlStatus, ResourceKey};
use engine::{Controller, MemoryResourceStore, ResourceStore};
use shared_clients::{KsqlApi, KsqlClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// File holding `;`-separated KSQL statements
    pub file: PathBuf,
    #[arg(long, default_value = "default")]
    pub namespace: String,
    /// Resource name, defaults to the file stem
    #[arg(long)]
    pub name: Option<String>,
}

impl ApplyArgs {
    fn key(&self) -> ResourceKey {
        let name = self.name.clone().unwrap_or_else(|| {
            self.file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "statements".to_string())
        });
        ResourceKey::new(&self.namespace, name)
    }
}

/// One reconcile pass of a statement file, without a queue or retries. The
/// resulting status is printed as JSON, also when the pass fails.
pub fn handle_apply(args: &ApplyArgs, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let cfg = read_config(config_path)?;
    let statement = read_statements(&args.file)?;
    let client: Arc<dyn KsqlApi> = Arc::new(KsqlClient::from_config(&cfg.ksql)?);
    let resource = ManagedKsql::new(args.key(), 1, statement);

    let rt = Runtime::new()?;
    let (status, result) = rt.block_on(apply_once(client, &cfg, resource));

    println!("{}", serde_json::to_string_pretty(&status)?);
    result
}

pub(crate) async fn apply_once(
    client: Arc<dyn KsqlApi>,
    cfg: &OperatorConfig,
    resource: ManagedKsql,
) -> (ManagedKsqlStatus, Result<(), CliError>) {
    let key = resource.key();
    let store = Arc::new(MemoryResourceStore::new());
    store.upsert(resource);
    let controller = Controller::new(client, store.clone(), cfg);

    let result = controller.reconcile(&key).await.map_err(CliError::from);
    let status = match store.get(&key) {
        Ok(Some(r)) => r.status,
        _ => ManagedKsqlStatus::default(),
    };
    (status, result)
}
