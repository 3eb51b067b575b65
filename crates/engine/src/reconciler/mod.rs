//! Per statement reconciliation against a ksqlDB server.
//!
//! Every operation mutates the [`CommandStatus`] it is handed in place, even
//! when it ends in an error, so the caller can persist whatever progress was
//! made before retrying.

mod chain;

use crate::error::{tolerate_not_found, ReconcileError};
use common::config::PollConfig;
use common::types::{CommandState, CommandStatus};
use common::utils::content_hash;
use ksqlparser::{ActionKind, ObjectKind, Statement};
use shared_clients::models::DescribeResultItem;
use shared_clients::{KsqlApi, KsqlResponse};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Reconciler {
    client: Arc<dyn KsqlApi>,
    poll: PollConfig,
}

impl Reconciler {
    pub fn new(client: Arc<dyn KsqlApi>, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    pub fn client(&self) -> &Arc<dyn KsqlApi> {
        &self.client
    }

    /// Brings one statement in line with the server.
    pub async fn process(
        &self,
        stmt: &Statement,
        status: &mut CommandStatus,
    ) -> Result<(), ReconcileError> {
        let name = stmt.name();
        let ksql = stmt.to_string();
        let desired = content_hash(&ksql);
        debug!(%name, action = %stmt.action(), "processing statement");

        match (stmt.action(), stmt.object_kind()) {
            (ActionKind::Create, Some(kind)) => {
                if !self.precheck_create(kind, &name, &desired, status).await? {
                    return Ok(());
                }
                self.create_or_replace(&name, &ksql, &desired, status).await
            }
            (ActionKind::CreateOrReplace, Some(_)) => {
                self.create_or_replace(&name, &ksql, &desired, status).await
            }
            (ActionKind::Insert, _) => self.insert(&ksql, &desired, status).await,
            (action, _) => Err(ReconcileError::unsupported(format!(
                "{action} statement '{name}' cannot be applied"
            ))),
        }
    }

    /// Plain CREATE cannot replace an object, so whatever exists under the
    /// name is dropped first unless it was created from this exact text.
    /// Returns `false` when the pass should stop here without error.
    async fn precheck_create(
        &self,
        kind: ObjectKind,
        name: &str,
        desired: &str,
        status: &mut CommandStatus,
    ) -> Result<bool, ReconcileError> {
        let mut absent = false;
        if !status.has_command() {
            match self.client.describe(name).await? {
                KsqlResponse::Error(e) if e.is_not_found() => {
                    debug!(%name, "object does not exist yet");
                    absent = true;
                }
                KsqlResponse::Error(e) => {
                    return Err(ReconcileError::remote(e, format!("describing {name}")));
                }
                KsqlResponse::Success(items) => {
                    let Some(item) = single_description(name, &items) else {
                        return Ok(false);
                    };
                    status.status_hash = content_hash(&item.source_description.statement);
                    status.query_hash.clear();
                }
            }
        }

        if !absent && status.query_hash != desired {
            info!(%kind, %name, "statement changed since last applied, dropping");
            status.command_id.clear();
            tolerate_not_found(self.drop_object(kind, name).await)?;
        }
        Ok(true)
    }

    async fn create_or_replace(
        &self,
        name: &str,
        ksql: &str,
        desired: &str,
        status: &mut CommandStatus,
    ) -> Result<(), ReconcileError> {
        if !status.has_command() || status.query_hash != desired {
            info!(%name, "issuing create");
            return self.submit(ksql, desired, status).await;
        }

        let command_id = status.command_id.clone();
        match self.client.status(&command_id).await? {
            KsqlResponse::Error(e) if e.error_code == 404 => {
                status.command_id.clear();
                return Err(ReconcileError::CommandNotFound { command_id });
            }
            KsqlResponse::Error(e) => warn!(%name, %command_id, "status lookup failed: {e}"),
            KsqlResponse::Success(resp) => {
                status.status = Some(resp.status.parse::<CommandState>()?);
            }
        }

        match self.client.describe(name).await? {
            KsqlResponse::Error(e) => error!(%name, "describe failed: {e}"),
            KsqlResponse::Success(items) => {
                if let Some(item) = single_description(name, &items) {
                    if content_hash(&item.source_description.statement) != status.status_hash {
                        info!(%name, "live definition drifted, forcing re-creation");
                        status.command_id.clear();
                    }
                }
            }
        }
        Ok(())
    }

    async fn insert(
        &self,
        ksql: &str,
        desired: &str,
        status: &mut CommandStatus,
    ) -> Result<(), ReconcileError> {
        if !status.has_query() {
            info!("issuing insert");
            self.submit(ksql, desired, status).await?;
        }

        let query_id = status.query_id.clone();
        let items = match self.client.explain(&query_id).await? {
            KsqlResponse::Error(e) if e.is_not_found() => {
                status.query_id.clear();
                return Err(ReconcileError::QueryNotFound { query_id });
            }
            KsqlResponse::Error(e) => {
                error!(%query_id, "explain failed: {e}");
                return Ok(());
            }
            KsqlResponse::Success(items) => items,
        };
        let [item] = items.as_slice() else {
            error!(%query_id, "{}", ReconcileError::unexpected_shape("explain", items.len()));
            return Ok(());
        };

        let description = &item.query_description;
        let live_hash = content_hash(&description.statement_text);
        match description.state.as_deref().map(str::parse::<CommandState>) {
            Some(Ok(state)) => status.status = Some(state),
            Some(Err(e)) => debug!(%query_id, "{e}, keeping last known status"),
            None => {}
        }

        let mut terminate = false;
        if status.status_hash != live_hash {
            info!(%query_id, "query statement differs from what was last seen");
            terminate = true;
        }
        if status.query_hash != desired {
            info!(%query_id, "query has been modified since last issue");
            terminate = true;
        }
        if !terminate {
            return Ok(());
        }

        info!(%query_id, "terminating");
        match self.terminate(&query_id).await {
            Err(e) if e.is_not_found() => status.query_id.clear(),
            other => other?,
        }
        info!("re-issuing insert");
        self.submit(ksql, desired, status).await
    }

    /// Runs a CREATE or INSERT and records the identifiers the server hands
    /// back.
    async fn submit(
        &self,
        ksql: &str,
        desired: &str,
        status: &mut CommandStatus,
    ) -> Result<(), ReconcileError> {
        let items = match self.client.create_drop_terminate(ksql).await? {
            KsqlResponse::Error(e) => {
                status.status = Some(CommandState::Error);
                return Err(ReconcileError::remote(e, "applying statement"));
            }
            KsqlResponse::Success(items) => items,
        };
        let [item] = items.as_slice() else {
            return Err(ReconcileError::unexpected_shape("command", items.len()));
        };

        status.status = Some(item.command_status.status.parse::<CommandState>()?);
        status.command_id = item.command_id.clone();
        status.query_id = item.command_status.query_id.clone().unwrap_or_default();
        status.status_hash = content_hash(&item.statement_text);
        status.query_hash = desired.to_string();
        info!(
            command_id = %status.command_id,
            query_id = %status.query_id,
            "statement accepted"
        );
        Ok(())
    }
}

/// The single describe item, or `None` after logging a response that cannot
/// be acted on.
fn single_description<'a>(
    name: &str,
    items: &'a [DescribeResultItem],
) -> Option<&'a DescribeResultItem> {
    match items {
        [item] => Some(item),
        _ => {
            error!(%name, "{}", ReconcileError::unexpected_shape("describe", items.len()));
            None
        }
    }
}
