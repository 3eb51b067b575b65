use super::Reconciler;
use crate::command_id::parse_command_id;
use crate::error::{tolerate_not_found, ReconcileError};
use common::types::{CommandState, CommandStatus};
use ksqlparser::ObjectKind;
use shared_clients::KsqlResponse;
use tracing::{debug, error, info, warn};

impl Reconciler {
    /// Terminates a running query and waits for the command to settle.
    /// An unknown query id is [`ReconcileError::NotFound`].
    pub async fn terminate(&self, query_id: &str) -> Result<(), ReconcileError> {
        let ksql = format!("TERMINATE {query_id};");
        let items = match self.client.create_drop_terminate(&ksql).await? {
            KsqlResponse::Error(e) if e.is_not_found() => {
                return Err(ReconcileError::not_found(format!("query {query_id}")));
            }
            KsqlResponse::Error(e) => {
                return Err(ReconcileError::remote(e, format!("terminating {query_id}")));
            }
            KsqlResponse::Success(items) => items,
        };
        let [item] = items.as_slice() else {
            return Err(ReconcileError::unexpected_shape("terminate", items.len()));
        };
        info!(%query_id, command_id = %item.command_id, "terminated query");
        self.wait_for_success(&item.command_id).await
    }

    /// Drops an object after terminating every query writing into or reading
    /// from it. A missing object is [`ReconcileError::NotFound`].
    pub async fn drop_object(&self, kind: ObjectKind, name: &str) -> Result<(), ReconcileError> {
        let items = match self.client.describe(name).await? {
            KsqlResponse::Error(e) if e.is_not_found() => {
                return Err(ReconcileError::not_found(format!("{kind} {name}")));
            }
            KsqlResponse::Error(e) => {
                return Err(ReconcileError::remote(e, format!("describing {kind} {name}")));
            }
            KsqlResponse::Success(items) => items,
        };
        let [item] = items.as_slice() else {
            return Err(ReconcileError::unexpected_shape("describe", items.len()));
        };

        for query_id in item.source_description.query_ids() {
            tolerate_not_found(self.terminate(query_id).await)?;
        }

        let ksql = format!("DROP {kind} {name};");
        let items = match self.client.create_drop_terminate(&ksql).await? {
            KsqlResponse::Error(e) => {
                return Err(ReconcileError::remote(e, format!("dropping {kind} {name}")));
            }
            KsqlResponse::Success(items) => items,
        };
        let [item] = items.as_slice() else {
            return Err(ReconcileError::unexpected_shape("drop", items.len()));
        };

        info!(%kind, %name, command_id = %item.command_id, "dropped");
        match item.command_status.status.parse::<CommandState>()? {
            CommandState::Queued | CommandState::Parsing | CommandState::Executing => {
                self.wait_for_success(&item.command_id).await
            }
            CommandState::Success => Ok(()),
            CommandState::Terminated => Err(ReconcileError::CommandTerminated {
                command_id: item.command_id.clone(),
            }),
            CommandState::Error => Err(ReconcileError::CommandErrored {
                command_id: item.command_id.clone(),
                message: item.command_status.message.clone(),
            }),
        }
    }

    /// Polls a command until it reaches a terminal state. Attempt `n` (from
    /// zero) is preceded by a wait of `n` poll intervals.
    pub async fn wait_for_success(&self, command_id: &str) -> Result<(), ReconcileError> {
        let attempts = self.poll.attempts;
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.poll.interval() * attempt).await;
            }
            debug!(%command_id, attempt, "polling command status");
            let resp = match self.client.status(command_id).await? {
                KsqlResponse::Error(e) if e.error_code == 404 => {
                    return Err(ReconcileError::CommandNotFound {
                        command_id: command_id.to_string(),
                    });
                }
                KsqlResponse::Error(e) => {
                    warn!(%command_id, "status lookup failed: {e}");
                    continue;
                }
                KsqlResponse::Success(resp) => resp,
            };
            match resp.status.parse::<CommandState>()? {
                CommandState::Queued | CommandState::Parsing | CommandState::Executing => {}
                CommandState::Success => return Ok(()),
                CommandState::Terminated => {
                    return Err(ReconcileError::CommandTerminated {
                        command_id: command_id.to_string(),
                    })
                }
                CommandState::Error => {
                    return Err(ReconcileError::CommandErrored {
                        command_id: command_id.to_string(),
                        message: resp.message,
                    })
                }
            }
        }
        Err(ReconcileError::PollTimeout {
            command_id: command_id.to_string(),
            attempts,
        })
    }

    /// Tears down whatever a statement that is no longer declared left behind.
    /// Entries that carry no usable identifier are logged and skipped.
    pub async fn drop_orphan(
        &self,
        name: &str,
        status: &CommandStatus,
    ) -> Result<(), ReconcileError> {
        if !status.has_command() {
            warn!(%name, "ignoring statement no longer declared: no command id recorded");
            return Ok(());
        }
        let command = match parse_command_id(&status.command_id) {
            Ok(command) => command,
            Err(e) => {
                error!(%name, "{e}");
                return Ok(());
            }
        };

        if command.is_create() {
            info!(%name, kind = %command.kind, object = %command.name, "dropping orphaned object");
            tolerate_not_found(self.drop_object(command.kind, &command.name).await)
        } else if status.has_query() {
            info!(%name, query_id = %status.query_id, "terminating orphaned query");
            tolerate_not_found(self.terminate(&status.query_id).await)
        } else {
            warn!(%name, command_id = %status.command_id, "ignoring orphan without a query id");
            Ok(())
        }
    }
}
