use common::error::DiagnosticMessage;
use common::types::UnknownCommandState;
use dag::DagError;
use ksqlparser::ParseError;
use shared_clients::models::KsqlErrorBody;
use shared_clients::KsqlClientError;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to parse statements: {0}")]
    Parse(#[from] ParseError),
    /// Any failure to order the statements, a true cycle included.
    #[error("failed to resolve statement dependencies: {0}")]
    DependencyCycle(#[from] DagError),
    /// The object or query is already absent. Swallowed during teardown.
    #[error("not found: {context}")]
    NotFound { context: DiagnosticMessage },
    #[error("unexpected response shape: {context}")]
    UnexpectedResponseShape { context: DiagnosticMessage },
    #[error("error response from ksql: {body} ({context})")]
    RemoteApplication {
        body: KsqlErrorBody,
        context: DiagnosticMessage,
    },
    #[error("status of command {command_id} was not resolved in {attempts} attempts")]
    PollTimeout { command_id: String, attempts: u32 },
    #[error("unsupported statement: {context}")]
    UnsupportedStatementKind { context: DiagnosticMessage },
    #[error("command {command_id} was terminated")]
    CommandTerminated { command_id: String },
    #[error("command {command_id} errored with message: {message}")]
    CommandErrored { command_id: String, message: String },
    #[error("command {command_id} was not found")]
    CommandNotFound { command_id: String },
    #[error("query {query_id} was not found")]
    QueryNotFound { query_id: String },
    #[error("command id '{command_id}' was not in the expected format")]
    InvalidCommandId { command_id: String },
    #[error(transparent)]
    UnknownCommandStatus(#[from] UnknownCommandState),
    #[error("ksql client error: {0}")]
    Client(#[from] KsqlClientError),
    #[error("resource store error: {0}")]
    Store(#[from] StoreError),
}

impl ReconcileError {
    #[track_caller]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound {
            context: DiagnosticMessage::new(what.into()),
        }
    }

    #[track_caller]
    pub fn unexpected_shape(expected: &str, actual: usize) -> Self {
        Self::UnexpectedResponseShape {
            context: DiagnosticMessage::new(format!(
                "expected exactly one {expected} item but got {actual}"
            )),
        }
    }

    #[track_caller]
    pub fn remote(body: KsqlErrorBody, action: impl Into<String>) -> Self {
        Self::RemoteApplication {
            body,
            context: DiagnosticMessage::new(action.into()),
        }
    }

    #[track_caller]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedStatementKind {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound { .. })
    }
}

/// Treats [`ReconcileError::NotFound`] as success.
pub(crate) fn tolerate_not_found(res: Result<(), ReconcileError>) -> Result<(), ReconcileError> {
    match res {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_renders_body_and_call_site() {
        let err = ReconcileError::remote(KsqlErrorBody::new(40002, "boom"), "dropping stream S");
        let rendered = err.to_string();
        assert!(rendered.starts_with("error response from ksql: (40002) boom (dropping stream S (at "));
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_is_tolerated() {
        assert!(tolerate_not_found(Err(ReconcileError::not_found("stream S"))).is_ok());
        assert!(tolerate_not_found(Err(ReconcileError::QueryNotFound {
            query_id: "Q".into()
        }))
        .is_err());
    }
}
