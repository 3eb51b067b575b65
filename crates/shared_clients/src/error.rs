use common::error::DiagnosticMessage;
use thiserror::Error;

/// Transport level failures. Structured errors returned by the ksqlDB server
/// are not errors at this layer, see [`crate::KsqlResponse::Error`].
#[derive(Debug, Error)]
pub enum KsqlClientError {
    #[error("connectivity error: {context}")]
    FailedToConnect { context: DiagnosticMessage },
    #[error("failed to decode response: {context}")]
    Deserialize { context: DiagnosticMessage },
    #[error("unexpected response status {status}: {context}")]
    UnexpectedStatus {
        status: u16,
        context: DiagnosticMessage,
    },
    #[error("invalid url: {context}")]
    InvalidUrl { context: DiagnosticMessage },
}

impl KsqlClientError {
    #[track_caller]
    pub fn failed_to_connect(message: impl Into<String>) -> Self {
        Self::FailedToConnect {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::Deserialize {
            context: DiagnosticMessage::new(message.into()),
        }
    }

    #[track_caller]
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            context: DiagnosticMessage::new(format!("body '{}'", body.into())),
        }
    }

    #[track_caller]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            context: DiagnosticMessage::new(message.into()),
        }
    }
}

impl From<reqwest::Error> for KsqlClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            KsqlClientError::deserialize(err.to_string())
        } else if let Some(status) = err.status() {
            KsqlClientError::unexpected_status(status.as_u16(), err.to_string())
        } else {
            KsqlClientError::failed_to_connect(format!(
                "failed to send ksql request: {err}"
            ))
        }
    }
}

impl From<serde_json::Error> for KsqlClientError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        KsqlClientError::deserialize(err.to_string())
    }
}
