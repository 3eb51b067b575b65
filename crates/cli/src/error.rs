use common::config::ConfigError;
use dag::DagError;
use engine::{ReconcileError, StoreError};
use ksqlparser::ParseError;
use shared_clients::KsqlClientError;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Parse(ParseError),
    Graph(DagError),
    Client(KsqlClientError),
    Reconcile(ReconcileError),
    Io(std::io::Error),
    Output(serde_json::Error),
    Usage(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "configuration failed: {e}"),
            CliError::Parse(e) => write!(f, "parse failed: {e}"),
            CliError::Graph(e) => write!(f, "dependency resolution failed: {e}"),
            CliError::Client(e) => write!(f, "ksql client failed: {e}"),
            CliError::Reconcile(e) => write!(f, "reconcile failed: {e}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Output(e) => write!(f, "failed to render output: {e}"),
            CliError::Usage(msg) => f.write_str(msg),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Parse(e) => Some(e),
            CliError::Graph(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Reconcile(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<DagError> for CliError {
    fn from(e: DagError) -> Self {
        Self::Graph(e)
    }
}

impl From<KsqlClientError> for CliError {
    fn from(e: KsqlClientError) -> Self {
        Self::Client(e)
    }
}

impl From<ReconcileError> for CliError {
    fn from(e: ReconcileError) -> Self {
        Self::Reconcile(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::Reconcile(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Output(e)
    }
}
