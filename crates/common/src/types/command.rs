use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle of a single command submitted to the ksqlDB server.
///
/// `Queued`, `Parsing` and `Executing` are transient; the remaining three are
/// terminal and only ever observed by polling the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandState {
    Queued,
    Parsing,
    Executing,
    Terminated,
    Success,
    Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command status '{0}'")]
pub struct UnknownCommandState(pub String);

impl CommandState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandState::Queued => "QUEUED",
            CommandState::Parsing => "PARSING",
            CommandState::Executing => "EXECUTING",
            CommandState::Terminated => "TERMINATED",
            CommandState::Success => "SUCCESS",
            CommandState::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CommandState::Terminated | CommandState::Success | CommandState::Error
        )
    }
}

impl FromStr for CommandState {
    type Err = UnknownCommandState;

    /// Accepts exactly the upper-case names the server reports.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(CommandState::Queued),
            "PARSING" => Ok(CommandState::Parsing),
            "EXECUTING" => Ok(CommandState::Executing),
            "TERMINATED" => Ok(CommandState::Terminated),
            "SUCCESS" => Ok(CommandState::Success),
            "ERROR" => Ok(CommandState::Error),
            other => Err(UnknownCommandState(other.to_string())),
        }
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-statement bookkeeping persisted in the resource status.
///
/// `query_hash` is the hash of the text we last *issued*; `status_hash` is the
/// hash of the text the server last *reported* for the object. Empty strings
/// mean "not yet known".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandStatus {
    #[serde(default)]
    pub command_id: String,
    #[serde(default)]
    pub query_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CommandState>,
    #[serde(default)]
    pub query_hash: String,
    #[serde(default)]
    pub status_hash: String,
}

impl CommandStatus {
    pub fn has_command(&self) -> bool {
        !self.command_id.is_empty()
    }

    pub fn has_query(&self) -> bool {
        !self.query_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_known_states() {
        assert_eq!("EXECUTING".parse::<CommandState>(), Ok(CommandState::Executing));
        assert_eq!("SUCCESS".parse::<CommandState>(), Ok(CommandState::Success));
        assert!("RUNNING".parse::<CommandState>().is_err());
        assert!("success".parse::<CommandState>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!CommandState::Queued.is_terminal());
        assert!(!CommandState::Executing.is_terminal());
        assert!(CommandState::Error.is_terminal());
        assert!(CommandState::Terminated.is_terminal());
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = CommandStatus {
            command_id: "stream/`S`/create".into(),
            query_id: String::new(),
            status: Some(CommandState::Success),
            query_hash: "h".into(),
            status_hash: "s".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["commandId"], "stream/`S`/create");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["queryHash"], "h");
        assert_eq!(json["statusHash"], "s");

        let back: CommandStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }
}
