use crate::error::ReconcileError;
use ksqlparser::ObjectKind;

/// A server command id, `kind/`name`/action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRef {
    pub kind: ObjectKind,
    pub name: String,
    pub action: Option<String>,
}

impl CommandRef {
    /// Whether the command created the object it names, as opposed to
    /// starting a query that writes into it.
    pub fn is_create(&self) -> bool {
        self.action
            .as_deref()
            .is_none_or(|a| a.eq_ignore_ascii_case("create"))
    }
}

pub fn parse_command_id(command_id: &str) -> Result<CommandRef, ReconcileError> {
    let invalid = || ReconcileError::InvalidCommandId {
        command_id: command_id.to_string(),
    };
    let mut parts = command_id.splitn(3, '/');
    let kind = parts.next().and_then(ObjectKind::parse).ok_or_else(invalid)?;
    let name = parts
        .next()
        .map(|n| n.trim_matches(|c| c == '`' || c == '"' || c == '\''))
        .filter(|n| !n.is_empty())
        .ok_or_else(invalid)?;
    let action = parts.next().filter(|a| !a.is_empty()).map(str::to_string);
    Ok(CommandRef {
        kind,
        name: name.to_string(),
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_names() {
        let cmd = parse_command_id("stream/`PAGEVIEWS`/create").unwrap();
        assert_eq!(cmd.kind, ObjectKind::Stream);
        assert_eq!(cmd.name, "PAGEVIEWS");
        assert!(cmd.is_create());

        let cmd = parse_command_id("table/\"users\"").unwrap();
        assert_eq!(cmd.kind, ObjectKind::Table);
        assert_eq!(cmd.name, "users");
        assert_eq!(cmd.action, None);
        assert!(cmd.is_create());
    }

    #[test]
    fn insert_commands_are_not_creates() {
        let cmd = parse_command_id("stream/`TARGET`/execute").unwrap();
        assert!(!cmd.is_create());
    }

    #[test]
    fn rejects_malformed_ids() {
        for id in ["", "stream", "stream/``/create", "terminate/CSAS_1/execute", "topic/`T`/create"] {
            assert!(
                matches!(parse_command_id(id), Err(ReconcileError::InvalidCommandId { .. })),
                "{id}"
            );
        }
    }
}
