use crate::commands::read_statements;
use crate::error::CliError;
use clap::Args;
use ksqlparser::parse_many;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// File holding `;`-separated KSQL statements
    pub file: PathBuf,
    /// Keep file order instead of dependency order
    #[arg(long)]
    pub unordered: bool,
}

pub fn handle_parse(args: &ParseArgs) -> Result<(), CliError> {
    let sql = read_statements(&args.file)?;
    let stdout = io::stdout();
    render(&sql, !args.unordered, &mut stdout.lock())
}

/// Writes every statement in canonical form, each preceded by a comment
/// naming it and its action.
fn render(sql: &str, ordered: bool, out: &mut impl Write) -> Result<(), CliError> {
    let mut statements = parse_many(sql)?;
    if ordered {
        statements = dag::resolve_order(statements)?;
    }
    for stmt in &statements {
        writeln!(out, "-- {} ({})", stmt.name(), stmt.action())?;
        writeln!(out, "{stmt}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "
        CREATE OR REPLACE STREAM T AS SELECT a FROM S EMIT CHANGES;
        CREATE STREAM S (a STRING) WITH (KAFKA_TOPIC='s', VALUE_FORMAT='JSON');
    ";

    fn rendered(ordered: bool) -> String {
        let mut out = Vec::new();
        render(SQL, ordered, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_in_dependency_order() {
        let text = rendered(true);
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("--")).collect();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("-- S "));
        assert!(headers[1].starts_with("-- T "));
    }

    #[test]
    fn unordered_keeps_file_order() {
        let text = rendered(false);
        assert!(text.starts_with("-- T "));
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        let mut out = Vec::new();
        let err = render("CREATE STREAM;", true, &mut out).unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
        assert!(out.is_empty());
    }
}
