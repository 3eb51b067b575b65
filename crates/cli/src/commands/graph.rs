use crate::commands::read_statements;
use crate::error::CliError;
use clap::Args;
use dag::StatementDag;
use ksqlparser::parse_many;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// File holding `;`-separated KSQL statements
    pub file: PathBuf,
    /// Write the DOT output here instead of stdout
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

pub fn handle_graph(args: &GraphArgs) -> Result<(), CliError> {
    let sql = read_statements(&args.file)?;
    let dag = StatementDag::build(parse_many(&sql)?)?;
    // refuse to render a graph that cannot be applied
    dag.toposort()?;

    match &args.out {
        Some(path) => {
            dag.export_dot_to(path)?;
            info!(path = %path.display(), nodes = dag.len(), "graph written");
        }
        None => println!("{}", dag.to_dot_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn writes_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pipeline.ksql");
        fs::write(
            &file,
            "CREATE STREAM S (a STRING);\nCREATE STREAM T AS SELECT a FROM S EMIT CHANGES;\n",
        )
        .unwrap();
        let out = dir.path().join("pipeline.dot");

        handle_graph(&GraphArgs {
            file,
            out: Some(out.clone()),
        })
        .unwrap();

        let dot = fs::read_to_string(out).unwrap();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("->"));
    }

    #[test]
    fn cycles_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("cycle.ksql");
        fs::write(
            &file,
            "CREATE STREAM A AS SELECT x FROM B EMIT CHANGES;\nCREATE STREAM B AS SELECT x FROM A EMIT CHANGES;\n",
        )
        .unwrap();

        let err = handle_graph(&GraphArgs { file, out: None }).unwrap_err();
        assert!(matches!(err, CliError::Graph(dag::DagError::CycleDetected(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = handle_graph(&GraphArgs {
            file: PathBuf::from("/nonexistent/x.ksql"),
            out: None,
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
