mod commands;
mod error;
mod watcher;

use crate::commands::apply::{handle_apply, ApplyArgs};
use crate::commands::graph::{handle_graph, GraphArgs};
use crate::commands::parse::{handle_parse, ParseArgs};
use crate::commands::watch::handle_watch;
use crate::error::CliError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ksqlop", about = "Reconciles declared KSQL statements against ksqlDB")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "path to ksql-operator.yml or the directory holding it",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Parse a statement file and print it in apply order
    Parse(ParseArgs),
    /// Print the dependency graph of a statement file as DOT
    Graph(GraphArgs),
    /// Run a single reconcile pass for a statement file
    Apply(ApplyArgs),
    /// Watch the manifests directory and keep ksqlDB in sync with it
    Watch,
}

fn run_cmd(func: Result<(), CliError>) {
    if let Err(e) = func {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Cmd::Parse(args) => run_cmd(handle_parse(&args)),
        Cmd::Graph(args) => run_cmd(handle_graph(&args)),
        Cmd::Apply(args) => run_cmd(handle_apply(&args, cli.config_path)),
        Cmd::Watch => run_cmd(handle_watch(cli.config_path)),
    }
}
