pub mod apply;
pub mod graph;
pub mod parse;
pub mod watch;

use crate::error::CliError;
use std::fs;
use std::path::Path;

pub(crate) fn read_statements(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read '{}': {e}", path.display()),
        ))
    })
}
