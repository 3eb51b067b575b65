use thiserror::Error;

/// Syntax error with the position the parser gave up at.
///
/// `line` and `col` are 1-based. `context` holds the tail of the text that was
/// successfully consumed, which is usually enough to spot the problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} at line {line} col {col}, near `{context}`")]
pub struct ParseError {
    pub expected: String,
    pub line: usize,
    pub col: usize,
    pub context: String,
}
