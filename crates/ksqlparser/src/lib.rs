//! Hand written parser for the subset of KSQL the operator manages:
//! `CREATE [OR REPLACE] STREAM|TABLE` and `INSERT INTO ... SELECT`.
//!
//! Parsing is driven by a cursor based [`tokenizer::Tokenizer`] that only
//! recognises the reserved words the caller asks for at each position, so
//! words such as `type` or `order` remain usable as column names.

pub mod ast;
pub mod error;
pub mod keywords;
pub mod parser;
pub mod tokenizer;

pub use ast::{ActionKind, ObjectKind, Statement};
pub use error::ParseError;
pub use parser::Parser;

/// Parses a single statement. Trailing input after the statement is an error.
pub fn parse(sql: &str) -> Result<Statement, ParseError> {
    let mut parser = Parser::new(sql);
    let stmt = parser.parse_statement()?;
    parser.expect_eof()?;
    Ok(stmt)
}

/// Parses every statement in a document, in source order.
pub fn parse_many(sql: &str) -> Result<Vec<Statement>, ParseError> {
    Parser::new(sql).parse_statements()
}
