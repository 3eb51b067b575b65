use crate::error::DagError;
use ksqlparser::Statement;
use std::fmt::{Display, Formatter};

/// Edges carry no data; `a -> b` means `b` reads from `a`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyEdge;

impl Display for EmptyEdge {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DagNode {
    /// Declared name, as written.
    pub name: String,
    /// Upper-cased name used for matching and ordering.
    pub key: String,
    pub statement: Statement,
}

impl DagNode {
    pub fn new(statement: Statement) -> Self {
        let name = statement.name().into_owned();
        Self {
            key: name.to_uppercase(),
            name,
            statement,
        }
    }
}

pub type DagResult<T> = Result<T, DagError>;
