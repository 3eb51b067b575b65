use std::fmt;
use std::io;

#[derive(Debug)]
pub enum DagError {
    DuplicateNode(String),
    CycleDetected(Vec<String>),
    Incomplete { expected: usize, actual: usize },
    Io(io::Error),
}

impl fmt::Display for DagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DagError::CycleDetected(names) => {
                write!(f, "Found cyclic references between statements:")?;
                for name in names {
                    write!(f, "\n - {name}")?;
                }
                Ok(())
            }
            DagError::DuplicateNode(name) => {
                write!(f, "Found duplicated declaration of statement: {name:?}")
            }
            DagError::Incomplete { expected, actual } => write!(
                f,
                "Dependency ordering resolved {actual} of {expected} statements"
            ),
            DagError::Io(e) => write!(f, "I/O error caused by: {e}"),
        }
    }
}

impl std::error::Error for DagError {}

impl From<io::Error> for DagError {
    fn from(value: io::Error) -> Self {
        DagError::Io(value)
    }
}
