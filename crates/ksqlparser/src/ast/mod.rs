mod expr;
mod query;
mod statement;
mod types;

pub use expr::{ArithmeticOp, ComparisonOp, Condition, Conditions, Conjunction, Expr};
pub use query::{
    AliasedIdent, Join, StreamSelect, TableSelect, TimeUnit, Window, WindowDuration, WindowKind,
};
pub use statement::{
    ActionKind, ColumnDef, ColumnKey, CreateStatement, CreateStream, CreateTable, InsertInto,
    ObjectKind, Statement, ValueFormat, WithProperties,
};
pub use types::DataType;

use std::fmt;

/// Writes `items` separated by `sep`.
pub(crate) fn write_separated<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    sep: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
