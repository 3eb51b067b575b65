use super::{write_separated, DataType};
use std::fmt;

/// Expression tree. Nodes have no identity beyond structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Identifier, number, `*`, `null` or a quoted string (quotes kept).
    Literal(String),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        data_type: DataType,
    },
    CaseWhen {
        conditions: Conditions,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    /// Binary arithmetic. The right operand holds everything after the
    /// operator, so `a - b - c` is `a - (b - c)`.
    BinaryOp {
        left: Box<Expr>,
        op: ArithmeticOp,
        right: Box<Expr>,
    },
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    Aliased {
        expr: Box<Expr>,
        alias: String,
    },
}

impl Expr {
    pub fn literal(s: impl Into<String>) -> Self {
        Expr::Literal(s.into())
    }

    pub fn aliased(self, alias: impl Into<String>) -> Self {
        Expr::Aliased {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(s) => f.write_str(s),
            Expr::Function { name, args } => {
                write!(f, "{name}(")?;
                write_separated(f, args, ", ")?;
                f.write_str(")")
            }
            Expr::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Expr::CaseWhen {
                conditions,
                then,
                otherwise,
            } => {
                write!(f, "CASE WHEN {conditions} THEN {then}")?;
                if let Some(otherwise) = otherwise {
                    write!(f, " ELSE {otherwise}")?;
                }
                f.write_str(" END")
            }
            Expr::BinaryOp { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::Index { expr, index } => write!(f, "{expr}[{index}]"),
            Expr::Aliased { expr, alias } => write!(f, "{expr} AS {alias}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "+" => Some(ArithmeticOp::Plus),
            "-" => Some(ArithmeticOp::Minus),
            "*" => Some(ArithmeticOp::Multiply),
            "/" => Some(ArithmeticOp::Divide),
            _ => None,
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOp::Plus => "+",
            ArithmeticOp::Minus => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    /// `<>`, kept apart from `!=` so the text survives a round trip.
    Diamond,
    Gt,
    Lt,
    GtEq,
    LtEq,
    Like,
    Is,
    IsNot,
}

impl ComparisonOp {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "=" => ComparisonOp::Eq,
            "!=" => ComparisonOp::NotEq,
            "<>" => ComparisonOp::Diamond,
            ">" => ComparisonOp::Gt,
            "<" => ComparisonOp::Lt,
            ">=" => ComparisonOp::GtEq,
            "<=" => ComparisonOp::LtEq,
            "LIKE" => ComparisonOp::Like,
            "IS" => ComparisonOp::Is,
            "IS NOT" => ComparisonOp::IsNot,
            _ => return None,
        })
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Diamond => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::GtEq => ">=",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Like => "LIKE",
            ComparisonOp::Is => "IS",
            ComparisonOp::IsNot => "IS NOT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    And,
    Or,
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        })
    }
}

/// One comparison, annotated with the conjunction linking it to the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub left: Expr,
    pub op: ComparisonOp,
    pub right: Expr,
    pub conjunction: Option<Conjunction>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)?;
        if let Some(conjunction) = self.conjunction {
            write!(f, " {conjunction}")?;
        }
        Ok(())
    }
}

/// Flat sequence of conditions; grouping is positional, not a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Conditions(pub Vec<Condition>);

impl Conditions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_separated(f, &self.0, " ")
    }
}
