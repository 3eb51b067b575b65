use super::{write_separated, Conditions, Expr};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AliasedIdent {
    pub name: String,
    pub alias: Option<String>,
}

impl AliasedIdent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }
}

impl fmt::Display for AliasedIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub source: AliasedIdent,
    pub on: Conditions,
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LEFT JOIN {} ON {}", self.source, self.on)
    }
}

fn write_projection(f: &mut fmt::Formatter<'_>, items: &[Expr], from: &AliasedIdent) -> fmt::Result {
    f.write_str("SELECT\n  ")?;
    write_separated(f, items, ",\n  ")?;
    write!(f, "\nFROM {from}")
}

/// Body of `CREATE STREAM ... AS` and `INSERT INTO ...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamSelect {
    pub projection: Vec<Expr>,
    pub from: AliasedIdent,
    pub joins: Vec<Join>,
    pub selection: Conditions,
    pub partition_by: Option<String>,
}

impl StreamSelect {
    /// The FROM source followed by every joined source.
    pub fn sources(&self) -> Vec<&str> {
        std::iter::once(self.from.name.as_str())
            .chain(self.joins.iter().map(|j| j.source.name.as_str()))
            .collect()
    }
}

impl fmt::Display for StreamSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_projection(f, &self.projection, &self.from)?;
        for join in &self.joins {
            write!(f, "\n{join}")?;
        }
        if !self.selection.is_empty() {
            write!(f, "\nWHERE {}", self.selection)?;
        }
        if let Some(partition_by) = &self.partition_by {
            write!(f, "\nPARTITION BY {partition_by}")?;
        }
        Ok(())
    }
}

/// Body of `CREATE TABLE ... AS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableSelect {
    pub projection: Vec<Expr>,
    pub from: AliasedIdent,
    pub window: Option<Window>,
    pub selection: Conditions,
    pub group_by: Vec<Expr>,
    pub having: Conditions,
}

impl TableSelect {
    pub fn sources(&self) -> Vec<&str> {
        vec![self.from.name.as_str()]
    }
}

impl fmt::Display for TableSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_projection(f, &self.projection, &self.from)?;
        if let Some(window) = &self.window {
            write!(f, "\nWINDOW {window}")?;
        }
        if !self.selection.is_empty() {
            write!(f, "\nWHERE {}", self.selection)?;
        }
        if !self.group_by.is_empty() {
            f.write_str("\nGROUP BY ")?;
            write_separated(f, &self.group_by, ", ")?;
        }
        if !self.having.is_empty() {
            write!(f, "\nHAVING {}", self.having)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    Tumbling,
    Hopping,
    Session,
}

impl WindowKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "TUMBLING" => Some(WindowKind::Tumbling),
            "HOPPING" => Some(WindowKind::Hopping),
            "SESSION" => Some(WindowKind::Session),
            _ => None,
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowKind::Tumbling => "TUMBLING",
            WindowKind::Hopping => "HOPPING",
            WindowKind::Session => "SESSION",
        })
    }
}

/// Singular and plural spellings collapse to one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword.trim_end_matches('S') {
            "MILLISECOND" => TimeUnit::Milliseconds,
            "SECOND" => TimeUnit::Seconds,
            "MINUTE" => TimeUnit::Minutes,
            "HOUR" => TimeUnit::Hours,
            "DAY" => TimeUnit::Days,
            _ => return None,
        })
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowDuration {
    pub amount: u64,
    pub unit: TimeUnit,
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Window {
    pub kind: WindowKind,
    pub size: WindowDuration,
    pub advance_by: Option<WindowDuration>,
    pub retention: Option<WindowDuration>,
    pub grace_period: Option<WindowDuration>,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // session windows take a gap, written without SIZE
        match self.kind {
            WindowKind::Session => write!(f, "{} ({}", self.kind, self.size)?,
            _ => write!(f, "{} (SIZE {}", self.kind, self.size)?,
        }
        if let Some(advance_by) = &self.advance_by {
            write!(f, ", ADVANCE BY {advance_by}")?;
        }
        if let Some(retention) = &self.retention {
            write!(f, ", RETENTION {retention}")?;
        }
        if let Some(grace_period) = &self.grace_period {
            write!(f, ", GRACE PERIOD {grace_period}")?;
        }
        f.write_str(")")
    }
}
