use super::{DataType, StreamSelect, TableSelect};
use common::utils::content_hash;
use std::borrow::Cow;
use std::fmt;

/// What applying a statement asks the server to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    CreateOrReplace,
    /// Bare `REPLACE`; parsed but never applied.
    Replace,
    Insert,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Create => "CREATE",
            ActionKind::CreateOrReplace => "CREATE OR REPLACE",
            ActionKind::Replace => "REPLACE",
            ActionKind::Insert => "INSERT INTO",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Stream,
    Table,
}

impl ObjectKind {
    /// Accepts the lower case form used in server command ids.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("stream") {
            Some(ObjectKind::Stream)
        } else if s.eq_ignore_ascii_case("table") {
            Some(ObjectKind::Table)
        } else {
            None
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Stream => "STREAM",
            ObjectKind::Table => "TABLE",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Key,
    PrimaryKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub key: Option<ColumnKey>,
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.data_type)?;
        match self.key {
            Some(ColumnKey::Key) => f.write_str(" KEY"),
            Some(ColumnKey::PrimaryKey) => f.write_str(" PRIMARY KEY"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    Avro,
    Json,
    Delimited,
    Protobuf,
    Kafka,
}

impl ValueFormat {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "'AVRO'" => ValueFormat::Avro,
            "'JSON'" => ValueFormat::Json,
            "'DELIMITED'" => ValueFormat::Delimited,
            "'PROTOBUF'" => ValueFormat::Protobuf,
            "'KAFKA'" => ValueFormat::Kafka,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueFormat::Avro => "'AVRO'",
            ValueFormat::Json => "'JSON'",
            ValueFormat::Delimited => "'DELIMITED'",
            ValueFormat::Protobuf => "'PROTOBUF'",
            ValueFormat::Kafka => "'KAFKA'",
        })
    }
}

/// `WITH (...)` properties. String values keep their quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WithProperties {
    pub kafka_topic: Option<String>,
    pub value_format: Option<ValueFormat>,
    pub key: Option<String>,
    pub timestamp: Option<String>,
    pub partitions: Option<u32>,
    pub replicas: Option<u32>,
}

impl fmt::Display for WithProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut props: Vec<String> = Vec::new();
        if let Some(topic) = &self.kafka_topic {
            props.push(format!("KAFKA_TOPIC={topic}"));
        }
        if let Some(format) = &self.value_format {
            props.push(format!("VALUE_FORMAT={format}"));
        }
        if let Some(key) = &self.key {
            props.push(format!("KEY={key}"));
        }
        if let Some(timestamp) = &self.timestamp {
            props.push(format!("TIMESTAMP={timestamp}"));
        }
        if let Some(partitions) = self.partitions {
            props.push(format!("PARTITIONS={partitions}"));
        }
        if let Some(replicas) = self.replicas {
            props.push(format!("REPLICAS={replicas}"));
        }
        write!(f, "({})", props.join(", "))
    }
}

/// `CREATE [OR REPLACE] STREAM|TABLE`, generic over the SELECT flavour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateStatement<Q> {
    pub action: ActionKind,
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub with: Option<WithProperties>,
    pub query: Option<Q>,
    pub emit_changes: bool,
}

pub type CreateStream = CreateStatement<StreamSelect>;
pub type CreateTable = CreateStatement<TableSelect>;

impl<Q: fmt::Display> CreateStatement<Q> {
    fn write(&self, f: &mut fmt::Formatter<'_>, kind: ObjectKind) -> fmt::Result {
        write!(f, "{} {kind} {}", self.action, self.name)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            for (i, column) in self.columns.iter().enumerate() {
                let sep = if i == 0 { "\n  " } else { ",\n  " };
                write!(f, "{sep}{column}")?;
            }
            f.write_str("\n)")?;
        }
        if let Some(with) = &self.with {
            write!(f, " WITH {with}")?;
        }
        if let Some(query) = &self.query {
            write!(f, " AS\n{query}")?;
        }
        if self.emit_changes {
            f.write_str("\nEMIT CHANGES")?;
        }
        f.write_str(";")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsertInto {
    pub target: String,
    pub query: StreamSelect,
    pub emit_changes: bool,
}

impl fmt::Display for InsertInto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {}\n{}", self.target, self.query)?;
        if self.emit_changes {
            f.write_str("\nEMIT CHANGES")?;
        }
        f.write_str(";")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    CreateStream(CreateStream),
    CreateTable(CreateTable),
    InsertInto(InsertInto),
}

impl Statement {
    /// Declared name. An INSERT has none, so it is named after the hash of
    /// its own text.
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            Statement::CreateStream(s) => Cow::Borrowed(&s.name),
            Statement::CreateTable(t) => Cow::Borrowed(&t.name),
            Statement::InsertInto(_) => Cow::Owned(self.content_hash()),
        }
    }

    pub fn action(&self) -> ActionKind {
        match self {
            Statement::CreateStream(s) => s.action,
            Statement::CreateTable(t) => t.action,
            Statement::InsertInto(_) => ActionKind::Insert,
        }
    }

    /// Kind of object the statement defines; `None` for an INSERT.
    pub fn object_kind(&self) -> Option<ObjectKind> {
        match self {
            Statement::CreateStream(_) => Some(ObjectKind::Stream),
            Statement::CreateTable(_) => Some(ObjectKind::Table),
            Statement::InsertInto(_) => None,
        }
    }

    /// Upstream sources read by the statement: its FROM target and any joins.
    pub fn data_sources(&self) -> Vec<&str> {
        match self {
            Statement::CreateStream(s) => s.query.as_ref().map(|q| q.sources()).unwrap_or_default(),
            Statement::CreateTable(t) => t.query.as_ref().map(|q| q.sources()).unwrap_or_default(),
            Statement::InsertInto(i) => i.query.sources(),
        }
    }

    /// Names that must exist before this statement can be applied: its data
    /// sources plus, for an INSERT, the object it writes into.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps = self.data_sources();
        if let Statement::InsertInto(i) = self {
            deps.push(i.target.as_str());
        }
        deps
    }

    /// Hash of the serialised text; what the reconciler compares against.
    pub fn content_hash(&self) -> String {
        content_hash(&self.to_string())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateStream(s) => s.write(f, ObjectKind::Stream),
            Statement::CreateTable(t) => t.write(f, ObjectKind::Table),
            Statement::InsertInto(i) => write!(f, "{i}"),
        }
    }
}
