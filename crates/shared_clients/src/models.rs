//! Wire shapes of the ksqlDB REST API. Every field is optional on the wire,
//! so everything defaults.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /ksql`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KsqlRequest<'a> {
    pub ksql: &'a str,
    pub streams_properties: Map<String, Value>,
}

impl<'a> KsqlRequest<'a> {
    pub fn new(ksql: &'a str) -> Self {
        Self {
            ksql,
            streams_properties: Map::new(),
        }
    }
}

/// Either the shape a call expects, or the structured error the server sent
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub enum KsqlResponse<T> {
    Success(T),
    Error(KsqlErrorBody),
}

impl<T> KsqlResponse<T> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, KsqlResponse::Error(e) if e.is_not_found())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> KsqlResponse<U> {
        match self {
            KsqlResponse::Success(v) => KsqlResponse::Success(f(v)),
            KsqlResponse::Error(e) => KsqlResponse::Error(e),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KsqlErrorBody {
    #[serde(rename = "@type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "stackTrace", default)]
    pub stack_trace: Vec<String>,
}

impl KsqlErrorBody {
    pub fn new(error_code: i64, message: impl Into<String>) -> Self {
        Self {
            kind: None,
            error_code,
            message: message.into(),
            stack_trace: Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_code == crate::ERROR_CODE_NOT_FOUND
    }
}

impl std::fmt::Display for KsqlErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.error_code, self.message)?;
        for line in &self.stack_trace {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRef {
    pub id: String,
    pub query_string: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescription {
    pub name: String,
    pub schema: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceDescription {
    pub name: String,
    pub window_type: Option<String>,
    pub read_queries: Vec<QueryRef>,
    pub write_queries: Vec<QueryRef>,
    pub fields: Vec<FieldDescription>,
    #[serde(rename = "type")]
    pub kind: String,
    pub key: Option<String>,
    pub timestamp: Option<String>,
    pub topic: Option<String>,
    pub partitions: Option<i32>,
    pub replication: Option<i32>,
    pub statement: String,
}

impl SourceDescription {
    /// Ids of every query writing into or reading from the source, writers
    /// first.
    pub fn query_ids(&self) -> impl Iterator<Item = &str> {
        self.write_queries
            .iter()
            .chain(&self.read_queries)
            .map(|q| q.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescribeResultItem {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    pub statement_text: String,
    pub source_description: SourceDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryDescription {
    pub statement_text: String,
    pub state: Option<String>,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplainResultItem {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    pub statement_text: String,
    pub query_description: QueryDescription,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandStatusBody {
    pub status: String,
    pub message: String,
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandResultItem {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    pub statement_text: String,
    pub command_id: String,
    pub command_status: CommandStatusBody,
    pub command_sequence_number: i64,
}

/// Body of `GET /status/{commandId}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}
