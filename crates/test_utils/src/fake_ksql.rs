use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_clients::models::{
    CommandResultItem, CommandStatusBody, DescribeResultItem, ExplainResultItem, KsqlErrorBody,
    QueryDescription, QueryRef, SourceDescription, StatusResponse,
};
use shared_clients::{KsqlApi, KsqlClientError, KsqlResponse, ERROR_CODE_NOT_FOUND};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Describe,
    Explain,
    Execute,
    CreateDropTerminate,
    Status,
}

/// One recorded request: its kind and argument (name, query id, statement
/// text or command id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: CallKind,
    pub arg: String,
}

#[derive(Debug, Clone)]
struct LiveObject {
    kind: String,
    name: String,
    statement: String,
    read_queries: Vec<String>,
    write_queries: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    objects: BTreeMap<String, LiveObject>,
    queries: BTreeMap<String, String>,
    commands: BTreeMap<String, String>,
    next_query: usize,
    describe: VecDeque<KsqlResponse<Vec<DescribeResultItem>>>,
    explain: VecDeque<KsqlResponse<Vec<ExplainResultItem>>>,
    cdt: VecDeque<KsqlResponse<Vec<CommandResultItem>>>,
    status: VecDeque<KsqlResponse<StatusResponse>>,
    unreachable: bool,
}

/// In-memory stand-in for a ksqlDB server.
///
/// Scripted responses are served first, per call kind, in the order they
/// were pushed. Once a kind's script is exhausted the fake answers from a
/// small simulation: CREATE registers an object (and a persistent query when
/// it has a SELECT body), INSERT starts a query writing into its target,
/// TERMINATE and DROP remove them, and every command id it handed out reports
/// `SUCCESS`.
#[derive(Debug, Default)]
pub struct FakeKsql {
    state: Mutex<State>,
}

fn not_found(what: &str) -> KsqlErrorBody {
    KsqlErrorBody::new(ERROR_CODE_NOT_FOUND, format!("{what} does not exist."))
}

fn command_item(statement: &str, command_id: String, query_id: Option<String>) -> CommandResultItem {
    CommandResultItem {
        kind: Some("currentStatus".into()),
        statement_text: statement.to_string(),
        command_id,
        command_status: CommandStatusBody {
            status: "SUCCESS".into(),
            message: String::new(),
            query_id,
        },
        command_sequence_number: 0,
    }
}

/// Upper-cased words of `sql`, punctuation stripped from their edges.
fn words(sql: &str) -> Vec<String> {
    sql.split(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == ',' || c == ';')
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('`').to_uppercase())
        .collect()
}

impl FakeKsql {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.arg.clone())
            .collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.state.lock().calls.iter().filter(|c| c.kind == kind).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn push_describe(&self, resp: KsqlResponse<Vec<DescribeResultItem>>) {
        self.state.lock().describe.push_back(resp);
    }

    pub fn push_explain(&self, resp: KsqlResponse<Vec<ExplainResultItem>>) {
        self.state.lock().explain.push_back(resp);
    }

    pub fn push_create_drop_terminate(&self, resp: KsqlResponse<Vec<CommandResultItem>>) {
        self.state.lock().cdt.push_back(resp);
    }

    pub fn push_status(&self, resp: KsqlResponse<StatusResponse>) {
        self.state.lock().status.push_back(resp);
    }

    /// Shorthand for scripting a status reply.
    pub fn push_command_state(&self, state: &str) {
        self.push_status(KsqlResponse::Success(StatusResponse {
            status: state.to_string(),
            message: String::new(),
        }));
    }

    /// Makes every following call fail at the transport level.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// Registers an object created outside the reconciler.
    pub fn seed_object(&self, kind: &str, name: &str, statement: &str) {
        self.state.lock().objects.insert(
            name.to_uppercase(),
            LiveObject {
                kind: kind.to_uppercase(),
                name: name.to_string(),
                statement: statement.to_string(),
                read_queries: Vec::new(),
                write_queries: Vec::new(),
            },
        );
    }

    /// Rewrites the live definition of an object, as a manual change would.
    pub fn set_live_statement(&self, name: &str, statement: &str) {
        if let Some(obj) = self.state.lock().objects.get_mut(&name.to_uppercase()) {
            obj.statement = statement.to_string();
        }
    }

    /// Rewrites the statement a running query reports.
    pub fn set_query_statement(&self, query_id: &str, statement: &str) {
        if let Some(stmt) = self.state.lock().queries.get_mut(query_id) {
            *stmt = statement.to_string();
        }
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.state.lock().objects.contains_key(&name.to_uppercase())
    }

    pub fn running_queries(&self) -> Vec<String> {
        self.state.lock().queries.keys().cloned().collect()
    }

    fn record(&self, kind: CallKind, arg: &str) -> Result<(), KsqlClientError> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            kind,
            arg: arg.to_string(),
        });
        if state.unreachable {
            return Err(KsqlClientError::failed_to_connect("connection refused"));
        }
        Ok(())
    }

    fn simulate(&self, sql: &str) -> KsqlResponse<Vec<CommandResultItem>> {
        let mut state = self.state.lock();
        let words = words(sql);
        let head = words.first().map(String::as_str).unwrap_or_default();

        match head {
            "TERMINATE" => {
                let id = sql
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .trim_end_matches(';')
                    .to_string();
                if state.queries.remove(&id).is_none() {
                    return KsqlResponse::Error(not_found(&format!("query {id}")));
                }
                for obj in state.objects.values_mut() {
                    obj.read_queries.retain(|q| q != &id);
                    obj.write_queries.retain(|q| q != &id);
                }
                let command_id = format!("terminate/{id}/execute");
                state.commands.insert(command_id.clone(), "SUCCESS".into());
                KsqlResponse::Success(vec![command_item(sql, command_id, None)])
            }
            "DROP" => {
                let (kind, name) = match (words.get(1), words.get(2)) {
                    (Some(kind), Some(name)) => (kind.to_lowercase(), name.clone()),
                    _ => return KsqlResponse::Error(KsqlErrorBody::new(40000, "bad drop")),
                };
                if state.objects.remove(&name).is_none() {
                    return KsqlResponse::Error(not_found(&name));
                }
                let command_id = format!("{kind}/`{name}`/drop");
                state.commands.insert(command_id.clone(), "SUCCESS".into());
                KsqlResponse::Success(vec![command_item(sql, command_id, None)])
            }
            "INSERT" => {
                let target = words.get(2).cloned().unwrap_or_default();
                state.next_query += 1;
                let query_id = format!("INSERTQUERY_{}", state.next_query);
                state.queries.insert(query_id.clone(), sql.to_string());
                if let Some(obj) = state.objects.get_mut(&target) {
                    obj.write_queries.push(query_id.clone());
                }
                register_readers(&mut state, &words, &query_id);
                let command_id = format!("stream/`{target}`/execute");
                state.commands.insert(command_id.clone(), "SUCCESS".into());
                KsqlResponse::Success(vec![command_item(sql, command_id, Some(query_id))])
            }
            "CREATE" | "REPLACE" => {
                let mut rest = words.iter().skip(1).map(String::as_str);
                let mut kind = rest.next().unwrap_or_default();
                while kind == "OR" || kind == "REPLACE" {
                    kind = rest.next().unwrap_or_default();
                }
                let kind = kind.to_string();
                let name = rest.next().unwrap_or_default().to_string();

                let query_id = words.iter().any(|w| w == "SELECT").then(|| {
                    state.next_query += 1;
                    let prefix = if kind == "TABLE" { "CTAS" } else { "CSAS" };
                    format!("{prefix}_{name}_{}", state.next_query)
                });

                let mut obj = LiveObject {
                    kind: kind.clone(),
                    name: name.clone(),
                    statement: sql.to_string(),
                    read_queries: Vec::new(),
                    write_queries: Vec::new(),
                };
                if let Some(previous) = state.objects.get(&name) {
                    obj.read_queries = previous.read_queries.clone();
                    obj.write_queries = previous.write_queries.clone();
                }
                if let Some(id) = &query_id {
                    if !obj.write_queries.contains(id) {
                        obj.write_queries.push(id.clone());
                    }
                    state.queries.insert(id.clone(), sql.to_string());
                }
                state.objects.insert(name.clone(), obj);
                if let Some(id) = &query_id {
                    register_readers(&mut state, &words, id);
                }

                let command_id = format!("{}/`{name}`/create", kind.to_lowercase());
                state.commands.insert(command_id.clone(), "SUCCESS".into());
                KsqlResponse::Success(vec![command_item(sql, command_id, query_id)])
            }
            _ => KsqlResponse::Error(KsqlErrorBody::new(40000, format!("cannot run '{sql}'"))),
        }
    }
}

/// Records `query_id` as a reader of every declared object named after a
/// FROM or JOIN keyword.
fn register_readers(state: &mut State, words: &[String], query_id: &str) {
    for pair in words.windows(2) {
        if pair[0] == "FROM" || pair[0] == "JOIN" {
            if let Some(obj) = state.objects.get_mut(&pair[1]) {
                if !obj.read_queries.iter().any(|q| q == query_id) {
                    obj.read_queries.push(query_id.to_string());
                }
            }
        }
    }
}

#[async_trait]
impl KsqlApi for FakeKsql {
    async fn describe(
        &self,
        name: &str,
    ) -> Result<KsqlResponse<Vec<DescribeResultItem>>, KsqlClientError> {
        self.record(CallKind::Describe, name)?;
        let mut state = self.state.lock();
        if let Some(resp) = state.describe.pop_front() {
            return Ok(resp);
        }
        let Some(obj) = state.objects.get(&name.to_uppercase()) else {
            return Ok(KsqlResponse::Error(not_found(name)));
        };
        let refs = |ids: &[String]| -> Vec<QueryRef> {
            ids.iter()
                .map(|id| QueryRef {
                    id: id.clone(),
                    query_string: None,
                })
                .collect()
        };
        Ok(KsqlResponse::Success(vec![DescribeResultItem {
            kind: Some("sourceDescription".into()),
            statement_text: format!("DESCRIBE {name};"),
            source_description: SourceDescription {
                name: obj.name.clone(),
                kind: obj.kind.clone(),
                read_queries: refs(&obj.read_queries),
                write_queries: refs(&obj.write_queries),
                statement: obj.statement.clone(),
                ..SourceDescription::default()
            },
        }]))
    }

    async fn explain(
        &self,
        query_id: &str,
    ) -> Result<KsqlResponse<Vec<ExplainResultItem>>, KsqlClientError> {
        self.record(CallKind::Explain, query_id)?;
        let mut state = self.state.lock();
        if let Some(resp) = state.explain.pop_front() {
            return Ok(resp);
        }
        let Some(statement) = state.queries.get(query_id) else {
            return Ok(KsqlResponse::Error(not_found(&format!("query {query_id}"))));
        };
        Ok(KsqlResponse::Success(vec![ExplainResultItem {
            kind: Some("queryDescription".into()),
            statement_text: format!("EXPLAIN {query_id};"),
            query_description: QueryDescription {
                statement_text: statement.clone(),
                state: Some("RUNNING".into()),
                ..QueryDescription::default()
            },
        }]))
    }

    async fn execute(&self, ksql: &str) -> Result<KsqlResponse<Value>, KsqlClientError> {
        self.record(CallKind::Execute, ksql)?;
        Ok(KsqlResponse::Success(json!([])))
    }

    async fn create_drop_terminate(
        &self,
        ksql: &str,
    ) -> Result<KsqlResponse<Vec<CommandResultItem>>, KsqlClientError> {
        self.record(CallKind::CreateDropTerminate, ksql)?;
        if let Some(resp) = self.state.lock().cdt.pop_front() {
            return Ok(resp);
        }
        Ok(self.simulate(ksql))
    }

    async fn status(
        &self,
        command_id: &str,
    ) -> Result<KsqlResponse<StatusResponse>, KsqlClientError> {
        self.record(CallKind::Status, command_id)?;
        let mut state = self.state.lock();
        if let Some(resp) = state.status.pop_front() {
            return Ok(resp);
        }
        Ok(match state.commands.get(command_id) {
            Some(status) => KsqlResponse::Success(StatusResponse {
                status: status.clone(),
                message: String::new(),
            }),
            None => KsqlResponse::Error(KsqlErrorBody::new(404, "command not found")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulates_create_describe_drop() {
        let fake = FakeKsql::new();
        fake.seed_object("STREAM", "S", "CREATE STREAM S (a STRING);");

        let created = fake
            .create_drop_terminate("CREATE STREAM T AS SELECT a FROM S EMIT CHANGES;")
            .await
            .unwrap();
        let KsqlResponse::Success(items) = created else {
            panic!("expected success");
        };
        let query_id = items[0].command_status.query_id.clone().unwrap();
        assert_eq!(items[0].command_id, "stream/`T`/create");

        let KsqlResponse::Success(described) = fake.describe("s").await.unwrap() else {
            panic!("expected S to exist");
        };
        let readers: Vec<_> = described[0].source_description.query_ids().collect();
        assert_eq!(readers, vec![query_id.as_str()]);

        let dropped = fake.create_drop_terminate("DROP STREAM S;").await.unwrap();
        assert!(matches!(dropped, KsqlResponse::Success(_)));
        assert!(!fake.has_object("S"));
        assert!(fake.describe("S").await.unwrap().is_not_found());
        assert_eq!(fake.count(CallKind::Describe), 2);
    }

    #[tokio::test]
    async fn scripted_responses_come_first() {
        let fake = FakeKsql::new();
        fake.push_command_state("EXECUTING");
        let first = fake.status("anything").await.unwrap();
        assert!(matches!(first, KsqlResponse::Success(s) if s.status == "EXECUTING"));
        let second = fake.status("anything").await.unwrap();
        assert!(matches!(second, KsqlResponse::Error(e) if e.error_code == 404));
    }

    #[tokio::test]
    async fn terminate_unknown_query_is_not_found() {
        let fake = FakeKsql::new();
        let resp = fake.create_drop_terminate("TERMINATE CSAS_X_1;").await.unwrap();
        assert!(resp.is_not_found());
    }
}
