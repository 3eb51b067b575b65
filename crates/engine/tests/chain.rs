use common::config::PollConfig;
use common::types::{CommandState, CommandStatus};
use common::utils::content_hash;
use engine::{ReconcileError, Reconciler};
use ksqlparser::{parse, ObjectKind};
use shared_clients::models::{CommandResultItem, CommandStatusBody};
use shared_clients::{KsqlApi, KsqlResponse};
use std::sync::Arc;
use test_utils::{CallKind, FakeKsql};

fn reconciler(ksql: &Arc<FakeKsql>) -> Reconciler {
    Reconciler::new(
        ksql.clone(),
        PollConfig {
            attempts: 5,
            interval_ms: 1,
        },
    )
}

fn accepted(command_id: &str, state: &str) -> KsqlResponse<Vec<CommandResultItem>> {
    KsqlResponse::Success(vec![CommandResultItem {
        command_id: command_id.to_string(),
        command_status: CommandStatusBody {
            status: state.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }])
}

#[tokio::test]
async fn unchanged_create_or_replace_only_checks_status_and_describes() {
    let ksql = Arc::new(FakeKsql::new());
    let stmt = parse("CREATE OR REPLACE STREAM S (a STRING) WITH (KAFKA_TOPIC='t', VALUE_FORMAT='JSON');")
        .unwrap();
    let text = stmt.to_string();
    ksql.seed_object("STREAM", "S", &text);
    ksql.push_command_state("SUCCESS");

    let mut status = CommandStatus {
        command_id: "stream/`S`/create".into(),
        query_hash: content_hash(&text),
        status_hash: content_hash(&text),
        ..Default::default()
    };
    reconciler(&ksql).process(&stmt, &mut status).await.unwrap();

    let kinds: Vec<_> = ksql.calls().into_iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CallKind::Status, CallKind::Describe]);
    assert_eq!(status.status, Some(CommandState::Success));
    assert_eq!(status.command_id, "stream/`S`/create");
}

#[tokio::test]
async fn missing_command_clears_the_id() {
    let ksql = Arc::new(FakeKsql::new());
    let stmt = parse("CREATE OR REPLACE STREAM S (a STRING);").unwrap();
    let mut status = CommandStatus {
        command_id: "stream/`S`/create".into(),
        query_hash: stmt.content_hash(),
        ..Default::default()
    };

    let err = reconciler(&ksql).process(&stmt, &mut status).await.unwrap_err();
    assert!(matches!(err, ReconcileError::CommandNotFound { .. }));
    assert!(status.command_id.is_empty());
}

#[tokio::test]
async fn terminate_times_out_when_command_never_settles() {
    let ksql = Arc::new(FakeKsql::new());
    ksql.push_create_drop_terminate(accepted("terminate/CSAS_X_1/execute", "QUEUED"));
    for _ in 0..5 {
        ksql.push_command_state("EXECUTING");
    }

    let err = reconciler(&ksql).terminate("CSAS_X_1").await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::PollTimeout { ref command_id, attempts: 5 } if command_id == "terminate/CSAS_X_1/execute"
    ));
    assert_eq!(ksql.count(CallKind::Status), 5);
}

#[tokio::test]
async fn polling_stops_at_the_first_terminal_state() {
    let ksql = Arc::new(FakeKsql::new());
    let r = reconciler(&ksql);

    ksql.push_command_state("PARSING");
    ksql.push_command_state("SUCCESS");
    r.wait_for_success("c1").await.unwrap();
    assert_eq!(ksql.count(CallKind::Status), 2);

    ksql.push_command_state("TERMINATED");
    let err = r.wait_for_success("c2").await.unwrap_err();
    assert!(matches!(err, ReconcileError::CommandTerminated { .. }));

    ksql.push_status(KsqlResponse::Success(shared_clients::models::StatusResponse {
        status: "ERROR".into(),
        message: "topic missing".into(),
    }));
    let err = r.wait_for_success("c3").await.unwrap_err();
    assert!(matches!(err, ReconcileError::CommandErrored { ref message, .. } if message == "topic missing"));

    ksql.push_command_state("RUNNING");
    let err = r.wait_for_success("c4").await.unwrap_err();
    assert!(matches!(err, ReconcileError::UnknownCommandStatus(_)));
}

#[tokio::test]
async fn terminate_of_unknown_query_is_not_found() {
    let ksql = Arc::new(FakeKsql::new());
    let err = reconciler(&ksql).terminate("CSAS_GONE_1").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn drop_terminates_every_query_before_dropping() {
    let ksql = Arc::new(FakeKsql::new());
    let r = reconciler(&ksql);
    for sql in [
        "CREATE STREAM S (a STRING);",
        "CREATE STREAM T AS SELECT a FROM S EMIT CHANGES;",
        "CREATE STREAM U AS SELECT a FROM S EMIT CHANGES;",
        "INSERT INTO S SELECT a FROM T;",
    ] {
        ksql.create_drop_terminate(sql).await.unwrap();
    }
    let queries = ksql.running_queries();
    assert_eq!(queries.len(), 3);
    ksql.clear_calls();

    r.drop_object(ObjectKind::Stream, "S").await.unwrap();

    let cdt = ksql.calls_of(CallKind::CreateDropTerminate);
    assert_eq!(cdt.last().map(String::as_str), Some("DROP STREAM S;"));
    let terminated: Vec<_> = cdt[..cdt.len() - 1]
        .iter()
        .map(|sql| sql.trim_start_matches("TERMINATE ").trim_end_matches(';'))
        .collect();
    // the insert writes into S and is terminated first, then both readers
    assert!(terminated[0].starts_with("INSERTQUERY_"));
    assert_eq!(terminated.len(), 3);
    assert!(!ksql.has_object("S"));
}

#[tokio::test]
async fn dropping_a_missing_object_is_not_found() {
    let ksql = Arc::new(FakeKsql::new());
    let err = reconciler(&ksql)
        .drop_object(ObjectKind::Table, "NOPE")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ksql.count(CallKind::CreateDropTerminate), 0);
}

#[tokio::test]
async fn drop_waits_for_queued_commands() {
    let ksql = Arc::new(FakeKsql::new());
    ksql.seed_object("TABLE", "T", "CREATE TABLE T (a STRING PRIMARY KEY);");
    ksql.push_create_drop_terminate(accepted("table/`T`/drop", "QUEUED"));
    ksql.push_command_state("EXECUTING");
    ksql.push_command_state("SUCCESS");

    reconciler(&ksql)
        .drop_object(ObjectKind::Table, "T")
        .await
        .unwrap();
    assert_eq!(ksql.calls_of(CallKind::Status), vec!["table/`T`/drop"; 2]);
}

#[tokio::test]
async fn orphans_without_usable_ids_are_skipped() {
    let ksql = Arc::new(FakeKsql::new());
    let r = reconciler(&ksql);

    r.drop_orphan("A", &CommandStatus::default()).await.unwrap();
    r.drop_orphan(
        "B",
        &CommandStatus {
            command_id: "garbage".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    // already gone on the server
    r.drop_orphan(
        "C",
        &CommandStatus {
            command_id: "table/`C`/create".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(ksql.calls_of(CallKind::Describe), vec!["C"]);
    assert_eq!(ksql.count(CallKind::CreateDropTerminate), 0);
}
