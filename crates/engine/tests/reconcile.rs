mod harness;

use common::types::{CommandState, ResourceStatus};
use engine::ReconcileError;
use shared_clients::models::KsqlErrorBody;
use shared_clients::KsqlResponse;
use harness::{key, Harness, INSERT, S, T, U};
use test_utils::CallKind;

fn creates(h: &Harness) -> Vec<String> {
    h.ksql
        .calls_of(CallKind::CreateDropTerminate)
        .into_iter()
        .filter(|sql| sql.starts_with("CREATE"))
        .collect()
}

#[tokio::test]
async fn applies_in_dependency_order_and_records_status() {
    let h = Harness::new();
    h.declare(1, &[T, S]);

    h.controller.reconcile(&key()).await.unwrap();

    let created = creates(&h);
    assert_eq!(created.len(), 2);
    assert!(created[0].contains("STREAM S"));
    assert!(created[1].contains("STREAM T"));

    let stored = h.stored();
    assert_eq!(stored.status.applied, ResourceStatus::Applied);
    let t = &stored.status.item_status["T"];
    assert_eq!(t.command_id, "stream/`T`/create");
    assert!(t.query_id.starts_with("CSAS_T_"));
    assert_eq!(t.status, Some(CommandState::Success));
    assert!(stored.status.item_status["S"].query_id.is_empty());
}

#[tokio::test]
async fn second_pass_without_changes_issues_no_mutations() {
    let h = Harness::new();
    h.declare(1, &[S, T, U, INSERT]);
    h.controller.reconcile(&key()).await.unwrap();
    let first = h.stored().status;

    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();

    assert_eq!(h.ksql.count(CallKind::CreateDropTerminate), 0);
    assert_eq!(h.ksql.count(CallKind::Status), 3);
    assert_eq!(h.ksql.count(CallKind::Describe), 3);
    assert_eq!(h.ksql.count(CallKind::Explain), 1);
    assert_eq!(h.stored().status, first);
}

#[tokio::test]
async fn plain_create_of_missing_object_skips_the_drop() {
    let h = Harness::new();
    let plain = "CREATE STREAM P (a STRING) WITH (KAFKA_TOPIC='p', VALUE_FORMAT='JSON');";
    h.declare(1, &[plain]);

    h.controller.reconcile(&key()).await.unwrap();

    let kinds: Vec<_> = h.ksql.calls().into_iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CallKind::Describe, CallKind::CreateDropTerminate]);
    assert!(h.ksql.has_object("P"));
}

#[tokio::test]
async fn plain_create_replaces_a_pre_existing_object() {
    let h = Harness::new();
    h.ksql
        .seed_object("STREAM", "P", "CREATE STREAM P (old STRING);");
    let plain = "CREATE STREAM P (a STRING) WITH (KAFKA_TOPIC='p', VALUE_FORMAT='JSON');";
    h.declare(1, &[plain]);

    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert_eq!(cdt.len(), 2);
    assert_eq!(cdt[0], "DROP STREAM P;");
    assert!(cdt[1].starts_with("CREATE STREAM P"));
}

#[tokio::test]
async fn changed_statement_text_is_reissued() {
    let h = Harness::new();
    h.declare(1, &[S]);
    h.controller.reconcile(&key()).await.unwrap();

    let changed = S.replace("a STRING", "a STRING, b INT");
    h.declare(2, &[&changed]);
    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert_eq!(cdt.len(), 1);
    assert!(cdt[0].contains("b INT"));
}

#[tokio::test]
async fn live_drift_forces_recreation_on_the_next_pass() {
    let h = Harness::new();
    h.declare(1, &[S]);
    h.controller.reconcile(&key()).await.unwrap();

    h.ksql.set_live_statement("S", "CREATE STREAM S (edited STRING);");
    h.controller.reconcile(&key()).await.unwrap();
    assert!(h.stored().status.item_status["S"].command_id.is_empty());

    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();
    assert_eq!(creates(&h).len(), 1);
    assert!(!h.stored().status.item_status["S"].command_id.is_empty());
}

#[tokio::test]
async fn drifted_insert_is_terminated_and_reissued() {
    let h = Harness::new();
    h.declare(1, &[S, U, INSERT]);
    h.controller.reconcile(&key()).await.unwrap();

    let name = ksqlparser::parse(INSERT).unwrap().name().into_owned();
    let old_query = h.stored().status.item_status[&name].query_id.clone();
    assert!(old_query.starts_with("INSERTQUERY_"));

    h.ksql.set_query_statement(&old_query, "INSERT INTO U SELECT b FROM S;");
    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert_eq!(cdt[0], format!("TERMINATE {old_query};"));
    assert!(cdt[1].starts_with("INSERT INTO U"));
    let new_query = &h.stored().status.item_status[&name].query_id;
    assert_ne!(new_query, &old_query);
    assert_eq!(h.ksql.running_queries(), vec![new_query.clone()]);
}

#[tokio::test]
async fn statements_removed_from_the_declaration_are_torn_down() {
    let h = Harness::new();
    h.declare(1, &[S, T]);
    h.controller.reconcile(&key()).await.unwrap();
    let t_query = h.stored().status.item_status["T"].query_id.clone();

    h.declare(2, &[S]);
    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert_eq!(cdt, vec![format!("TERMINATE {t_query};"), "DROP STREAM T;".to_string()]);
    assert!(!h.ksql.has_object("T"));
    assert!(h.ksql.has_object("S"));

    let stored = h.stored();
    assert!(!stored.status.item_status.contains_key("T"));
    assert_eq!(stored.status.applied, ResourceStatus::Applied);
}

#[tokio::test]
async fn removed_insert_only_terminates_its_query() {
    let h = Harness::new();
    h.declare(1, &[S, U, INSERT]);
    h.controller.reconcile(&key()).await.unwrap();

    h.declare(2, &[S, U]);
    h.controller.reconcile(&key()).await.unwrap();

    assert!(h.ksql.has_object("U"));
    assert!(h.ksql.running_queries().is_empty());
    assert_eq!(h.stored().status.item_status.len(), 2);
}

#[tokio::test]
async fn deleted_resource_drops_everything_it_created() {
    let h = Harness::new();
    h.declare(1, &[S, T]);
    h.controller.reconcile(&key()).await.unwrap();

    h.store.remove(&key());
    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert!(cdt[0].starts_with("TERMINATE CSAS_T_"));
    let drops: Vec<&str> = cdt
        .iter()
        .map(String::as_str)
        .filter(|s| s.starts_with("DROP"))
        .collect();
    assert_eq!(drops, vec!["DROP STREAM S;", "DROP STREAM T;"]);
    assert!(!h.ksql.has_object("S") && !h.ksql.has_object("T"));
    assert!(h.controller.cache().is_empty());

    // a second delete event has nothing left to do
    h.ksql.clear_calls();
    h.controller.reconcile(&key()).await.unwrap();
    assert!(h.ksql.calls().is_empty());
}

#[tokio::test]
async fn deleted_resource_cleanup_continues_past_failures() {
    let h = Harness::new();
    h.declare(1, &[S, T]);
    h.controller.reconcile(&key()).await.unwrap();

    h.store.remove(&key());
    h.ksql.clear_calls();
    // first the standalone TERMINATE of T's query, then the one issued while dropping S
    for _ in 0..2 {
        h.ksql.push_create_drop_terminate(KsqlResponse::Error(KsqlErrorBody::new(
            50000,
            "boom",
        )));
    }
    h.controller.reconcile(&key()).await.unwrap();

    let cdt = h.ksql.calls_of(CallKind::CreateDropTerminate);
    assert!(cdt[0].starts_with("TERMINATE CSAS_T_"));
    assert!(!cdt.iter().any(|sql| sql == "DROP STREAM S;"));
    assert_eq!(cdt.last().map(String::as_str), Some("DROP STREAM T;"));
    assert!(h.ksql.has_object("S"));
    assert!(!h.ksql.has_object("T"));
    assert!(h.controller.cache().is_empty());
}

#[tokio::test]
async fn orphan_cleanup_continues_past_failures() {
    let h = Harness::new();
    h.declare(1, &[S, T, U]);
    h.controller.reconcile(&key()).await.unwrap();

    h.declare(2, &[S]);
    h.ksql.push_create_drop_terminate(KsqlResponse::Error(KsqlErrorBody::new(50000, "boom")));
    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::RemoteApplication { ref body, .. } if body.error_code == 50000
    ));

    // T failed and is kept for the retry, U was still dropped
    assert!(h.ksql.has_object("T"));
    assert!(!h.ksql.has_object("U"));
    let stored = h.stored();
    assert_eq!(stored.status.applied, ResourceStatus::Pending);
    assert!(stored.status.item_status.contains_key("T"));
    assert!(!stored.status.item_status.contains_key("U"));

    h.controller.reconcile(&key()).await.unwrap();
    assert!(!h.ksql.has_object("T"));
    let stored = h.stored();
    assert_eq!(stored.status.applied, ResourceStatus::Applied);
    let names: Vec<&str> = stored.status.item_status.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["S"]);
}

#[tokio::test]
async fn cyclic_declaration_leaves_status_untouched() {
    let h = Harness::new();
    h.declare(
        1,
        &[
            "CREATE STREAM A AS SELECT x FROM B EMIT CHANGES;",
            "CREATE STREAM B AS SELECT x FROM A EMIT CHANGES;",
        ],
    );

    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::DependencyCycle(_)));
    assert!(h.ksql.calls().is_empty());
    assert_eq!(h.stored().status, Default::default());
}

#[tokio::test]
async fn unparsable_declaration_is_a_parse_error() {
    let h = Harness::new();
    h.declare(1, &["CREATE STREAM S;"]);
    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Parse(_)));
    assert!(h.ksql.calls().is_empty());
}

#[tokio::test]
async fn remote_error_stops_the_pass_but_keeps_earlier_progress() {
    let h = Harness::new();
    h.declare(1, &[S, T]);
    h.ksql.push_create_drop_terminate(KsqlResponse::Success(vec![]));
    h.ksql.clear_calls();

    // S comes back with no items at all
    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::UnexpectedResponseShape { .. }));
    assert_eq!(h.ksql.count(CallKind::CreateDropTerminate), 1);

    h.controller.reconcile(&key()).await.unwrap();
    h.ksql.push_create_drop_terminate(KsqlResponse::Error(KsqlErrorBody::new(
        40002,
        "Invalid topic",
    )));
    let changed_t = T.replace("SELECT a", "SELECT a AS b");
    h.declare(2, &[S, &changed_t]);

    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::RemoteApplication { ref body, .. } if body.error_code == 40002
    ));
    let stored = h.stored();
    assert_eq!(stored.status.applied, ResourceStatus::Pending);
    assert_eq!(stored.status.item_status["S"].status, Some(CommandState::Success));
    assert_eq!(stored.status.item_status["T"].status, Some(CommandState::Error));
}

#[tokio::test]
async fn bare_replace_is_unsupported() {
    let h = Harness::new();
    h.declare(1, &["REPLACE STREAM R (a STRING);"]);
    let err = h.controller.reconcile(&key()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::UnsupportedStatementKind { .. }));
    assert_eq!(h.stored().status.applied, ResourceStatus::Pending);
}
