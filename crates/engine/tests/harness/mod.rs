#![allow(dead_code)]

use common::config::{OperatorConfig, PollConfig};
use common::types::{ManagedKsql, ResourceKey};
use engine::{Controller, MemoryResourceStore, ResourceStore};
use std::sync::Arc;
use test_utils::FakeKsql;

pub const S: &str = "CREATE OR REPLACE STREAM S (a STRING) WITH (KAFKA_TOPIC='s', VALUE_FORMAT='JSON', PARTITIONS=1, REPLICAS=1);";
pub const T: &str = "CREATE OR REPLACE STREAM T AS SELECT a FROM S EMIT CHANGES;";
pub const U: &str = "CREATE OR REPLACE STREAM U (a STRING) WITH (KAFKA_TOPIC='u', VALUE_FORMAT='JSON');";
pub const INSERT: &str = "INSERT INTO U SELECT a FROM S;";

pub struct Harness {
    pub ksql: Arc<FakeKsql>,
    pub store: Arc<MemoryResourceStore>,
    pub controller: Arc<Controller>,
}

pub fn config() -> OperatorConfig {
    OperatorConfig {
        poll: PollConfig {
            attempts: 5,
            interval_ms: 1,
        },
        ..OperatorConfig::default()
    }
}

pub fn key() -> ResourceKey {
    ResourceKey::new("analytics", "pipeline")
}

impl Harness {
    pub fn new() -> Self {
        let ksql = Arc::new(FakeKsql::new());
        let store = Arc::new(MemoryResourceStore::new());
        let controller = Arc::new(Controller::new(ksql.clone(), store.clone(), &config()));
        Self {
            ksql,
            store,
            controller,
        }
    }

    pub fn declare(&self, version: u64, statements: &[&str]) {
        self.store
            .upsert(ManagedKsql::new(key(), version, statements.join("\n")));
    }

    pub fn stored(&self) -> ManagedKsql {
        self.store.get(&key()).unwrap().expect("resource is stored")
    }
}
