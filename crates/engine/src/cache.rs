use crate::error::ReconcileError;
use common::types::{ManagedKsql, ResourceKey};
use ksqlparser::Statement;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// What the controller remembers about a resource between passes: the last
/// copy it reconciled and that copy's statements in dependency order.
#[derive(Debug, Clone)]
pub struct CacheItem {
    pub resource: ManagedKsql,
    pub statements: Arc<Vec<Statement>>,
}

/// Single lock over every resource. Each access holds it for the whole
/// read-modify-write, so parsing one resource blocks lookups of all others.
#[derive(Debug, Default)]
pub struct StateCache {
    items: Mutex<HashMap<ResourceKey, CacheItem>>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered statements for `resource`, parsed and resolved again only when
    /// its version is newer than the cached copy. A failure leaves the cache
    /// untouched.
    pub fn statements_for(
        &self,
        resource: &ManagedKsql,
    ) -> Result<Arc<Vec<Statement>>, ReconcileError> {
        let key = resource.key();
        let mut items = self.items.lock();
        if let Some(item) = items.get(&key) {
            if item.resource.resource_version >= resource.resource_version {
                debug!(%key, version = resource.resource_version, "reusing cached statements");
                return Ok(Arc::clone(&item.statements));
            }
        }

        info!(%key, version = resource.resource_version, "parsing ksql");
        let parsed = ksqlparser::parse_many(&resource.statement)?;
        let expected = parsed.len();
        debug!(%key, statements = expected, "building dependency graph");
        let ordered = dag::resolve_order(parsed)?;
        if ordered.len() != expected {
            return Err(dag::DagError::Incomplete {
                expected,
                actual: ordered.len(),
            }
            .into());
        }

        let statements = Arc::new(ordered);
        items.insert(
            key,
            CacheItem {
                resource: resource.clone(),
                statements: Arc::clone(&statements),
            },
        );
        Ok(statements)
    }

    /// Replaces the cached copy of the resource, keeping its statements, so
    /// teardown sees the latest command and query ids.
    pub fn refresh(&self, resource: &ManagedKsql) {
        if let Some(item) = self.items.lock().get_mut(&resource.key()) {
            item.resource = resource.clone();
        }
    }

    pub fn get(&self, key: &ResourceKey) -> Option<CacheItem> {
        self.items.lock().get(key).cloned()
    }

    pub fn remove(&self, key: &ResourceKey) -> Option<CacheItem> {
        self.items.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: &str = "CREATE STREAM S (a STRING) WITH (KAFKA_TOPIC='t', VALUE_FORMAT='JSON');";
    const T: &str = "CREATE STREAM T AS SELECT a FROM S EMIT CHANGES;";

    fn resource(version: u64, text: &str) -> ManagedKsql {
        ManagedKsql::new(ResourceKey::new("ns", "r"), version, text)
    }

    #[test]
    fn parses_once_per_version() {
        let cache = StateCache::new();
        let first = cache.statements_for(&resource(1, &format!("{T}\n{S}"))).unwrap();
        let names: Vec<_> = first.iter().map(|s| s.name().into_owned()).collect();
        assert_eq!(names, vec!["S", "T"]);

        // same version, different text: the cached list wins
        let again = cache.statements_for(&resource(1, S)).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let newer = cache.statements_for(&resource(2, S)).unwrap();
        assert_eq!(newer.len(), 1);
    }

    #[test]
    fn failures_leave_previous_entry() {
        let cache = StateCache::new();
        cache.statements_for(&resource(1, S)).unwrap();

        let cyclic = "CREATE STREAM A AS SELECT x FROM B EMIT CHANGES;\n\
                      CREATE STREAM B AS SELECT x FROM A EMIT CHANGES;";
        let err = cache.statements_for(&resource(2, cyclic)).unwrap_err();
        assert!(matches!(err, ReconcileError::DependencyCycle(_)));

        let err = cache.statements_for(&resource(3, "CREATE FOO;")).unwrap_err();
        assert!(matches!(err, ReconcileError::Parse(_)));

        let item = cache.get(&ResourceKey::new("ns", "r")).unwrap();
        assert_eq!(item.resource.resource_version, 1);
        assert_eq!(item.statements.len(), 1);
    }
}
