use crate::types::command::CommandStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identity of a declared resource, rendered as `namespace/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid resource key '{0}', expected namespace/name")]
pub struct ResourceKeyError(pub String);

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for ResourceKey {
    type Err = ResourceKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('/').collect::<Vec<_>>().as_slice() {
            [name] if !name.is_empty() => Ok(ResourceKey::new("", *name)),
            [ns, name] if !name.is_empty() => Ok(ResourceKey::new(*ns, *name)),
            _ => Err(ResourceKeyError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceStatus {
    #[default]
    Pending,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKsqlStatus {
    #[serde(default)]
    pub applied: ResourceStatus,
    #[serde(default)]
    pub item_status: BTreeMap<String, CommandStatus>,
}

/// The declarative record: a block of KSQL text plus the status the
/// reconciler writes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedKsql {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub resource_version: u64,
    pub statement: String,
    #[serde(default)]
    pub status: ManagedKsqlStatus,
}

impl ManagedKsql {
    pub fn new(key: ResourceKey, resource_version: u64, statement: impl Into<String>) -> Self {
        Self {
            namespace: key.namespace,
            name: key.name,
            resource_version,
            statement: statement.into(),
            status: ManagedKsqlStatus::default(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(&self.namespace, &self.name)
    }
}
