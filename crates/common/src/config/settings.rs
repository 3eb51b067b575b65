use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_KSQL_URL: &str = "http://ksqldb-server:8088";

/// Top level operator settings, read from `ksql-operator.yml`.
///
/// Every section is optional; a missing file section falls back to the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub ksql: KsqlServerConfig,
    pub workers: usize,
    pub poll: PollConfig,
    pub backoff: BackoffConfig,
    pub queue: QueueConfig,
    pub manifests_dir: PathBuf,
    pub resync_secs: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            ksql: KsqlServerConfig::default(),
            workers: 2,
            poll: PollConfig::default(),
            backoff: BackoffConfig::default(),
            queue: QueueConfig::default(),
            manifests_dir: PathBuf::from("manifests"),
            resync_secs: 30,
        }
    }
}

impl OperatorConfig {
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KsqlServerConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Default for KsqlServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_KSQL_URL.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl KsqlServerConfig {
    /// Basic auth is only sent when a username was configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }
}

/// Command status polling. The wait before attempt `n` is `n * interval`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval_ms: 1000,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Per item requeue delay, doubling from `base_ms` up to `max_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_ms: 5,
            max_ms: 1000 * 1000,
        }
    }
}

/// Overall token bucket shared by every rate limited enqueue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub rate_per_sec: f64,
    pub burst: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            rate_per_sec: 10.0,
            burst: 100,
        }
    }
}
