use crate::config::error::ConfigError;
use crate::config::settings::OperatorConfig;
use crate::types::ManagedKsql;
use crate::utils::paths_with_ext;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "ksql-operator.yml";

const ENV_URL: &str = "KSQL_URL";
const ENV_USERNAME: &str = "KSQL_USERNAME";
const ENV_PASSWORD: &str = "KSQL_PASSWORD";

/// Loads the operator configuration.
///
/// `config_path` may name the file itself or the directory holding
/// `ksql-operator.yml`. Without an explicit path a missing file is not an
/// error and the defaults are used. `KSQL_URL`, `KSQL_USERNAME` and
/// `KSQL_PASSWORD` override whatever the file says.
pub fn read_config(config_path: Option<PathBuf>) -> Result<OperatorConfig, ConfigError> {
    read_config_with_env(config_path, |key| std::env::var(key).ok())
}

pub fn read_config_with_env<F>(
    config_path: Option<PathBuf>,
    env: F,
) -> Result<OperatorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = config_path.is_some();
    let file_path = match config_path {
        Some(p) if p.is_dir() => p.join(CONFIG_FILE_NAME),
        Some(p) => p,
        None => PathBuf::from(CONFIG_FILE_NAME),
    };

    let mut config = if file_path.exists() {
        info!(path = %file_path.display(), "loading operator config");
        let file = fs::File::open(&file_path)?;
        let parsed: Option<OperatorConfig> = serde_yaml::from_reader(file)?;
        parsed.unwrap_or_default()
    } else if explicit {
        return Err(ConfigError::incorrect_path(&file_path));
    } else {
        debug!("no {CONFIG_FILE_NAME} found, using defaults");
        OperatorConfig::default()
    };

    if let Some(url) = env(ENV_URL).filter(|v| !v.is_empty()) {
        config.ksql.url = url;
    }
    if let Some(username) = env(ENV_USERNAME) {
        config.ksql.username = username;
    }
    if let Some(password) = env(ENV_PASSWORD) {
        config.ksql.password = password;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &OperatorConfig) -> Result<(), ConfigError> {
    if config.workers == 0 {
        return Err(ConfigError::invalid_value("workers", "must be at least 1"));
    }
    if config.poll.attempts == 0 {
        return Err(ConfigError::invalid_value("poll.attempts", "must be at least 1"));
    }
    if config.backoff.base_ms > config.backoff.max_ms {
        return Err(ConfigError::invalid_value(
            "backoff",
            format!(
                "base_ms ({}) exceeds max_ms ({})",
                config.backoff.base_ms, config.backoff.max_ms
            ),
        ));
    }
    if config.queue.rate_per_sec.is_nan() || config.queue.rate_per_sec <= 0.0 {
        return Err(ConfigError::invalid_value("queue.rate_per_sec", "must be positive"));
    }
    Ok(())
}

/// Reads every `*.yml` manifest below `dir`, one [`ManagedKsql`] per file.
pub fn load_manifests(dir: &Path) -> Result<Vec<ManagedKsql>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::incorrect_path(dir));
    }
    let mut seen = HashSet::new();
    let mut resources = Vec::new();
    for path in paths_with_ext(dir, "yml") {
        debug!(path = %path.display(), "loading manifest");
        let file = fs::File::open(&path)?;
        let resource: ManagedKsql = serde_yaml::from_reader(file).map_err(|e| {
            ConfigError::parse_error(format!("manifest '{}': {e}", path.display()))
        })?;
        if !seen.insert(resource.key()) {
            return Err(ConfigError::duplicate_resource(resource.key().to_string(), &path));
        }
        resources.push(resource);
    }
    Ok(resources)
}
