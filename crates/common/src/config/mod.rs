pub mod error;
pub mod loader;
pub mod settings;

pub use error::ConfigError;
pub use loader::{load_manifests, read_config, CONFIG_FILE_NAME};
pub use settings::{BackoffConfig, KsqlServerConfig, OperatorConfig, PollConfig, QueueConfig};
