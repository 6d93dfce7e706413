mod error;
mod project;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use project::{
    resolve_env, ArchiveConfig, DatabaseConfig, HarvestConfig, ProjectConfig, SslModeConfig,
};
pub use validation::{
    to_archive_settings, to_database_settings, to_harvest_policy, validate_project,
    DatabaseSettings,
};
