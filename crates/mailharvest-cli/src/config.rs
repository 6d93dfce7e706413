use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use mailharvest_config::{DatabaseSettings, ProjectConfig, SslModeConfig};
use mailharvest_core::{ArchiveSettings, HarvestPolicy};
use mailharvest_pg::{ConnectOptions, SslMode};

/// Read, parse and validate the project config.
pub fn load_config(path: &Path) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {} (run 'mailharvest init' to create one)",
            path.display()
        )
    })?;

    let config = ProjectConfig::parse(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    mailharvest_config::validate_project(&config)
        .with_context(|| format!("Invalid config: {}", path.display()))?;

    Ok(config)
}

pub fn database_settings(config: &ProjectConfig) -> Result<DatabaseSettings> {
    mailharvest_config::to_database_settings(&config.database)
        .context("Invalid [database] configuration")
}

pub fn archive_settings(config: &ProjectConfig) -> Result<ArchiveSettings> {
    mailharvest_config::to_archive_settings(&config.archive)
        .context("Invalid [archive] configuration")
}

pub fn harvest_policy(config: &ProjectConfig) -> Result<HarvestPolicy> {
    mailharvest_config::to_harvest_policy(&config.harvest)
        .context("Invalid [harvest] configuration")
}

pub fn connect_options(settings: &DatabaseSettings) -> ConnectOptions {
    ConnectOptions {
        host: settings.host.clone(),
        port: settings.port,
        database: settings.database.clone(),
        user: settings.user.clone(),
        password: settings.password.clone(),
        ssl_mode: match settings.ssl_mode {
            SslModeConfig::Disable => SslMode::Disable,
            SslModeConfig::Prefer => SslMode::Prefer,
            SslModeConfig::Require => SslMode::Require,
        },
    }
}
