use serde::Deserialize;

use mailharvest_core::DEFAULT_BASE_URL;

use crate::error::ConfigResult;

/// Raw project configuration as parsed from `mailharvest.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
}

impl ProjectConfig {
    /// Parse a project config from a TOML string.
    pub fn parse(toml_str: &str) -> ConfigResult<Self> {
        let config: ProjectConfig = toml::from_str(toml_str)?;
        Ok(config)
    }
}

/// Database credentials. String values may reference `${VAR}`.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub sslmode: SslModeConfig,
    /// Table holding the harvested messages.
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslModeConfig {
    Disable,
    #[default]
    Prefer,
    Require,
}

/// Where and how the archive is fetched.
#[derive(Debug, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

/// Commit cadence, throttling and the failure threshold.
#[derive(Debug, Deserialize)]
pub struct HarvestConfig {
    #[serde(default = "default_commit_every")]
    pub commit_every: u64,
    #[serde(default = "default_pause_every")]
    pub pause_every: u64,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            commit_every: default_commit_every(),
            pause_every: default_pause_every(),
            pause_ms: default_pause_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

fn default_port() -> u16 {
    5432
}

fn default_table() -> String {
    "messages".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_commit_every() -> u64 {
    50
}

fn default_pause_every() -> u64 {
    100
}

fn default_pause_ms() -> u64 {
    1000
}

fn default_max_consecutive_failures() -> u32 {
    5
}

/// Resolve environment variables in a string.
/// Supports ${VAR_NAME} syntax; unset variables resolve to the empty string.
pub fn resolve_env(s: &str) -> String {
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
        } else {
            break;
        }
    }

    result
}
