use std::time::Duration;

use mailharvest_core::{ArchiveSettings, HarvestPolicy};

use crate::error::{ConfigError, ConfigResult};
use crate::project::{resolve_env, ArchiveConfig, DatabaseConfig, HarvestConfig, ProjectConfig, SslModeConfig};

/// Database credentials with environment references resolved.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: SslModeConfig,
    pub table: String,
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .field("table", &self.table)
            .finish()
    }
}

/// Validate a whole project configuration.
pub fn validate_project(config: &ProjectConfig) -> ConfigResult<()> {
    to_database_settings(&config.database)?;
    to_archive_settings(&config.archive)?;
    to_harvest_policy(&config.harvest)?;
    Ok(())
}

/// Resolve `${VAR}` references and check the credentials are usable.
pub fn to_database_settings(config: &DatabaseConfig) -> ConfigResult<DatabaseSettings> {
    let settings = DatabaseSettings {
        host: resolve_env(&config.host).trim().to_string(),
        port: config.port,
        database: resolve_env(&config.database).trim().to_string(),
        user: resolve_env(&config.user).trim().to_string(),
        password: resolve_env(&config.pass),
        ssl_mode: config.sslmode,
        table: config.table.clone(),
    };

    require_non_empty("database.host", &settings.host)?;
    require_non_empty("database.database", &settings.database)?;
    require_non_empty("database.user", &settings.user)?;
    validate_table_name(&settings.table)?;

    Ok(settings)
}

pub fn to_archive_settings(config: &ArchiveConfig) -> ConfigResult<ArchiveSettings> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::ZeroValue {
            field: "archive.timeout_secs".into(),
        });
    }

    let base_url = resolve_env(&config.base_url);
    let settings = ArchiveSettings::new(&base_url)
        .map_err(|e| match e {
            mailharvest_core::Error::InvalidUrl { url, message } => {
                ConfigError::InvalidBaseUrl { url, message }
            }
            other => ConfigError::InvalidBaseUrl {
                url: base_url.clone(),
                message: other.to_string(),
            },
        })?
        .timeout(Duration::from_secs(config.timeout_secs))
        .accept_invalid_certs(config.accept_invalid_certs);

    Ok(settings)
}

pub fn to_harvest_policy(config: &HarvestConfig) -> ConfigResult<HarvestPolicy> {
    if config.commit_every == 0 {
        return Err(ConfigError::ZeroValue {
            field: "harvest.commit_every".into(),
        });
    }
    if config.pause_every == 0 {
        return Err(ConfigError::ZeroValue {
            field: "harvest.pause_every".into(),
        });
    }

    Ok(HarvestPolicy {
        commit_every: config.commit_every,
        pause_every: config.pause_every,
        pause: Duration::from_millis(config.pause_ms),
        max_consecutive_failures: config.max_consecutive_failures,
    })
}

fn require_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_table_name(table: &str) -> ConfigResult<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::InvalidTableName {
            value: table.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_validate(toml: &str) -> ConfigResult<()> {
        let config = ProjectConfig::parse(toml)?;
        validate_project(&config)
    }

    const MINIMAL: &str = r#"
[database]
host = "localhost"
database = "mail"
user = "harvester"
"#;

    #[test]
    fn test_validate_minimal_valid() {
        assert!(parse_and_validate(MINIMAL).is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let toml = r#"
[database]
host = "${MAILHARVEST_VALIDATION_UNSET_HOST}"
database = "mail"
user = "harvester"
"#;
        let result = parse_and_validate(toml);
        assert!(matches!(
            result,
            Err(ConfigError::MissingField { field }) if field == "database.host"
        ));
    }

    #[test]
    fn test_validate_resolves_credentials() {
        std::env::set_var("MAILHARVEST_VALIDATION_PASS", "s3cret");
        let toml = r#"
[database]
host = "localhost"
database = "mail"
user = "harvester"
pass = "${MAILHARVEST_VALIDATION_PASS}"
"#;
        let config = ProjectConfig::parse(toml).unwrap();
        let settings = to_database_settings(&config.database).unwrap();

        assert_eq!(settings.password, "s3cret");
        assert!(!format!("{:?}", settings).contains("s3cret"));
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("messages").is_ok());
        assert!(validate_table_name("_sakai_devel2").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2fast").is_err());
        assert!(validate_table_name("messages; DROP TABLE x").is_err());
        assert!(validate_table_name("public.messages").is_err());
    }

    #[test]
    fn test_validate_bad_base_url() {
        let toml = format!("{}\n[archive]\nbase_url = \"ftp://archive.example.org/\"\n", MINIMAL);
        let result = parse_and_validate(&toml);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));

        let toml = format!("{}\n[archive]\nbase_url = \"not a url\"\n", MINIMAL);
        let result = parse_and_validate(&toml);
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_validate_zero_values() {
        let toml = format!("{}\n[archive]\ntimeout_secs = 0\n", MINIMAL);
        assert!(matches!(
            parse_and_validate(&toml),
            Err(ConfigError::ZeroValue { field }) if field == "archive.timeout_secs"
        ));

        let toml = format!("{}\n[harvest]\ncommit_every = 0\n", MINIMAL);
        assert!(matches!(
            parse_and_validate(&toml),
            Err(ConfigError::ZeroValue { field }) if field == "harvest.commit_every"
        ));
    }

    #[test]
    fn test_to_archive_settings() {
        let config = ArchiveConfig {
            base_url: "https://archive.example.org/list".into(),
            timeout_secs: 5,
            accept_invalid_certs: false,
        };
        let settings = to_archive_settings(&config).unwrap();

        assert_eq!(settings.url_for(1), "https://archive.example.org/list/1/2");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert!(!settings.accept_invalid_certs);
    }

    #[test]
    fn test_to_harvest_policy() {
        let policy = to_harvest_policy(&HarvestConfig::default()).unwrap();

        assert_eq!(policy.commit_every, 50);
        assert_eq!(policy.pause_every, 100);
        assert_eq!(policy.pause, Duration::from_secs(1));
        assert_eq!(policy.max_consecutive_failures, 5);
    }
}
