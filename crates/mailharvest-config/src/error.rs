use thiserror::Error;

/// Errors that can occur when parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid archive url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid table name '{value}': expected letters, digits and underscores, not starting with a digit")]
    InvalidTableName { value: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
