use std::error::Error;

use crate::format::FormatError;

/// Base trait for all library errors
pub trait CliconfError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid path '{path}': {message}")]
    Path { path: String, message: String },

    #[error("Could not determine home directory")]
    HomeNotFound,

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Undefined key '{key}'")]
    NotFound { key: String },

    #[error("Config file is read-only '{path}'")]
    ReadOnly { path: String },

    #[error("Unable to write config file '{path}': {message}")]
    Persist { path: String, message: String },

    #[error("No config file loaded")]
    NotLoaded,

    #[error("IO error accessing config: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(key: &str) -> Self {
        ConfigError::NotFound {
            key: key.to_string(),
        }
    }
}

impl CliconfError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Path { .. } => "CONFIG_PATH_ERROR",
            ConfigError::HomeNotFound => "CONFIG_HOME_NOT_FOUND",
            ConfigError::Parse { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::NotFound { .. } => "CONFIG_KEY_NOT_FOUND",
            ConfigError::ReadOnly { .. } => "CONFIG_READ_ONLY",
            ConfigError::Persist { .. } => "CONFIG_PERSIST_FAILED",
            ConfigError::NotLoaded => "CONFIG_NOT_LOADED",
            ConfigError::Io { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::Path { .. }
                | ConfigError::Parse { .. }
                | ConfigError::InvalidValue { .. }
                | ConfigError::NotFound { .. }
                | ConfigError::ReadOnly { .. }
        )
    }
}
