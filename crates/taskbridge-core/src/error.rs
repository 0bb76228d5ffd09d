//! Top-level error types for the bridge binary.
//!
//! Library crates keep their own error enums (`JiraError`, `SyncError`);
//! this module covers configuration and the catch-all used at the CLI edge.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a terminal-friendly message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a short, actionable message for the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Check paths and permissions.",
            AppError::Other(_) => "An unexpected error occurred.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Service type '{0}' is not supported for this operation")]
    UnsupportedService(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "No configuration found. Run `taskbridge init` first.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
            ConfigError::UnsupportedService(_) => {
                "The configured service is not supported yet. Use type = \"jira\"."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let config_err = ConfigError::MissingSetting("project_key".into());
        let app_err: AppError = config_err.into();
        assert!(matches!(
            app_err,
            AppError::Config(ConfigError::MissingSetting(_))
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Config(ConfigError::NotFound(".taskbridge.toml".into()));
        assert_eq!(
            app_err.user_message(),
            "No configuration found. Run `taskbridge init` first."
        );
    }

    #[test]
    fn test_unsupported_service_display() {
        let err = ConfigError::UnsupportedService("linear".into());
        assert!(err.to_string().contains("linear"));
    }
}
