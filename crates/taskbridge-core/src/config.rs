use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".taskbridge.toml";

/// Issues fetched per search page when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: usize = 100;

const DEFAULT_JIRA_PROJECT_KEY: &str = "TEST";
const DEFAULT_JIRA_BASE_URL: &str = "https://your-site.atlassian.net";

const CONFIG_TEMPLATE: &str = r#"# taskbridge configuration
#
# Environment variables override these values:
#   JIRA_PROJECT_KEY, JIRA_BASE_URL, JIRA_EMAIL, JIRA_TOKEN,
#   LINEAR_TEAM_KEY, LINEAR_API_KEY, TASKBRIDGE_BATCH_SIZE

batch_size = 100

[service]
type = "jira"
project_key = "TEST"
base_url = "https://your-site.atlassian.net"
email = ""
token = ""
"#;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Remote tracker the bridge talks to, resolved once when config is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceConfig {
    Jira(JiraServiceConfig),
    Linear(LinearServiceConfig),
}

impl ServiceConfig {
    pub fn type_name(&self) -> &'static str {
        match self {
            ServiceConfig::Jira(_) => "jira",
            ServiceConfig::Linear(_) => "linear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraServiceConfig {
    #[serde(default)]
    pub project_key: String,
    pub base_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

impl Default for JiraServiceConfig {
    fn default() -> Self {
        Self {
            project_key: DEFAULT_JIRA_PROJECT_KEY.to_string(),
            base_url: DEFAULT_JIRA_BASE_URL.to_string(),
            email: String::new(),
            token: String::new(),
        }
    }
}

/// Linear settings. Accepted in config files but not wired to a gateway yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearServiceConfig {
    #[serde(default)]
    pub team_key: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Tracker connection settings
    pub service: ServiceConfig,

    /// Page size for remote searches
    pub batch_size: usize,

    /// Project key used when neither the CLI nor the service names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::Jira(JiraServiceConfig::default()),
            batch_size: DEFAULT_BATCH_SIZE,
            default_project_key: None,
        }
    }
}

/// On-disk shape. Covers both the current `[service]` layout and the legacy
/// `project_key` + `[jira]` layout.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    service: Option<ServiceConfig>,
    batch_size: Option<usize>,
    default_project_key: Option<String>,
    project_key: Option<String>,
    jira: Option<LegacyJiraSection>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyJiraSection {
    base_url: Option<String>,
    email: Option<String>,
    token: Option<String>,
}

impl FileConfig {
    fn resolve(self) -> Config {
        let defaults = Config::default();
        let batch_size = self.batch_size.unwrap_or(defaults.batch_size);

        if let (Some(legacy), None) = (&self.jira, &self.service) {
            tracing::warn!(
                "Using legacy configuration format. Move settings under [service] with type = \"jira\"."
            );
            let fallback = JiraServiceConfig::default();
            let jira = JiraServiceConfig {
                project_key: self
                    .project_key
                    .clone()
                    .unwrap_or(fallback.project_key),
                base_url: legacy.base_url.clone().unwrap_or(fallback.base_url),
                email: legacy.email.clone().unwrap_or_default(),
                token: legacy.token.clone().unwrap_or_default(),
            };
            return Config {
                service: ServiceConfig::Jira(jira),
                batch_size,
                default_project_key: self.default_project_key.or(self.project_key),
            };
        }

        Config {
            service: self.service.unwrap_or(defaults.service),
            batch_size,
            default_project_key: self.default_project_key,
        }
    }
}

impl Config {
    /// Parse a TOML document in either the current or the legacy layout.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(file.resolve())
    }

    /// Load configuration, then apply environment overrides.
    ///
    /// An explicit path must exist. Without one, `.taskbridge.toml` in the
    /// working directory and then the user config directory are tried; if
    /// neither exists the defaults plus environment are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };

        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&contents)?
            }
            None => {
                tracing::debug!("No config file found, using defaults and environment");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reject the configuration when validation reports errors. Warnings are
    /// logged and returned.
    pub fn ensure_valid(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Overlay environment variables. `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match &mut self.service {
            ServiceConfig::Jira(jira) => {
                if let Some(v) = non_empty("JIRA_PROJECT_KEY") {
                    jira.project_key = v;
                }
                if let Some(v) = non_empty("JIRA_BASE_URL") {
                    jira.base_url = v;
                }
                if let Some(v) = non_empty("JIRA_EMAIL") {
                    jira.email = v;
                }
                if let Some(v) = non_empty("JIRA_TOKEN") {
                    jira.token = v;
                }
            }
            ServiceConfig::Linear(linear) => {
                if let Some(v) = non_empty("LINEAR_TEAM_KEY") {
                    linear.team_key = v;
                }
                if let Some(v) = non_empty("LINEAR_API_KEY") {
                    linear.api_key = v;
                }
            }
        }

        if let Some(v) = non_empty("TASKBRIDGE_BATCH_SIZE") {
            match v.trim().parse::<usize>() {
                Ok(size) => self.batch_size = size,
                Err(_) => tracing::warn!("Ignoring non-numeric TASKBRIDGE_BATCH_SIZE: {}", v),
            }
        }
    }

    /// Jira settings, or `UnsupportedService` for any other tracker.
    pub fn jira(&self) -> Result<&JiraServiceConfig, ConfigError> {
        match &self.service {
            ServiceConfig::Jira(jira) => Ok(jira),
            other => Err(ConfigError::UnsupportedService(other.type_name().to_string())),
        }
    }

    /// Project key with precedence: override, service setting, default key.
    pub fn project_key(&self, override_key: Option<&str>) -> Result<String, ConfigError> {
        if let Some(key) = override_key.map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }

        if let ServiceConfig::Jira(jira) = &self.service {
            if !jira.project_key.trim().is_empty() {
                return Ok(jira.project_key.trim().to_string());
            }
        }

        self.default_project_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ConfigError::MissingSetting(
                    "project key (use --project or set service.project_key)".to_string(),
                )
            })
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match &self.service {
            ServiceConfig::Jira(jira) => {
                validate_url(&jira.base_url, "service.base_url", &mut result);

                if jira.email.trim().is_empty() {
                    result.add_error("service.email", "Jira account email is not set");
                }
                if jira.token.trim().is_empty() {
                    result.add_error("service.token", "Jira API token is not set");
                }
                if jira.project_key.trim().is_empty() && self.default_project_key.is_none() {
                    result.add_warning(
                        "service.project_key",
                        "No project key configured; --project will be required",
                    );
                }
            }
            ServiceConfig::Linear(linear) => {
                if linear.api_key.trim().is_empty() {
                    result.add_error("service.api_key", "Linear API key is not set");
                }
                result.add_warning(
                    "service.type",
                    "Linear is accepted in config but export/import only support Jira",
                );
            }
        }

        if self.batch_size == 0 {
            result.add_error("batch_size", "Batch size must be greater than 0");
        } else if self.batch_size > 1000 {
            result.add_warning("batch_size", "Batch size is unusually large (>1000)");
        }

        result
    }

    /// Write the commented default config to `path`.
    pub fn write_template(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(path, CONFIG_TEMPLATE).context("Failed to write config file")?;
        Ok(())
    }

    /// Path used by `init` and by discovery in the working directory.
    pub fn local_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    fn discover() -> Option<PathBuf> {
        let local = Self::local_path();
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("taskbridge").join("config.toml"))
            .filter(|path| path.exists())
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::collections::HashMap;

    fn configured() -> Config {
        Config {
            service: ServiceConfig::Jira(JiraServiceConfig {
                project_key: "OPS".to_string(),
                base_url: "https://acme.atlassian.net".to_string(),
                email: "dev@acme.test".to_string(),
                token: "secret".to_string(),
            }),
            batch_size: 50,
            default_project_key: None,
        }
    }

    #[test]
    fn test_parse_current_layout() {
        let config = Config::from_toml_str(
            r#"
            batch_size = 25

            [service]
            type = "jira"
            project_key = "COL"
            base_url = "https://col.atlassian.net"
            email = "a@b.c"
            token = "t"
            "#,
        )
        .unwrap();

        assert_eq!(config.batch_size, 25);
        let jira = config.jira().unwrap();
        assert_eq!(jira.project_key, "COL");
        assert_eq!(jira.base_url, "https://col.atlassian.net");
    }

    #[test]
    fn test_parse_legacy_layout() {
        let config = Config::from_toml_str(
            r#"
            project_key = "LEG"

            [jira]
            base_url = "https://legacy.atlassian.net"
            email = "old@b.c"
            token = "tok"
            "#,
        )
        .unwrap();

        let jira = config.jira().unwrap();
        assert_eq!(jira.project_key, "LEG");
        assert_eq!(jira.email, "old@b.c");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.default_project_key.as_deref(), Some("LEG"));
    }

    #[test]
    fn test_parse_linear_is_unsupported_for_jira_ops() {
        let config = Config::from_toml_str(
            r#"
            [service]
            type = "linear"
            team_key = "ENG"
            api_key = "lin_123"
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.jira(),
            Err(ConfigError::UnsupportedService(ref s)) if s == "linear"
        ));
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml_str("batch_size = [");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("JIRA_TOKEN", "from-env"),
            ("JIRA_PROJECT_KEY", "ENV"),
            ("JIRA_EMAIL", "   "),
            ("TASKBRIDGE_BATCH_SIZE", "10"),
        ]);

        let mut config = configured();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        let jira = config.jira().unwrap();
        assert_eq!(jira.token, "from-env");
        assert_eq!(jira.project_key, "ENV");
        // Blank values never clobber the file
        assert_eq!(jira.email, "dev@acme.test");
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_project_key_precedence() {
        let mut config = configured();
        assert_eq!(config.project_key(Some("CLI")).unwrap(), "CLI");
        assert_eq!(config.project_key(None).unwrap(), "OPS");

        if let ServiceConfig::Jira(jira) = &mut config.service {
            jira.project_key.clear();
        }
        assert!(matches!(
            config.project_key(None),
            Err(ConfigError::MissingSetting(_))
        ));

        config.default_project_key = Some("DEF".to_string());
        assert_eq!(config.project_key(None).unwrap(), "DEF");
    }

    #[test]
    fn test_valid_config() {
        let result = configured().validate();
        assert!(result.is_valid(), "errors: {:?}", result.errors);
    }

    #[test]
    fn test_default_config_missing_credentials() {
        let result = Config::default().validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "service.email"));
        assert!(result.errors.iter().any(|e| e.field == "service.token"));
    }

    #[test]
    fn test_ensure_valid() {
        assert!(configured().ensure_valid().is_ok());

        let err = Config::default().ensure_valid().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("service.email")));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = configured();
        if let ServiceConfig::Jira(jira) = &mut config.service {
            jira.base_url = "ftp://acme.atlassian.net".to_string();
        }
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_batch_size() {
        let mut config = configured();
        config.batch_size = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "batch_size"));
    }

    #[test]
    fn test_load_explicit_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_write_template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        Config::write_template(&path, false).unwrap();
        assert!(Config::write_template(&path, false).is_err());
        Config::write_template(&path, true).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let config = Config::from_toml_str(&contents).unwrap();
        assert_eq!(config.jira().unwrap().project_key, "TEST");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
