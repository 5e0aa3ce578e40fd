use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Server configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host address
    #[validate(length(min = 1, message = "HTTP host cannot be empty"))]
    pub http_host: String,

    /// HTTP server port (1-65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "HTTP port must be between 1 and 65535"
    ))]
    pub http_port: u16,

    /// Path to the SQLite catalog database. Empty string selects an
    /// in-memory catalog, which starts empty on every launch.
    #[serde(default)]
    pub database: String,

    /// Absolute URL prefix used for canonical links and the sitemap,
    /// without a trailing slash (e.g. `http://localhost:8080`).
    #[validate(length(min = 1, message = "Site base URL cannot be empty"))]
    pub site_base_url: String,

    /// Per-request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Request timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            database: String::new(),
            site_base_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            http_host: env::var("CLASSDEX_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: parse_env_var("CLASSDEX_PORT", "8080")?,
            database: env::var("CLASSDEX_DATABASE").unwrap_or_default(),
            site_base_url: normalize_base_url(
                env::var("CLASSDEX_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            ),
            request_timeout_secs: parse_env_var("CLASSDEX_REQUEST_TIMEOUT_SECS", "30")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;
        config.site_base_url = normalize_base_url(config.site_base_url);

        config.validate()?;
        Ok(config)
    }
}

/// Strip the trailing slash so path concatenation never doubles it.
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
