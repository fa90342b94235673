//! Configuration management
//!
//! This module handles loading and parsing configuration for the Folio server.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. When no database
//! URL is configured at all, the blog is served from Markdown files only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blog configuration
    #[serde(default)]
    pub blog: BlogConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Network tool limits
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Bearer token required by the admin routes. Admin routes are closed when unset.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            admin_token: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (postgres or sqlite)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Connection URL; `None` disables the database entirely
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// Postgres-compatible server (default)
    #[default]
    Postgres,
    /// SQLite, for local development and tests
    Sqlite,
}

impl DatabaseDriver {
    /// Infer the driver from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Root of the Markdown fallback tree (`<content_dir>/<locale>/<slug>.md`)
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    /// Upper bound for every database query, in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Locale used when a request does not name a supported one
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Supported locales
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            query_timeout_ms: default_query_timeout_ms(),
            default_locale: default_locale(),
            locales: default_locales(),
        }
    }
}

impl BlogConfig {
    /// Query timeout as a `Duration`
    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.query_timeout_ms)
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content/blog")
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_locales() -> Vec<String> {
    vec!["en".to_string(), "ru".to_string()]
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    1000
}

/// Limits for the network measurement endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Largest payload served by the download endpoint
    #[serde(default = "default_max_transfer_bytes")]
    pub max_download_bytes: u64,
    /// Largest body accepted by the upload echo endpoint
    #[serde(default = "default_max_transfer_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_download_bytes: default_max_transfer_bytes(),
            max_upload_bytes: default_max_transfer_bytes(),
        }
    }
}

fn default_max_transfer_bytes() -> u64 {
    50 * 1024 * 1024 // 50MB
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables:
    /// - DATABASE_URL (driver inferred from the scheme)
    /// - FOLIO_SERVER_HOST, FOLIO_SERVER_PORT, FOLIO_SERVER_CORS_ORIGIN
    /// - FOLIO_ADMIN_TOKEN
    /// - FOLIO_DATABASE_DRIVER, FOLIO_DATABASE_URL
    /// - FOLIO_CONTENT_DIR, FOLIO_QUERY_TIMEOUT_MS, FOLIO_DEFAULT_LOCALE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blog.locales.is_empty() {
            return Err(ConfigError::ValidationError(
                "blog.locales must list at least one locale".to_string(),
            ));
        }
        if !self.blog.locales.contains(&self.blog.default_locale) {
            return Err(ConfigError::ValidationError(format!(
                "blog.default_locale '{}' is not in blog.locales",
                self.blog.default_locale
            )));
        }
        if self.blog.query_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "blog.query_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("FOLIO_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("FOLIO_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("FOLIO_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(token) = std::env::var("FOLIO_ADMIN_TOKEN") {
            if !token.is_empty() {
                self.server.admin_token = Some(token);
            }
        }

        // DATABASE_URL is the conventional name; the FOLIO_ variant wins if both are set
        for key in ["DATABASE_URL", "FOLIO_DATABASE_URL"] {
            if let Ok(url) = std::env::var(key) {
                if url.is_empty() {
                    continue;
                }
                if let Some(driver) = DatabaseDriver::from_url(&url) {
                    self.database.driver = driver;
                }
                self.database.url = Some(url);
            }
        }
        if let Ok(driver) = std::env::var("FOLIO_DATABASE_DRIVER") {
            if let Some(driver) = DatabaseDriver::parse(&driver) {
                self.database.driver = driver;
            }
        }

        if let Ok(dir) = std::env::var("FOLIO_CONTENT_DIR") {
            self.blog.content_dir = PathBuf::from(dir);
        }
        if let Ok(timeout) = std::env::var("FOLIO_QUERY_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.blog.query_timeout_ms = timeout;
                }
            }
        }
        if let Ok(locale) = std::env::var("FOLIO_DEFAULT_LOCALE") {
            self.blog.default_locale = locale.to_lowercase();
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "DATABASE_URL",
        "FOLIO_SERVER_HOST",
        "FOLIO_SERVER_PORT",
        "FOLIO_SERVER_CORS_ORIGIN",
        "FOLIO_ADMIN_TOKEN",
        "FOLIO_DATABASE_DRIVER",
        "FOLIO_DATABASE_URL",
        "FOLIO_CONTENT_DIR",
        "FOLIO_QUERY_TIMEOUT_MS",
        "FOLIO_DEFAULT_LOCALE",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.admin_token.is_none());
        assert_eq!(config.database.driver, DatabaseDriver::Postgres);
        assert!(config.database.url.is_none());
        assert_eq!(config.blog.content_dir, PathBuf::from("content/blog"));
        assert_eq!(config.blog.query_timeout_ms, 5000);
        assert_eq!(config.blog.default_locale, "en");
        assert_eq!(config.blog.locales, vec!["en", "ru"]);
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.tools.max_download_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "   \n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "blog:\n  query_timeout_ms: 250\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.blog.query_timeout_ms, 250);
        assert_eq!(config.blog.default_locale, "en");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
  admin_token: "s3cret"
database:
  driver: sqlite
  url: "sqlite:data/folio.db"
  max_connections: 2
blog:
  content_dir: "posts"
  query_timeout_ms: 1500
  default_locale: "ru"
  locales: ["ru", "en", "de"]
cache:
  ttl_seconds: 60
tools:
  max_download_bytes: 1024
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.database.url.as_deref(), Some("sqlite:data/folio.db"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.blog.content_dir, PathBuf::from("posts"));
        assert_eq!(config.blog.query_timeout(), std::time::Duration::from_millis(1500));
        assert_eq!(config.blog.default_locale, "ru");
        assert_eq!(config.blog.locales.len(), 3);
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.tools.max_download_bytes, 1024);
        assert_eq!(config.tools.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_default_locale_must_be_supported() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "blog:\n  default_locale: de\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("default_locale"));
    }

    #[test]
    fn test_driver_from_url() {
        assert_eq!(
            DatabaseDriver::from_url("postgres://u:p@host/db"),
            Some(DatabaseDriver::Postgres)
        );
        assert_eq!(
            DatabaseDriver::from_url("postgresql://host/db"),
            Some(DatabaseDriver::Postgres)
        );
        assert_eq!(
            DatabaseDriver::from_url("sqlite::memory:"),
            Some(DatabaseDriver::Sqlite)
        );
        assert_eq!(DatabaseDriver::from_url("mysql://host/db"), None);
    }

    #[test]
    fn test_env_database_url_sets_driver() {
        let _guard = lock_env();
        std::env::set_var("DATABASE_URL", "sqlite:local.db");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite:local.db"));
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);

        std::env::remove_var("DATABASE_URL");
    }

    #[test]
    fn test_env_folio_database_url_wins() {
        let _guard = lock_env();
        std::env::set_var("DATABASE_URL", "sqlite:local.db");
        std::env::set_var("FOLIO_DATABASE_URL", "postgres://db/folio");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("postgres://db/folio"));
        assert_eq!(config.database.driver, DatabaseDriver::Postgres);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("FOLIO_DATABASE_URL");
    }

    #[test]
    fn test_env_override_server_and_blog() {
        let _guard = lock_env();
        std::env::set_var("FOLIO_SERVER_HOST", "10.0.0.1");
        std::env::set_var("FOLIO_SERVER_PORT", "3001");
        std::env::set_var("FOLIO_ADMIN_TOKEN", "token");
        std::env::set_var("FOLIO_CONTENT_DIR", "/srv/posts");
        std::env::set_var("FOLIO_QUERY_TIMEOUT_MS", "800");
        std::env::set_var("FOLIO_DEFAULT_LOCALE", "RU");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.admin_token.as_deref(), Some("token"));
        assert_eq!(config.blog.content_dir, PathBuf::from("/srv/posts"));
        assert_eq!(config.blog.query_timeout_ms, 800);
        assert_eq!(config.blog.default_locale, "ru");

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        std::env::set_var("FOLIO_SERVER_PORT", "not-a-port");
        std::env::set_var("FOLIO_DATABASE_DRIVER", "oracle");
        std::env::set_var("FOLIO_QUERY_TIMEOUT_MS", "0");

        let config = Config::load_with_env(std::path::Path::new("missing.yml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.driver, DatabaseDriver::Postgres);
        assert_eq!(config.blog.query_timeout_ms, 5000);

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }
}
