//! Configuration management
//!
//! This module provides YAML-based configuration management with support for:
//! - Environment variable overrides
//! - Multiple configuration file locations
//! - Default values for all settings
//! - Reference registry backend selection

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub request_trace: RequestTraceConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5080
}

/// Session token verification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the session layer that issues tokens
    pub jwt_secret: String,
    /// Accepted clock skew when checking `exp`/`nbf`
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

fn default_leeway() -> u64 {
    30
}

/// Operational store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Upper bound for any single store call made by the pipeline
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_statement_timeout() -> u64 {
    10
}

/// Which kind of reference registry to talk to
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    /// Direct read-only SQL access to the registry database
    #[default]
    Sql,
    /// JSON over HTTP lookup service
    Http,
}

/// External reference registry (persons, legal entities, cities, states)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub backend: RegistryBackend,
    /// Database URL (sql backend) or base URL (http backend)
    pub url: String,
    /// Timeout in seconds (supports both timeout_secs and timeout field names)
    #[serde(default = "default_registry_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_registry_connections")]
    pub max_connections: u32,
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_registry_timeout() -> u64 {
    5
}

fn default_registry_connections() -> u32 {
    5
}

/// Best-effort request trace recording
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequestTraceConfig {
    #[serde(default = "default_trace_enabled")]
    pub enabled: bool,
    /// Records queued beyond this are dropped
    #[serde(default = "default_trace_capacity")]
    pub queue_capacity: usize,
}

fn default_trace_enabled() -> bool {
    true
}

fn default_trace_capacity() -> usize {
    1024
}

impl Default for RequestTraceConfig {
    fn default() -> Self {
        Self {
            enabled: default_trace_enabled(),
            queue_capacity: default_trace_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log output target (console or file)
    #[serde(default = "default_log_target")]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Log file name prefix
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    /// Enable daily log rotation
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Log to console (stdout/stderr) - default for development
    #[default]
    Console,
    /// Log to file with optional rotation - recommended for production
    File,
    /// Log to both console and file
    Both,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_target() -> LogTarget {
    LogTarget::Console
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/pharmacy-registry")
}

fn default_log_prefix() -> String {
    "pharmacy-registry".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: default_log_target(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production-minimum-32-characters-long".to_string(),
                leeway_secs: default_leeway(),
            },
            database: DatabaseConfig {
                url: "sqlite://./data/pharmacy.db".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
                statement_timeout_secs: default_statement_timeout(),
            },
            registry: RegistryConfig {
                backend: RegistryBackend::Sql,
                url: "sqlite://./data/registry.db".to_string(),
                timeout_secs: default_registry_timeout(),
                max_connections: default_registry_connections(),
            },
            logging: LoggingConfig::default(),
            request_trace: RequestTraceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables (prefixed with PHARMREG_)
    pub fn load() -> Result<Self> {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("PHARMREG_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = match config_path {
            Some(ref path) if path.exists() => {
                eprintln!("[CONFIG] Loading configuration from: {:?}", path);
                Self::from_file(path)?
            }
            Some(ref path) => {
                eprintln!("[CONFIG] Config file not found: {:?}, using defaults", path);
                AppConfig::default()
            }
            None => {
                eprintln!("[CONFIG] No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse a single YAML configuration file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/pharmacy-registry/config.yaml"),
            dirs::config_dir()
                .map(|p| p.join("pharmacy-registry/config.yaml"))
                .unwrap_or_default(),
        ];

        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PHARMREG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PHARMREG_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        if let Ok(secret) = std::env::var("PHARMREG_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }

        if let Ok(url) = std::env::var("PHARMREG_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(url) = std::env::var("PHARMREG_REGISTRY_URL") {
            self.registry.url = url;
        }
        if let Ok(backend) = std::env::var("PHARMREG_REGISTRY_BACKEND") {
            self.registry.backend = match backend.to_lowercase().as_str() {
                "http" => RegistryBackend::Http,
                _ => RegistryBackend::Sql,
            };
        }
        if let Ok(timeout) = std::env::var("PHARMREG_REGISTRY_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.registry.timeout_secs = t;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PHARMREG_LOG_FORMAT") {
            self.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            };
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("JWT secret must be at least 32 characters long");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if self.database.statement_timeout_secs == 0 {
            anyhow::bail!("Database statement timeout cannot be 0");
        }

        if self.registry.url.is_empty() {
            anyhow::bail!("Reference registry URL cannot be empty");
        }
        if self.registry.timeout_secs == 0 {
            anyhow::bail!("Reference registry timeout cannot be 0");
        }
        if self.registry.backend == RegistryBackend::Http
            && !(self.registry.url.starts_with("http://") || self.registry.url.starts_with("https://"))
        {
            anyhow::bail!(
                "Reference registry URL must be http(s) for the http backend: {}",
                self.registry.url
            );
        }

        if self.request_trace.enabled && self.request_trace.queue_capacity == 0 {
            anyhow::bail!("Request trace queue capacity cannot be 0");
        }

        Ok(())
    }
}
