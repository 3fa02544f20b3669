//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, with
//! defaults on every field so a minimal config works.

use serde::{Deserialize, Serialize};

use crate::logging::file::{DEFAULT_MAX_FILES, DEFAULT_MAX_SIZE};
use crate::logging::Level;

/// Root configuration for the API scaffold.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server and clustering settings.
    pub server: ServerConfig,

    /// Logging sinks and threshold.
    pub logging: LoggingConfig,

    /// Redis cache connection, if any.
    pub redis: Option<RedisConfig>,

    /// Postgres connection, if any.
    pub postgres: Option<PostgresConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Fork one worker per CPU and supervise them. When false the server
    /// runs in the current process.
    pub cluster: bool,

    /// Override the worker count (default: detected CPU parallelism).
    pub workers: Option<usize>,

    /// Plain HTTP port.
    pub http_port: u16,

    /// TLS port, used when `force_https` is set.
    pub https_port: u16,

    /// Serve the app over TLS and 301-redirect plain HTTP traffic.
    pub force_https: bool,

    /// Path to the TLS certificate chain (PEM). Required with `force_https`.
    pub certificate_path: Option<String>,

    /// Path to the TLS private key (PEM). Required with `force_https`.
    pub certificate_key_path: Option<String>,

    /// Request timeout in seconds (the connection keep-alive bound).
    pub keep_alive_secs: u64,

    /// Maximum accepted request body, in bytes.
    pub json_limit_bytes: usize,

    /// Directory served under `/static`.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cluster: true,
            workers: None,
            http_port: 3000,
            https_port: 443,
            force_https: false,
            certificate_path: None,
            certificate_key_path: None,
            keep_alive_secs: 300,
            json_limit_bytes: 1024 * 1024,
            static_dir: "static".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Threshold level; the default passes every level through.
    pub level: Level,

    /// Active log file path.
    pub file: String,

    /// Size cap per file in bytes.
    pub max_size: u64,

    /// Retained file bound, counting the active file.
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::Telemetry,
            file: "logs/api.log".to_string(),
            max_size: DEFAULT_MAX_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
        }
    }
}

impl RedisConfig {
    /// Connection URL for the redis client.
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// Postgres connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub pool_size: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: String::new(),
            user: String::new(),
            password: String::new(),
            pool_size: 5,
        }
    }
}

impl PostgresConfig {
    /// Connection URL for sqlx. The password never appears in logs.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_development_profile() {
        let config = AppConfig::default();
        assert!(config.server.cluster);
        assert_eq!(config.server.http_port, 3000);
        assert!(!config.server.force_https);
        assert_eq!(config.logging.level, Level::Telemetry);
        assert_eq!(config.logging.max_files, 10);
        assert!(config.redis.is_none());
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            http_port = 8080

            [redis]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.http_port, 8080);
        assert!(config.server.cluster);
        let redis = config.redis.unwrap();
        assert_eq!(redis.url(), "redis://localhost:6379");
    }
}
