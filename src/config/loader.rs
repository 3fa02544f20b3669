//! Configuration loading from disk.
//!
//! Configuration is kept per environment: `config/development.toml`,
//! `config/integration.toml`, `config/production.toml`. The environment is
//! chosen at startup; a missing file is tolerated for development only,
//! falling back to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;

/// Deployment environment, selected via `--env` or `STOKER_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Integration,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Integration => "integration",
            Environment::Production => "production",
        }
    }

    /// Conventional config file path for this environment.
    pub fn config_path(&self) -> PathBuf {
        PathBuf::from("config").join(format!("{}.toml", self.as_str()))
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Load and validate configuration from an explicit TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration for an environment, at the conventional path.
///
/// Development tolerates a missing file and falls back to defaults; other
/// environments must be configured explicitly.
pub fn load_for_env(env: Environment) -> Result<AppConfig, ConfigError> {
    let path = env.config_path();
    if !path.exists() && env == Environment::Development {
        return Ok(AppConfig::default());
    }
    load_config(&path)
}

/// Semantic checks that serde cannot express.
fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.force_https
        && (server.certificate_path.is_none() || server.certificate_key_path.is_none())
    {
        return Err(ConfigError::Validation(
            "force_https requires certificate_path and certificate_key_path".to_string(),
        ));
    }
    if server.http_port == server.https_port {
        return Err(ConfigError::Validation(
            "http_port and https_port must differ".to_string(),
        ));
    }
    if let Some(0) = server.workers {
        return Err(ConfigError::Validation(
            "workers must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_valid_file() {
        let file = write_config(
            r#"
            [server]
            cluster = false
            http_port = 8080

            [logging]
            level = "debug"
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(!config.server.cluster);
        assert_eq!(config.logging.level, crate::logging::Level::Debug);
    }

    #[test]
    fn force_https_without_certs_is_rejected() {
        let file = write_config(
            r#"
            [server]
            force_https = true
            "#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let file = write_config(
            r#"
            [server]
            workers = 0
            "#,
        );
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/app.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn environment_paths_follow_the_convention() {
        assert_eq!(
            Environment::Production.config_path(),
            PathBuf::from("config/production.toml")
        );
    }
}
