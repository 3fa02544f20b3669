//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/<environment>.toml
//!     → loader.rs (parse, deserialize, semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared by value with the supervisor and workers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so a minimal (or absent, in development)
//!   config file works
//! - Workers re-read the same file the master did, selected by the same
//!   environment flag the master passes along on respawn

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_for_env, ConfigError, Environment};
pub use schema::{AppConfig, LoggingConfig, PostgresConfig, RedisConfig, ServerConfig};
