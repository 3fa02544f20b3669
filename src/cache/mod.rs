//! Thin Redis cache wrapper.
//!
//! # Responsibilities
//! - Key/expiry and string operations over a multiplexed connection
//! - Typed JSON helpers (`get_json` / `set_json`)
//!
//! # Design Decisions
//! - `set_json` pairs SET and EXPIRE in one atomic MULTI pipeline
//! - The connection is multiplexed and cloned per call, so the wrapper is
//!   `Clone` and usable from every request handler

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::RedisConfig;
use crate::logging::Logger;

/// Errors from the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("JSON (de)serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Cache service handle. Explicitly constructed at startup and passed to
/// consumers; never a process-wide global.
#[derive(Clone)]
pub struct Cache {
    conn: MultiplexedConnection,
    log: Logger,
}

impl Cache {
    /// Connect to Redis and return the wrapper.
    pub async fn connect(config: &RedisConfig, log: Logger) -> Result<Self, CacheError> {
        log.debug(
            "Starting Redis connection.",
            Some(json!({ "host": config.host, "port": config.port })),
        );
        let client = redis::Client::open(config.url())?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        log.info("Connected to Redis.", None);
        Ok(Self { conn, log })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.clone()
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.conn().exists(key).await?)
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        Ok(self.conn().del(key).await?)
    }

    pub async fn expire(&self, key: &str, seconds: i64) -> Result<bool, CacheError> {
        Ok(self.conn().expire(key, seconds).await?)
    }

    /// Remaining time to live in seconds; negative values follow Redis
    /// semantics (-1 no expiry, -2 no key).
    pub async fn ttl(&self, key: &str) -> Result<i64, CacheError> {
        Ok(self.conn().ttl(key).await?)
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.conn().get(key).await?)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        Ok(self.conn().set(key, value).await?)
    }

    pub async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        Ok(self.conn().incr(key, 1).await?)
    }

    /// Get and deserialize a JSON value. `None` on cache miss. Parse
    /// failures are logged and propagated.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let raw: Option<String> = self.conn().get(key).await?;
        match raw {
            Some(text) => {
                self.log
                    .debug("Fetched JSON from cache.", Some(json!({ "key": key })));
                match serde_json::from_str(&text) {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        self.log.error(
                            "Error parsing JSON object from cache.",
                            Some(json!({ "key": key, "error": e.to_string() })),
                        );
                        Err(e.into())
                    }
                }
            }
            None => Ok(None),
        }
    }

    /// Serialize and store a value with an expiry, atomically.
    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        seconds: i64,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn();
        let result: Result<(), redis::RedisError> = redis::pipe()
            .atomic()
            .set(key, serialized)
            .expire(key, seconds)
            .query_async(&mut conn)
            .await;
        result.map_err(|e| {
            self.log.error(
                "Error setting JSON to cache.",
                Some(json!({ "key": key, "seconds": seconds, "error": e.to_string() })),
            );
            CacheError::Redis(e)
        })
    }
}
