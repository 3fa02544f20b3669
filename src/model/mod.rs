//! User and token model over Postgres.
//!
//! # Design Decisions
//! - Plain sqlx runtime queries, no compile-time schema coupling
//! - Password salt and hash never serialize; clients only ever see the
//!   public projection

pub mod token;
pub mod user;

use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::PostgresConfig;
use crate::logging::Logger;

pub use token::Token;
pub use user::{Role, User};

/// Errors from the model layer.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Database handle, constructed once at startup and shared.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub async fn connect(config: &PostgresConfig, log: &Logger) -> Result<Self, ModelError> {
        log.debug(
            "Connecting to Postgres.",
            Some(json!({ "host": config.host, "port": config.port, "database": config.database })),
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.url())
            .await?;
        log.info("Connected to Postgres.", None);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, ModelError> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "User" WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Unexpired tokens belonging to a user.
    pub async fn valid_tokens(&self, user_id: i64) -> Result<Vec<Token>, ModelError> {
        let tokens = sqlx::query_as::<_, Token>(
            r#"SELECT * FROM "Token" WHERE "userId" = $1 AND "expiresAt" > now()"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tokens)
    }
}
