//! API token model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::helpers::random_hex;

/// An API token belonging to a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: i64,
    #[sqlx(rename = "userId")]
    pub user_id: i64,
    pub token: String,
    #[sqlx(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Token {
    /// A fresh 32-byte random hex token.
    pub fn generate_api_token() -> String {
        random_hex(32, false)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
