//! User model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// User role, stored and serialized as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum Role {
    Administrator = 1,
    Moderator = 2,
    User = 3,
}

impl From<Role> for i16 {
    fn from(role: Role) -> i16 {
        role as i16
    }
}

impl TryFrom<i16> for Role {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Administrator),
            2 => Ok(Role::Moderator),
            3 => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A registered user.
///
/// The password salt and hash are deliberately excluded from
/// serialization; only the log sink and the database ever see them.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[sqlx(rename = "isActive")]
    pub is_active: bool,
    #[serde(skip_serializing)]
    #[sqlx(rename = "passwordSalt")]
    pub password_salt: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "passwordHash")]
    pub password_hash: String,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// The projection safe to hand to any client.
    pub fn public_json(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "role": self.role,
            "email": self.email,
            "isActive": self.is_active,
        })
    }

    /// Hex SHA-256 of salt + password.
    pub fn generate_password_hash(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check a password attempt against this user's stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        Self::generate_password_hash(&self.password_salt, password) == self.password_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let salt = "salty";
        User {
            id: 1,
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Administrator,
            is_active: true,
            password_salt: salt.to_string(),
            password_hash: User::generate_password_hash(salt, "hunter2"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_is_deterministic_hex() {
        let a = User::generate_password_hash("salt", "password");
        let b = User::generate_password_hash("salt", "password");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, User::generate_password_hash("other", "password"));
    }

    #[test]
    fn verify_password_round_trip() {
        let user = sample_user();
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("hunter3"));
    }

    #[test]
    fn secrets_never_serialize() {
        let user = sample_user();
        let text = serde_json::to_string(&user).unwrap();
        assert!(!text.contains("passwordSalt"));
        assert!(!text.contains("passwordHash"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn public_projection_is_minimal() {
        let value = sample_user().public_json();
        assert_eq!(value["username"], "ada");
        assert_eq!(value["role"], 1);
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn role_predicates() {
        let mut user = sample_user();
        assert!(user.is_administrator());
        assert!(!user.is_moderator());
        user.role = Role::Moderator;
        assert!(user.is_moderator());
    }
}
