use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stored user. Carries the password hash, so it never leaves the server;
/// convert to [`PublicUser`] before responding.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// The user shape exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Canonical form used for storage and lookup: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@X.com "), "ana@x.com");
    }

    #[test]
    fn test_public_user_has_no_password_field() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "$2b$04$abc".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["name"], "Ana");
    }
}
