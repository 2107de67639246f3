use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{normalize_email, NewUser, User};

/// Owns user records. Nothing else reads or writes the users table.
///
/// Email uniqueness is enforced here, atomically: two concurrent `create`
/// calls for one email cannot both succeed.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Fails with [`AppError::DuplicateEmail`] when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;
}

/// PostgreSQL-backed store. Relies on the `users_email_key` unique constraint.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_user.name.trim())
        .bind(normalize_email(&new_user.email))
        .bind(&new_user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                info!("Created user {}", user.id);
                Ok(user)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::DuplicateEmail)
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

#[derive(Default)]
struct MemoryUsers {
    by_id: HashMap<Uuid, User>,
    email_index: HashMap<String, Uuid>,
}

/// Process-local store for tests and `STORAGE_BACKEND=memory`.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<MemoryUsers>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.by_id.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.inner.read().await;
        Ok(users
            .email_index
            .get(&normalize_email(email))
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let email = normalize_email(&new_user.email);
        // Check and insert under one write lock.
        let mut users = self.inner.write().await;
        if users.email_index.contains_key(&email) {
            return Err(AppError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name.trim().to_string(),
            email: email.clone(),
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.email_index.insert(email, user.id);
        users.by_id.insert(user.id, user.clone());

        info!("Created user {}", user.id);
        Ok(user)
    }
}
