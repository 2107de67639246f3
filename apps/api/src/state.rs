use std::sync::Arc;

use anyhow::{Context, Result};

use crate::auth::cookie::SessionCookies;
use crate::auth::password::PasswordHasher;
use crate::auth::sessions::{MemorySessionStore, RedisSessionStore, SessionStore, SESSION_TTL};
use crate::auth::token::TokenIssuer;
use crate::auth::users::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use crate::auth::Authenticator;
use crate::config::{Config, StorageBackend};
use crate::db::create_pool;
use crate::resume::ResumeAnalyzer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub auth: Authenticator,
    pub cookies: SessionCookies,
    pub resume: ResumeAnalyzer,
    pub config: Config,
}

impl AppState {
    /// Wires every component from the configuration. Secrets flow from here
    /// into the token issuer and cookie signer and nowhere else.
    pub async fn from_config(config: Config) -> Result<Self> {
        let (users, sessions) = match config.storage {
            StorageBackend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let redis_url = config
                    .redis_url
                    .clone()
                    .context("REDIS_URL is required for the postgres backend")?;

                let db = create_pool(database_url).await?;
                let redis = redis::Client::open(redis_url)?;
                let sessions = RedisSessionStore::connect(redis, SESSION_TTL)
                    .await
                    .context("Failed to connect to Redis")?;
                tracing::info!("Redis session store initialized");

                let users: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db));
                let sessions: Arc<dyn SessionStore> = Arc::new(sessions);
                (users, sessions)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; users and sessions are not persisted");
                let users: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
                let sessions: Arc<dyn SessionStore> =
                    Arc::new(MemorySessionStore::new(SESSION_TTL));
                (users, sessions)
            }
        };

        Self::with_stores(config, users, sessions)
    }

    pub fn with_stores(
        config: Config,
        users: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let auth = Authenticator::new(
            users,
            PasswordHasher::new(config.bcrypt_cost),
            TokenIssuer::new(&config.jwt_secret),
            sessions,
        );
        let cookies = SessionCookies::new(&config.session_secret, config.cookie_secure);
        let resume = ResumeAnalyzer::new(config.resume_service_url.clone())?;

        Ok(AppState {
            auth,
            cookies,
            resume,
            config,
        })
    }
}
