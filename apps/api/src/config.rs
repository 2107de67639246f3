use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_RESUME_SERVICE_URL: &str = "http://127.0.0.1:8000/process_resume";
const DEFAULT_BCRYPT_COST: u32 = 12;

/// Where users and sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Users in PostgreSQL, sessions in Redis.
    Postgres,
    /// Process-local maps. Nothing survives a restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Built once in `main` and handed to the components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub session_secret: String,
    pub frontend_origin: String,
    pub resume_service_url: String,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let storage = match lookup("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => StorageBackend::Postgres,
        };

        let (database_url, redis_url) = match storage {
            StorageBackend::Postgres => (
                Some(require("DATABASE_URL")?),
                Some(require("REDIS_URL")?),
            ),
            StorageBackend::Memory => (lookup("DATABASE_URL"), lookup("REDIS_URL")),
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(v) => v
                .parse::<u32>()
                .context("BCRYPT_COST must be an integer")?
                .clamp(4, 31),
            None => DEFAULT_BCRYPT_COST,
        };

        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(v) => v
                .parse::<bool>()
                .context("COOKIE_SECURE must be 'true' or 'false'")?,
            None => false,
        };

        Ok(Config {
            storage,
            database_url,
            redis_url,
            jwt_secret: require("JWT_SECRET")?,
            session_secret: require("SESSION_SECRET")?,
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
            resume_service_url: lookup("RESUME_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_RESUME_SERVICE_URL.to_string()),
            bcrypt_cost,
            cookie_secure,
            port: lookup("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
