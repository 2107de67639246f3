use std::sync::Arc;

use crate::auth::sessions::MemorySessionStore;
use crate::auth::users::MemoryCredentialStore;
use crate::config::Config;
use crate::state::AppState;

pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

pub fn test_config(resume_service_url: &str) -> Config {
    let resume_service_url = resume_service_url.to_string();
    Config::from_lookup(move |key| {
        match key {
            "STORAGE_BACKEND" => Some("memory"),
            "JWT_SECRET" => Some("test-jwt-secret"),
            "SESSION_SECRET" => Some("test-session-secret"),
            "BCRYPT_COST" => Some("4"),
            "FRONTEND_ORIGIN" => Some(FRONTEND_ORIGIN),
            "RESUME_SERVICE_URL" => return Some(resume_service_url.clone()),
            _ => None,
        }
        .map(str::to_string)
    })
    .expect("test config is valid")
}

/// State over fresh in-memory stores.
pub fn test_state(resume_service_url: &str) -> AppState {
    AppState::with_stores(
        test_config(resume_service_url),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(MemorySessionStore::default()),
    )
    .expect("test state builds")
}
