pub mod health;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::handlers;
use crate::resume::handlers as resume_handlers;
use crate::state::AppState;

/// Upper bound for resume uploads.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(health::root_handler).post(health::root_handler),
        )
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/auth/register", post(handlers::handle_register))
        .route("/api/auth/login", post(handlers::handle_login))
        .route("/api/auth/me", get(handlers::handle_me))
        .route("/api/auth/logout", post(handlers::handle_logout))
        // Resume API
        .route(
            "/api/resume/analyze",
            post(resume_handlers::handle_analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

/// CORS for the single configured frontend origin, with cookies allowed.
/// Requests from any other origin get no `Access-Control-Allow-Origin` header.
pub fn cors_layer(frontend_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_origin)
        .with_context(|| format!("FRONTEND_ORIGIN '{frontend_origin}' is not a valid header value"))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}
