use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::auth::sessions::new_session_id;
use crate::auth::service::{AuthSession, LoginInput, RegisterInput};
use crate::errors::AppError;
use crate::models::user::PublicUser;
use crate::state::AppState;

/// Drops the session the caller arrived with. Register and login always bind
/// the new identity to a fresh session id.
async fn retire_session(state: &AppState, previous: Option<String>) -> Result<(), AppError> {
    if let Some(previous) = previous {
        state.auth.logout(Some(&previous)).await?;
    }
    Ok(())
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;
    let previous = state.cookies.session_id(&headers);
    let session_id = new_session_id();
    let session: AuthSession = state.auth.register(&session_id, input).await?;
    retire_session(&state, previous).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, state.cookies.set_cookie(&session_id))],
        Json(session),
    ))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(body)?;
    let previous = state.cookies.session_id(&headers);
    let session_id = new_session_id();
    let session = state.auth.login(&session_id, input).await?;
    retire_session(&state, previous).await?;

    Ok((
        [(header::SET_COOKIE, state.cookies.set_cookie(&session_id))],
        Json(session),
    ))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, AppError> {
    let session_id = state.cookies.session_id(&headers);
    let user = state.auth.current_user(session_id.as_deref()).await?;
    Ok(Json(user))
}

/// POST /api/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let session_id = state.cookies.session_id(&headers);
    state.auth.logout(session_id.as_deref()).await?;

    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, state.cookies.clear_cookie())],
    ))
}
