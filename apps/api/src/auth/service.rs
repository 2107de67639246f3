use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::password::PasswordHasher;
use super::sessions::SessionStore;
use super::token::TokenIssuer;
use super::users::CredentialStore;
use crate::errors::AppError;
use crate::models::user::{NewUser, PublicUser};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: PublicUser,
}

/// Orchestrates registration, login, logout and identity resolution.
///
/// Holds no state of its own between calls; everything persistent lives in
/// the credential and session stores.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    sessions: Arc<dyn SessionStore>,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            sessions,
        }
    }

    pub async fn register(
        &self,
        session_id: &str,
        input: RegisterInput,
    ) -> Result<AuthSession, AppError> {
        if is_blank(&input.name) || is_blank(&input.email) || input.password.is_empty() {
            return Err(AppError::Validation(
                "Name, email & password required".to_string(),
            ));
        }

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        // Concurrent registrations can both pass the lookup; create() is the real guard.
        let user = self
            .users
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
            })
            .await?;

        let token = self.open_session(session_id, user.id).await?;
        info!("Registered user {}", user.id);

        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }

    pub async fn login(&self, session_id: &str, input: LoginInput) -> Result<AuthSession, AppError> {
        if is_blank(&input.email) || input.password.is_empty() {
            return Err(AppError::Validation(
                "Email & password required".to_string(),
            ));
        }

        let Some(user) = self.users.find_by_email(&input.email).await? else {
            warn!("Login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            warn!("Login rejected: wrong password for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        let token = self.open_session(session_id, user.id).await?;
        info!("User {} logged in", user.id);

        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }

    /// Resolves the user bound to a session. A missing session, a missing
    /// token, and an invalid or expired token all yield `NotAuthenticated`.
    pub async fn current_user(&self, session_id: Option<&str>) -> Result<PublicUser, AppError> {
        let session_id = session_id.ok_or(AppError::NotAuthenticated)?;
        let token = self
            .sessions
            .get(session_id)
            .await?
            .ok_or(AppError::NotAuthenticated)?;

        let user_id = self
            .tokens
            .verify(&token)
            .map_err(|_| AppError::NotAuthenticated)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    /// Drops the session entry. The token itself stays valid until it
    /// expires; there is no revocation list.
    pub async fn logout(&self, session_id: Option<&str>) -> Result<(), AppError> {
        if let Some(session_id) = session_id {
            self.sessions.destroy(session_id).await?;
            info!("Session closed");
        }
        Ok(())
    }

    async fn open_session(&self, session_id: &str, user_id: Uuid) -> Result<String, AppError> {
        let token = self.tokens.issue(user_id)?;
        self.sessions.set(session_id, &token).await?;
        Ok(token)
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::sessions::MemorySessionStore;
    use crate::auth::users::MemoryCredentialStore;
    use chrono::{Duration, Utc};

    struct Harness {
        auth: Authenticator,
        users: Arc<MemoryCredentialStore>,
        sessions: Arc<MemorySessionStore>,
        tokens: TokenIssuer,
    }

    fn harness() -> Harness {
        let users = Arc::new(MemoryCredentialStore::new());
        let sessions = Arc::new(MemorySessionStore::default());
        let tokens = TokenIssuer::new("test-secret");
        let auth = Authenticator::new(
            users.clone(),
            PasswordHasher::new(4),
            tokens.clone(),
            sessions.clone(),
        );
        Harness {
            auth,
            users,
            sessions,
            tokens,
        }
    }

    fn ana() -> RegisterInput {
        RegisterInput {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "secret1".into(),
        }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login_resolve_same_user() {
        let h = harness();
        let registered = h.auth.register("s1", ana()).await.unwrap();
        let logged_in = h
            .auth
            .login("s2", login("ana@x.com", "secret1"))
            .await
            .unwrap();

        let a = h.tokens.verify(&registered.token).unwrap();
        let b = h.tokens.verify(&logged_in.token).unwrap();
        assert_eq!(a, registered.user.id);
        assert_eq!(a, b);
        assert_eq!(logged_in.user.email, "ana@x.com");
    }

    #[tokio::test]
    async fn test_register_stores_token_in_session() {
        let h = harness();
        let session = h.auth.register("s1", ana()).await.unwrap();
        assert_eq!(
            h.sessions.get("s1").await.unwrap().as_deref(),
            Some(session.token.as_str())
        );
    }

    #[tokio::test]
    async fn test_duplicate_registration_leaves_one_record() {
        let h = harness();
        h.auth.register("s1", ana()).await.unwrap();
        let err = h.auth.register("s2", ana()).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(h.users.user_count().await, 1);
        assert!(h.sessions.get("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_are_validation_errors() {
        let h = harness();
        let mut input = ana();
        input.password.clear();
        assert!(matches!(
            h.auth.register("s1", input).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.auth.login("s1", login("  ", "pw")).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(h.users.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_identical() {
        let h = harness();
        h.auth.register("s1", ana()).await.unwrap();

        let wrong_pw = h
            .auth
            .login("s2", login("ana@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown = h
            .auth
            .login("s2", login("nobody@x.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_pw, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), unknown.to_string());
        assert_eq!(wrong_pw.status(), unknown.status());
    }

    #[tokio::test]
    async fn test_current_user_round_trip() {
        let h = harness();
        let session = h.auth.register("s1", ana()).await.unwrap();
        let me = h.auth.current_user(Some("s1")).await.unwrap();
        assert_eq!(me, session.user);
    }

    #[tokio::test]
    async fn test_current_user_without_session_is_not_authenticated() {
        let h = harness();
        assert!(matches!(
            h.auth.current_user(None).await,
            Err(AppError::NotAuthenticated)
        ));
        assert!(matches!(
            h.auth.current_user(Some("unknown")).await,
            Err(AppError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_cleared_session_is_not_authenticated() {
        let h = harness();
        h.auth.register("s1", ana()).await.unwrap();
        h.auth.logout(Some("s1")).await.unwrap();
        assert!(matches!(
            h.auth.current_user(Some("s1")).await,
            Err(AppError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_logout_does_not_revoke_token() {
        let h = harness();
        let session = h.auth.register("s1", ana()).await.unwrap();
        h.auth.logout(Some("s1")).await.unwrap();
        assert_eq!(h.tokens.verify(&session.token), Ok(session.user.id));
    }

    #[tokio::test]
    async fn test_expired_token_in_session_is_not_authenticated() {
        let h = harness();
        let session = h.auth.register("s1", ana()).await.unwrap();
        let stale = h
            .tokens
            .issue_at(session.user.id, Utc::now() - Duration::days(2))
            .unwrap();
        h.sessions.set("s1", &stale).await.unwrap();
        assert!(matches!(
            h.auth.current_user(Some("s1")).await,
            Err(AppError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_token_for_missing_user_is_not_found() {
        let h = harness();
        let orphan = h.tokens.issue(Uuid::new_v4()).unwrap();
        h.sessions.set("s1", &orphan).await.unwrap();
        assert!(matches!(
            h.auth.current_user(Some("s1")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_login_email_is_case_insensitive() {
        let h = harness();
        h.auth.register("s1", ana()).await.unwrap();
        assert!(h
            .auth
            .login("s2", login("ANA@X.com", "secret1"))
            .await
            .is_ok());
    }
}
