//! Registration, login and session resolution.
//!
//! `service::Authenticator` is the only place with auth control flow. It
//! composes the credential store, password hasher, token issuer and session
//! store; `handlers` adapts it to HTTP and `cookie` binds browsers to sessions.

pub mod cookie;
pub mod handlers;
pub mod password;
pub mod service;
pub mod sessions;
pub mod token;
pub mod users;

pub use service::{AuthSession, Authenticator, LoginInput, RegisterInput};
