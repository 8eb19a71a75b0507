//! Authentication flows: credentials, sessions, and verification tokens.
//!
//! Refresh tokens live in an HttpOnly cookie and rotate on every use; access
//! tokens are short-lived signed bearer tokens returned in response bodies.
//! Single-use verification tokens drive email verification and password reset.

use axum::{
    routing::{get, post},
    Router,
};

pub(crate) mod access;
mod credentials;
pub(crate) mod csrf;
mod error;
pub(crate) mod login;
mod password;
mod rate_limit;
pub(crate) mod register;
pub(crate) mod session;
mod sessions;
mod state;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;
pub(crate) mod verify;

pub use error::AuthError;
pub use rate_limit::{NoopRateLimiter, RateLimitAction, RateLimitDecision, RateLimiter};
pub use state::{AuthConfig, AuthState};

pub(crate) use credentials::UserRecord;
pub(crate) use sessions::SessionRecord;
pub(crate) use verification::VerificationRecord;

/// Routes mounted under `/auth`.
pub fn routes() -> Router {
    Router::new()
        .route("/csrf", get(csrf::issue_csrf))
        .route("/login", post(login::login))
        .route("/register", post(register::register))
        .route("/reset-password", post(verify::reset_password))
        .route("/logout", post(session::logout))
        .route("/verify/email", post(verify::verify_email))
        .route("/verify/reset-password", post(verify::verify_reset_password))
        .route("/token/refresh", post(session::refresh))
}
