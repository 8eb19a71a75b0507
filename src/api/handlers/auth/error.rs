//! Error taxonomy for the auth flows.
//!
//! Component operations return a typed error; this is the single place where
//! an error kind becomes an HTTP status and a generic user-facing message.
//! Internal details are logged here, never returned to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(String),

    /// Unknown email, unverified account, or bad password. Deliberately one
    /// message for all three so callers cannot enumerate accounts.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Unknown, expired, or already-consumed verification token. The caller
    /// cannot tell which sub-check failed.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Missing, expired, revoked, or reused refresh token.
    #[error("unauthorized")]
    Unauthorized,

    #[error("email already registered")]
    Conflict,

    #[error("too many requests")]
    RateLimited,

    /// Backing store timeout or unavailability. Safe for the caller to retry.
    #[error("service unavailable")]
    TransientStore(#[source] StoreError),

    /// Hashing or signing failure.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::TransientStore(err)
    }
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::InvalidToken => StatusCode::BAD_REQUEST,
            // The original service answers bad credentials with a 404-class
            // response; keep that shape for both unknown email and bad password.
            AuthError::InvalidCredentials => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::TransientStore(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::TransientStore(err) => error!("store failure: {err}"),
            AuthError::Internal(err) => error!("internal failure: {err:#}"),
            _ => {}
        }
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
