//! Login endpoint.

use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::error::AuthError;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::session::refresh_cookie;
use super::state::AuthState;
use super::types::{LoginRequest, TokenResponse};
use super::utils::normalize_email;

/// Verify credentials, start a session, and hand out an access token.
///
/// Unknown email, bad password, and unverified account all answer with the
/// same status and message, and an unknown email still burns a hash
/// verification so the branches cost the same.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 400, description = "Missing or malformed payload"),
        (status = 404, description = "Invalid email or password"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation("missing request payload".to_string()));
    };

    let email = normalize_email(&payload.email);
    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return Err(AuthError::RateLimited);
    }

    let Some(user) = auth_state.credentials().find_by_email(&email).await? else {
        auth_state.password().verify_dummy(&payload.password);
        debug!("login attempt for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !auth_state
        .password()
        .verify(&payload.password, &user.password_hash)
    {
        debug!(user_id = %user.id, "login attempt with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    if !user.verified {
        debug!(user_id = %user.id, "login attempt on unverified account");
        return Err(AuthError::InvalidCredentials);
    }

    let grant = auth_state.sessions().issue(user.id).await?;
    let (access_token, expires_at) = auth_state.signer().issue(user.id)?;
    let cookie = refresh_cookie(auth_state.config(), &grant.token)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid session cookie: {err}")))?;

    let mut response = Json(TokenResponse {
        access_token,
        expires_at,
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}
