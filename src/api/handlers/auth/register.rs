//! Registration endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Duration;
use std::sync::Arc;
use tracing::warn;

use crate::email::MailMessage;

use super::error::AuthError;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::types::{RegisterRequest, RegisterResponse};
use super::utils::{build_verify_url, normalize_email, valid_email};

const MIN_PASSWORD_CHARS: usize = 8;

/// Create an unverified account and send the email-verification link.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation("missing request payload".to_string()));
    };

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("invalid email address".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::Register)
        == RateLimitDecision::Limited
    {
        return Err(AuthError::RateLimited);
    }

    let password_hash = auth_state.password().hash(&payload.password)?;
    let user_id = auth_state.credentials().create(&email, password_hash).await?;

    let token = auth_state
        .verifications()
        .issue(
            user_id,
            super::verification::TokenPurpose::EmailVerify,
            Duration::seconds(auth_state.config().email_token_ttl_seconds()),
        )
        .await?;

    // Registration already succeeded; a delivery failure only costs the user
    // a resend, so log it instead of failing the request.
    let verify_url = build_verify_url(auth_state.config().base_url(), &token);
    if let Err(err) = auth_state
        .mailer()
        .send(MailMessage {
            to: email,
            subject: "Verify your email".to_string(),
            body: format!("Confirm your address: {verify_url}"),
        })
        .await
    {
        warn!(%user_id, "failed to send verification email: {err}");
    }

    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user_id })).into_response())
}
