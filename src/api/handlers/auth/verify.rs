//! Email verification and password reset endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Duration;
use std::sync::Arc;
use tracing::{error, info};

use crate::email::MailMessage;

use super::error::AuthError;
use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::types::{ResetPasswordRedeemRequest, ResetPasswordRequest, VerifyEmailRequest};
use super::utils::{build_reset_url, normalize_email};
use super::verification::TokenPurpose;

const MIN_PASSWORD_CHARS: usize = 8;

/// Redeem an email-verification token and activate the account.
#[utoipa::path(
    post,
    path = "/auth/verify/email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Account verified"),
        (status = 400, description = "Invalid or expired token")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation("missing request payload".to_string()));
    };

    let user_id = auth_state
        .verifications()
        .redeem(&payload.token, TokenPurpose::EmailVerify)
        .await?;
    auth_state.credentials().mark_verified(user_id).await?;
    info!(%user_id, "account verified");

    Ok(StatusCode::OK.into_response())
}

/// Request a password-reset link.
///
/// Always answers 200 whether or not the address is registered, so the
/// endpoint cannot be used to probe for accounts.
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists"),
        (status = 400, description = "Missing or malformed payload"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation("missing request payload".to_string()));
    };

    let email = normalize_email(&payload.email);
    if auth_state
        .rate_limiter()
        .check_email(&email, RateLimitAction::ResetPassword)
        == RateLimitDecision::Limited
    {
        return Err(AuthError::RateLimited);
    }

    // Failures past this point must not change the response, so they are
    // logged and swallowed.
    if let Err(err) = send_reset_link(&auth_state, &email).await {
        error!("failed to process password reset request: {err}");
    }

    Ok(StatusCode::OK.into_response())
}

async fn send_reset_link(auth_state: &AuthState, email: &str) -> Result<(), AuthError> {
    let Some(user) = auth_state.credentials().find_by_email(email).await? else {
        return Ok(());
    };

    let token = auth_state
        .verifications()
        .issue(
            user.id,
            TokenPurpose::PasswordReset,
            Duration::seconds(auth_state.config().reset_token_ttl_seconds()),
        )
        .await?;

    let reset_url = build_reset_url(auth_state.config().base_url(), &token);
    auth_state
        .mailer()
        .send(MailMessage {
            to: user.email,
            subject: "Reset your password".to_string(),
            body: format!("Choose a new password: {reset_url}"),
        })
        .await
        .map_err(AuthError::Internal)?;
    Ok(())
}

/// Redeem a reset token, set the new password, and revoke every live session.
#[utoipa::path(
    post,
    path = "/auth/verify/reset-password",
    request_body = ResetPasswordRedeemRequest,
    responses(
        (status = 200, description = "Password replaced and sessions revoked"),
        (status = 400, description = "Invalid token or password")
    ),
    tag = "auth"
)]
pub async fn verify_reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRedeemRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation("missing request payload".to_string()));
    };
    if payload.new_password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }

    let user_id = auth_state
        .verifications()
        .redeem(&payload.token, TokenPurpose::PasswordReset)
        .await?;

    let password_hash = auth_state.password().hash(&payload.new_password)?;
    auth_state
        .credentials()
        .set_password_hash(user_id, password_hash)
        .await?;

    let revoked = auth_state.sessions().revoke_all_for_user(user_id).await?;
    info!(%user_id, revoked, "password reset completed");

    Ok(StatusCode::OK.into_response())
}
