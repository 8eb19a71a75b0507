//! Refresh and logout endpoints plus cookie plumbing.
//!
//! The refresh token travels exclusively in an HttpOnly cookie; the access
//! token only ever appears in response bodies.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use super::error::AuthError;
use super::state::{AuthConfig, AuthState};
use super::types::TokenResponse;

pub(super) const REFRESH_COOKIE_NAME: &str = "bennu_refresh";
pub(super) const CSRF_BINDER_COOKIE_NAME: &str = "bennu_csrf_id";

/// Rotate the refresh session and hand back a fresh access token.
#[utoipa::path(
    post,
    path = "/auth/token/refresh",
    responses(
        (status = 200, description = "Session rotated", body = TokenResponse),
        (status = 401, description = "Invalid, expired, or reused refresh token")
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    let Some(presented) = extract_cookie(&headers, REFRESH_COOKIE_NAME) else {
        return Ok(unauthorized_with_cleared_cookie(auth_state.config()));
    };

    let rotated = match auth_state.sessions().redeem(&presented).await {
        Ok(rotated) => rotated,
        Err(AuthError::Unauthorized) => {
            return Ok(unauthorized_with_cleared_cookie(auth_state.config()));
        }
        Err(err) => return Err(err),
    };

    let (access_token, expires_at) = auth_state.signer().issue(rotated.user_id)?;
    let cookie = refresh_cookie(auth_state.config(), &rotated.grant.token)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid session cookie: {err}")))?;

    let mut response = Json(TokenResponse {
        access_token,
        expires_at,
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Revoke the presented session. Always succeeds, with or without a cookie.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session revoked and cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> Response {
    if let Some(presented) = extract_cookie(&headers, REFRESH_COOKIE_NAME) {
        if let Err(err) = auth_state.sessions().revoke(&presented).await {
            error!("failed to revoke session on logout: {err}");
        }
    }

    // Clear the cookie even when no session record was found.
    let mut response = StatusCode::OK.into_response();
    if let Ok(cookie) = clear_refresh_cookie(auth_state.config()) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

fn unauthorized_with_cleared_cookie(config: &AuthConfig) -> Response {
    let mut response = AuthError::Unauthorized.into_response();
    if let Ok(cookie) = clear_refresh_cookie(config) {
        response.headers_mut().insert(SET_COOKIE, cookie);
    }
    response
}

/// Build the HttpOnly refresh-token cookie.
pub(super) fn refresh_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.refresh_token_ttl_seconds();
    let mut cookie = format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_refresh_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{REFRESH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Cookie carrying the anonymous CSRF binder for pre-login requests.
pub(super) fn binder_cookie(
    config: &AuthConfig,
    binder: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{CSRF_BINDER_COOKIE_NAME}={binder}; Path=/; HttpOnly; SameSite=Lax");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}
