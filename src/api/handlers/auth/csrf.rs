//! CSRF token guard: per-session anti-forgery tokens.
//!
//! Tokens are derived, not stored: HMAC-SHA256 of the session binder under a
//! server key. `GET /auth/csrf` binds to the refresh cookie when one is
//! present, otherwise to a random anonymous id delivered as a companion
//! cookie. Validation recomputes the tag and compares in constant time.

use axum::{
    extract::{Extension, Request},
    http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

use super::error::AuthError;
use super::session::{extract_cookie, CSRF_BINDER_COOKIE_NAME, REFRESH_COOKIE_NAME};
use super::state::AuthState;
use super::types::CsrfResponse;
use super::utils::{generate_token, hash_token};

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

type HmacSha256 = Hmac<Sha256>;

pub struct CsrfGuard {
    key: SecretString,
}

impl CsrfGuard {
    #[must_use]
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Derive the anti-forgery token bound to `session_id`.
    pub fn issue(&self, session_id: &str) -> Result<String, AuthError> {
        let tag = self.tag(session_id)?;
        Ok(URL_SAFE_NO_PAD.encode(tag))
    }

    /// Constant-time check of a presented token; anything malformed or
    /// mismatched fails closed.
    #[must_use]
    pub fn validate(&self, session_id: &str, presented: &str) -> bool {
        let Ok(presented) = URL_SAFE_NO_PAD.decode(presented.trim().as_bytes()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes()) else {
            return false;
        };
        mac.update(session_id.as_bytes());
        mac.verify_slice(&presented).is_ok()
    }

    fn tag(&self, session_id: &str) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid csrf key: {err}")))?;
        mac.update(session_id.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Issue a CSRF token for state-changing requests.
#[utoipa::path(
    get,
    path = "/auth/csrf",
    responses(
        (status = 200, description = "CSRF token issued", body = CsrfResponse)
    ),
    tag = "auth"
)]
pub async fn issue_csrf(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, AuthError> {
    // Bind to the live session when there is one; otherwise mint an anonymous
    // binder cookie so pre-login forms still get forgery protection.
    if let Some(refresh) = extract_cookie(&headers, REFRESH_COOKIE_NAME) {
        let token = auth_state.csrf().issue(&hash_token(&refresh))?;
        return token_response(token);
    }

    let binder = match extract_cookie(&headers, CSRF_BINDER_COOKIE_NAME) {
        Some(binder) => binder,
        None => generate_token().map_err(AuthError::Internal)?,
    };
    let token = auth_state.csrf().issue(&binder)?;
    let cookie = super::session::binder_cookie(auth_state.config(), &binder)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid binder cookie: {err}")))?;

    let mut response = token_response(token)?;
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Token goes out in the body and is mirrored in the `x-csrf-token` header.
fn token_response(token: String) -> Result<Response, AuthError> {
    let header = HeaderValue::from_str(&token)
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("invalid csrf token header: {err}")))?;
    let mut response = Json(CsrfResponse { csrf_token: token }).into_response();
    response
        .headers_mut()
        .insert(HeaderName::from_static(CSRF_HEADER_NAME), header);
    Ok(response)
}

/// Double-submit enforcement on state-changing requests.
///
/// Gated by `AuthConfig::enforce_csrf`; when off the layer is a passthrough.
pub async fn enforce(
    Extension(auth_state): Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    if !auth_state.config().enforce_csrf() || !is_state_changing(request.method()) {
        return next.run(request).await;
    }

    let headers = request.headers();
    let session_id = extract_cookie(headers, REFRESH_COOKIE_NAME)
        .map(|refresh| hash_token(&refresh))
        .or_else(|| extract_cookie(headers, CSRF_BINDER_COOKIE_NAME));
    let presented = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok());

    let valid = match (session_id, presented) {
        (Some(session_id), Some(presented)) => {
            auth_state.csrf().validate(&session_id, presented)
        }
        _ => false,
    };

    if !valid {
        debug!("request rejected by csrf guard");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "invalid csrf token" })),
        )
            .into_response();
    }

    next.run(request).await
}

fn is_state_changing(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> CsrfGuard {
        CsrfGuard::new(SecretString::from("csrf-test-key"))
    }

    #[test]
    fn issue_validate_round_trip() -> anyhow::Result<()> {
        let guard = guard();
        let token = guard.issue("session-a")?;
        assert!(guard.validate("session-a", &token));
        Ok(())
    }

    #[test]
    fn token_is_bound_to_the_session() -> anyhow::Result<()> {
        let guard = guard();
        let token = guard.issue("session-a")?;
        assert!(!guard.validate("session-b", &token));
        Ok(())
    }

    #[test]
    fn mismatch_and_garbage_fail_closed() -> anyhow::Result<()> {
        let guard = guard();
        let token = guard.issue("session-a")?;

        assert!(!guard.validate("session-a", ""));
        assert!(!guard.validate("session-a", "not base64!!"));
        assert!(!guard.validate("session-a", &token[..token.len() - 2]));

        let other = CsrfGuard::new(SecretString::from("different-key"));
        assert!(!other.validate("session-a", &token));
        Ok(())
    }

    #[test]
    fn issue_is_deterministic_per_session() -> anyhow::Result<()> {
        let guard = guard();
        assert_eq!(guard.issue("session-a")?, guard.issue("session-a")?);
        assert_ne!(guard.issue("session-a")?, guard.issue("session-b")?);
        Ok(())
    }

    #[test]
    fn only_non_get_requests_are_state_changing() {
        assert!(!is_state_changing(&Method::GET));
        assert!(!is_state_changing(&Method::HEAD));
        assert!(!is_state_changing(&Method::OPTIONS));
        assert!(is_state_changing(&Method::POST));
        assert!(is_state_changing(&Method::PATCH));
        assert!(is_state_changing(&Method::DELETE));
    }
}
