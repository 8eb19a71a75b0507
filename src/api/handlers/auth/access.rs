//! Access tokens: short-lived, self-verifying bearer credentials.
//!
//! Nothing is persisted; validity is signature plus expiry. Tampering,
//! expiry, and malformed input all collapse into the same negative result.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::error::AuthError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

pub struct AccessTokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl AccessTokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        // An expired token must fail the moment it expires.
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Sign a time-boxed token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> Result<(String, DateTime<Utc>), AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AuthError::Internal(anyhow!("failed to sign access token: {err}")))?;
        Ok((token, expires_at))
    }

    /// Check signature integrity and expiry; any failure yields `None`.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims.sub),
            Err(err) => {
                debug!("access token rejected: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn signer(ttl_seconds: i64) -> AccessTokenSigner {
        AccessTokenSigner::new(&SecretString::from("test-signing-secret"), ttl_seconds)
    }

    #[test]
    fn issue_verify_round_trip() -> Result<()> {
        let signer = signer(900);
        let user_id = Uuid::new_v4();
        let (token, expires_at) = signer.issue(user_id)?;
        assert!(expires_at > Utc::now());
        assert_eq!(signer.verify(&token), Some(user_id));
        Ok(())
    }

    #[test]
    fn tampered_token_is_rejected() -> Result<()> {
        let signer = signer(900);
        let (token, _) = signer.issue(Uuid::new_v4())?;

        let mut tampered = token.clone();
        tampered.pop();
        assert_eq!(signer.verify(&tampered), None);

        // A token signed with a different key never verifies.
        let other = AccessTokenSigner::new(&SecretString::from("other-secret"), 900);
        assert_eq!(other.verify(&token), None);
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        let signer = signer(-60);
        let (token, expires_at) = signer.issue(Uuid::new_v4())?;
        assert!(expires_at < Utc::now());
        assert_eq!(signer.verify(&token), None);
        Ok(())
    }

    #[test]
    fn garbage_input_is_rejected() {
        let signer = signer(900);
        assert_eq!(signer.verify(""), None);
        assert_eq!(signer.verify("not-a-jwt"), None);
    }
}
