//! Refresh-token sessions: issuance, rotation, revocation, reuse detection.
//!
//! One record per refresh token ever issued; values are unique across all
//! sessions including revoked ones and are stored hashed. Rotations stay in
//! the family minted at login, so a stolen-and-replayed token can take the
//! whole family down with it.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{Collection, Document, Filter, StoreError, Update};

use super::error::AuthError;
use super::utils::{generate_token, hash_token};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Groups every rotation descending from one login.
    pub family_id: Uuid,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl Document for SessionRecord {
    const COLLECTION: &'static str = "sessions";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// A freshly minted refresh token, raw value included for cookie delivery.
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a successful rotation.
pub struct RotatedSession {
    pub user_id: Uuid,
    pub grant: SessionGrant,
}

pub struct SessionRegistry {
    sessions: Arc<dyn Collection<SessionRecord>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(sessions: Arc<dyn Collection<SessionRecord>>, ttl_seconds: i64) -> Self {
        Self {
            sessions,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Start a new session (new token family) for a login or registration.
    pub async fn issue(&self, user_id: Uuid) -> Result<SessionGrant, AuthError> {
        self.mint(user_id, Uuid::new_v4()).await
    }

    /// Exchange a presented refresh token for a rotated one.
    ///
    /// The presented token is revoked and a replacement minted in the same
    /// family. Presenting an already-revoked token is treated as reuse after
    /// rotation and revokes the entire family.
    pub async fn redeem(&self, presented: &str) -> Result<RotatedSession, AuthError> {
        let token_hash = hash_token(presented);
        let record = self
            .sessions
            .find_one(&Filter::eq("token_hash", token_hash.clone()))
            .await?;
        let Some(record) = record else {
            debug!("refresh token unknown");
            return Err(AuthError::Unauthorized);
        };

        if record.revoked {
            // Reuse of a rotated-out value signals possible token theft.
            warn!(user_id = %record.user_id, family_id = %record.family_id,
                "revoked refresh token presented; revoking session family");
            self.revoke_family(record.family_id).await?;
            return Err(AuthError::Unauthorized);
        }

        if record.expires_at <= Utc::now() {
            debug!(user_id = %record.user_id, "refresh token expired");
            return Err(AuthError::Unauthorized);
        }

        // Guarded flip; when two redeemers race, exactly one gets the record.
        let guard = Filter::and(vec![
            Filter::eq("token_hash", token_hash),
            Filter::eq("revoked", false),
        ]);
        let rotated = self
            .sessions
            .update_one(&guard, &Update::new().set("revoked", true))
            .await?;
        if rotated.is_none() {
            debug!(user_id = %record.user_id, "lost rotation race");
            return Err(AuthError::Unauthorized);
        }

        let grant = self.mint(record.user_id, record.family_id).await?;
        Ok(RotatedSession {
            user_id: record.user_id,
            grant,
        })
    }

    /// Revoke the session behind a presented token. Idempotent: unknown and
    /// already-revoked tokens are not errors.
    pub async fn revoke(&self, presented: &str) -> Result<(), AuthError> {
        let guard = Filter::and(vec![
            Filter::eq("token_hash", hash_token(presented)),
            Filter::eq("revoked", false),
        ]);
        self.sessions
            .update_one(&guard, &Update::new().set("revoked", true))
            .await?;
        Ok(())
    }

    /// Revoke every live session a user holds (password reset).
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let filter = Filter::and(vec![
            Filter::eq("user_id", json!(user_id)),
            Filter::eq("revoked", false),
        ]);
        let revoked = self
            .sessions
            .update_many(&filter, &Update::new().set("revoked", true))
            .await?;
        Ok(revoked)
    }

    async fn revoke_family(&self, family_id: Uuid) -> Result<u64, AuthError> {
        let filter = Filter::and(vec![
            Filter::eq("family_id", json!(family_id)),
            Filter::eq("revoked", false),
        ]);
        let revoked = self
            .sessions
            .update_many(&filter, &Update::new().set("revoked", true))
            .await?;
        Ok(revoked)
    }

    async fn mint(&self, user_id: Uuid, family_id: Uuid) -> Result<SessionGrant, AuthError> {
        // Token values are unique across all sessions ever issued; retry the
        // generate-and-insert on the (unlikely) hash collision.
        for _ in 0..3 {
            let token = generate_token().map_err(AuthError::Internal)?;
            let now = Utc::now();
            let record = SessionRecord {
                id: Uuid::new_v4(),
                user_id,
                family_id,
                token_hash: hash_token(&token),
                issued_at: now,
                expires_at: now + self.ttl,
                revoked: false,
            };
            match self.sessions.create(&record).await {
                Ok(_) => {
                    return Ok(SessionGrant {
                        token,
                        expires_at: record.expires_at,
                    })
                }
                Err(StoreError::UniqueViolation(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        Err(AuthError::Internal(anyhow!(
            "failed to generate a unique session token"
        )))
    }
}
