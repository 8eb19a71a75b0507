//! Single-use verification token registry.
//!
//! One-shot tokens binding a user to a purpose (email verification or
//! password reset) with an expiry. Redemption is a guarded check-and-consume:
//! of any number of concurrent redeemers, exactly one succeeds. Unknown,
//! expired, consumed, and wrong-purpose tokens are indistinguishable to the
//! caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::store::{Collection, Document, Filter, Update};

use super::error::AuthError;
use super::utils::{generate_token, hash_token};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPurpose {
    #[serde(rename = "email-verify")]
    EmailVerify,
    #[serde(rename = "password-reset")]
    PasswordReset,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub purpose: TokenPurpose,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl Document for VerificationRecord {
    const COLLECTION: &'static str = "verifications";

    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct VerificationRegistry {
    tokens: Arc<dyn Collection<VerificationRecord>>,
}

impl VerificationRegistry {
    pub fn new(tokens: Arc<dyn Collection<VerificationRecord>>) -> Self {
        Self { tokens }
    }

    /// Mint a one-shot token for `user_id`, returning the raw value for
    /// out-of-band delivery. Only the hash is stored.
    pub async fn issue(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let token = generate_token().map_err(AuthError::Internal)?;
        let now = Utc::now();
        let record = VerificationRecord {
            id: Uuid::new_v4(),
            user_id,
            token_hash: hash_token(&token),
            purpose,
            created_at: now,
            expires_at: now + ttl,
            consumed: false,
        };
        self.tokens.create(&record).await?;
        Ok(token)
    }

    /// Atomically consume a token and return its owner.
    ///
    /// The consumed flag transitions false to true exactly once; every other
    /// outcome, expiry included, is the same `InvalidToken`.
    pub async fn redeem(&self, presented: &str, purpose: TokenPurpose) -> Result<Uuid, AuthError> {
        let guard = Filter::and(vec![
            Filter::eq("token_hash", hash_token(presented)),
            Filter::eq("purpose", json!(purpose)),
            Filter::eq("consumed", false),
        ]);
        let consumed = self
            .tokens
            .update_one(&guard, &Update::new().set("consumed", true))
            .await?;
        let Some(record) = consumed else {
            debug!("verification token unknown, consumed, or wrong purpose");
            return Err(AuthError::InvalidToken);
        };

        // An expired token is burned by the update above but never honored.
        if record.expires_at <= Utc::now() {
            debug!(user_id = %record.user_id, "verification token expired");
            return Err(AuthError::InvalidToken);
        }

        Ok(record.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCollection;
    use anyhow::Result;

    fn registry() -> VerificationRegistry {
        VerificationRegistry::new(Arc::new(
            MemoryCollection::<VerificationRecord>::new().with_unique("token_hash"),
        ))
    }

    #[tokio::test]
    async fn redeem_returns_the_owner_once() -> Result<()> {
        let registry = registry();
        let user_id = Uuid::new_v4();
        let token = registry
            .issue(user_id, TokenPurpose::EmailVerify, Duration::minutes(30))
            .await?;

        let redeemed = registry.redeem(&token, TokenPurpose::EmailVerify).await?;
        assert_eq!(redeemed, user_id);

        // Second redemption of the same value always fails.
        assert!(matches!(
            registry.redeem(&token, TokenPurpose::EmailVerify).await,
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn purpose_mismatch_fails_without_consuming() -> Result<()> {
        let registry = registry();
        let user_id = Uuid::new_v4();
        let token = registry
            .issue(user_id, TokenPurpose::PasswordReset, Duration::minutes(30))
            .await?;

        assert!(matches!(
            registry.redeem(&token, TokenPurpose::EmailVerify).await,
            Err(AuthError::InvalidToken)
        ));

        // The right purpose still works; the mismatch did not burn the token.
        let redeemed = registry.redeem(&token, TokenPurpose::PasswordReset).await?;
        assert_eq!(redeemed, user_id);
        Ok(())
    }

    #[tokio::test]
    async fn expired_token_never_redeems() -> Result<()> {
        let registry = registry();
        let token = registry
            .issue(
                Uuid::new_v4(),
                TokenPurpose::EmailVerify,
                Duration::seconds(-1),
            )
            .await?;

        assert!(matches!(
            registry.redeem(&token, TokenPurpose::EmailVerify).await,
            Err(AuthError::InvalidToken)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_fails() {
        let registry = registry();
        assert!(matches!(
            registry.redeem("never-issued", TokenPurpose::EmailVerify).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn concurrent_redeems_admit_exactly_one_winner() -> Result<()> {
        let registry = Arc::new(registry());
        let token = registry
            .issue(
                Uuid::new_v4(),
                TokenPurpose::EmailVerify,
                Duration::minutes(5),
            )
            .await?;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                registry.redeem(&token, TokenPurpose::EmailVerify).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await? {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }
}
