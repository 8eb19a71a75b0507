//! Credential store adapter: exclusive owner of user credential records.
//!
//! Other components never touch the users collection directly; verified flags
//! and password hashes only change through the operations here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::store::{Collection, Document, Filter, StoreError, Update};

use super::error::AuthError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// Always the output of the password hashing policy, never raw input.
    pub password_hash: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }
}

pub struct CredentialStore {
    users: Arc<dyn Collection<UserRecord>>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn Collection<UserRecord>>) -> Self {
        Self { users }
    }

    /// Create a credential record with `verified = false`.
    ///
    /// `email` must already be normalized and `password_hash` already hashed.
    pub async fn create(&self, email: &str, password_hash: String) -> Result<Uuid, AuthError> {
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        match self.users.create(&record).await {
            Ok(id) => Ok(id),
            Err(StoreError::UniqueViolation(_)) => Err(AuthError::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let record = self.users.find_one(&Filter::eq("email", email)).await?;
        Ok(record)
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        let record = self
            .users
            .find_one(&Filter::eq("id", json!(user_id)))
            .await?;
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        let records = self.users.find(&Filter::all()).await?;
        Ok(records)
    }

    /// Flip `verified` to true after a successful email-verify redemption.
    pub async fn mark_verified(&self, user_id: Uuid) -> Result<(), AuthError> {
        let update = Update::new()
            .set("verified", true)
            .set("updated_at", json!(Utc::now()));
        let updated = self
            .users
            .update_one(&Filter::eq("id", json!(user_id)), &update)
            .await?;
        if updated.is_none() {
            // Accounts are never hard-deleted, so a vanished record is a bug.
            error!(%user_id, "verification redeemed for a missing credential record");
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }

    /// Replace the password hash after a reset redemption or password change.
    pub async fn set_password_hash(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<(), AuthError> {
        let update = Update::new()
            .set("password_hash", password_hash)
            .set("updated_at", json!(Utc::now()));
        let updated = self
            .users
            .update_one(&Filter::eq("id", json!(user_id)), &update)
            .await?;
        if updated.is_none() {
            error!(%user_id, "password reset redeemed for a missing credential record");
            return Err(AuthError::InvalidToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCollection;
    use anyhow::Result;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(
            MemoryCollection::<UserRecord>::new().with_unique("email"),
        ))
    }

    #[tokio::test]
    async fn create_starts_unverified() -> Result<()> {
        let store = store();
        let id = store.create("a@b.com", "hash".to_string()).await?;

        let user = store
            .find_by_email("a@b.com")
            .await?
            .expect("user should exist");
        assert_eq!(user.id, id);
        assert!(!user.verified);
        assert_eq!(user.created_at, user.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() -> Result<()> {
        let store = store();
        store.create("a@b.com", "hash".to_string()).await?;

        let err = store
            .create("a@b.com", "other".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn mark_verified_flips_the_flag() -> Result<()> {
        let store = store();
        let id = store.create("a@b.com", "hash".to_string()).await?;
        store.mark_verified(id).await?;

        let user = store.find_by_id(id).await?.expect("user should exist");
        assert!(user.verified);
        assert!(user.updated_at >= user.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn set_password_hash_replaces_the_hash() -> Result<()> {
        let store = store();
        let id = store.create("a@b.com", "old".to_string()).await?;
        store.set_password_hash(id, "new".to_string()).await?;

        let user = store.find_by_id(id).await?.expect("user should exist");
        assert_eq!(user.password_hash, "new");
        Ok(())
    }

    #[tokio::test]
    async fn mutations_on_missing_users_fail() {
        let store = store();
        let err = store.mark_verified(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
