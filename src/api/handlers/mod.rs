//! API route handlers and the collection factory behind them.

pub mod auth;
pub mod health;
pub mod organizations;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use crate::store::{Collection, MemoryCollection};

use self::auth::{SessionRecord, UserRecord, VerificationRecord};
use self::organizations::OrganizationRecord;

/// Hands out the typed collections the handlers run against.
#[derive(Clone)]
pub struct Factory {
    users: Arc<dyn Collection<UserRecord>>,
    organizations: Arc<dyn Collection<OrganizationRecord>>,
    sessions: Arc<dyn Collection<SessionRecord>>,
    verifications: Arc<dyn Collection<VerificationRecord>>,
}

impl Factory {
    /// In-process engine with the unique indexes the flows rely on.
    #[must_use]
    pub fn in_memory(op_timeout: Duration) -> Self {
        Self {
            users: Arc::new(
                MemoryCollection::<UserRecord>::new()
                    .with_unique("email")
                    .with_op_timeout(op_timeout),
            ),
            organizations: Arc::new(
                MemoryCollection::<OrganizationRecord>::new()
                    .with_unique("name")
                    .with_op_timeout(op_timeout),
            ),
            sessions: Arc::new(
                MemoryCollection::<SessionRecord>::new()
                    .with_unique("token_hash")
                    .with_op_timeout(op_timeout),
            ),
            verifications: Arc::new(
                MemoryCollection::<VerificationRecord>::new()
                    .with_unique("token_hash")
                    .with_op_timeout(op_timeout),
            ),
        }
    }

    #[must_use]
    pub fn users(&self) -> Arc<dyn Collection<UserRecord>> {
        Arc::clone(&self.users)
    }

    #[must_use]
    pub fn organizations(&self) -> Arc<dyn Collection<OrganizationRecord>> {
        Arc::clone(&self.organizations)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<dyn Collection<SessionRecord>> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn verifications(&self) -> Arc<dyn Collection<VerificationRecord>> {
        Arc::clone(&self.verifications)
    }
}
