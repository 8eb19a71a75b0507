//! Document store boundary consumed by the handlers.
//!
//! The service does not own persistence: it talks to a collection-oriented
//! store through the [`Collection`] trait using structured key/value filters
//! (equality plus logical AND/OR). The bundled [`MemoryCollection`] engine
//! backs local development and tests; a driver for an external database only
//! has to implement the same trait.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod filter;
mod memory;

pub use filter::{Filter, Update};
pub use memory::MemoryCollection;

/// A record stored in a named collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection name, used for tracing spans.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The call exceeded the configured store timeout. Safe to retry.
    #[error("store call timed out")]
    Timeout,

    /// A unique index rejected the write.
    #[error("unique index violation on field `{0}`")]
    UniqueViolation(&'static str),

    #[error("record serialization failed")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Operations exposed by one collection of documents.
///
/// `update_one` is the concurrency primitive the auth flows rely on: the
/// filter is evaluated and the update applied as one atomic step, so a guard
/// such as `consumed == false` admits exactly one concurrent caller.
#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError>;

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError>;

    async fn create(&self, record: &T) -> Result<Uuid, StoreError>;

    /// Atomically apply `update` to the first document matching `filter`.
    ///
    /// Returns the updated document, or `None` when nothing matched.
    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<Option<T>, StoreError>;

    /// Apply `update` to every matching document, returning the count.
    async fn update_many(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError>;
}
