//! In-memory document engine.
//!
//! Documents live as JSON objects behind one `RwLock` per collection, so a
//! guarded `update_one` observes and mutates under a single write lock. Every
//! call is bounded by the configured timeout and reports `StoreError::Timeout`
//! when exceeded, mirroring how a remote store driver would behave.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use super::{Collection, Document, Filter, StoreError, Update};

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MemoryCollection<T> {
    docs: RwLock<Vec<Value>>,
    unique: Vec<&'static str>,
    op_timeout: Duration,
    _record: PhantomData<fn() -> T>,
}

impl<T: Document> MemoryCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            unique: Vec::new(),
            op_timeout: DEFAULT_OP_TIMEOUT,
            _record: PhantomData,
        }
    }

    /// Declare a unique index over `field`; `create` rejects duplicates.
    #[must_use]
    pub fn with_unique(mut self, field: &'static str) -> Self {
        self.unique.push(field);
        self
    }

    #[must_use]
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    async fn bounded<F, R>(&self, future: F) -> Result<R, StoreError>
    where
        F: Future<Output = Result<R, StoreError>>,
    {
        match timeout(self.op_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                debug!(collection = T::COLLECTION, "store call exceeded timeout");
                Err(StoreError::Timeout)
            }
        }
    }
}

impl<T: Document> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Document> Collection<T> for MemoryCollection<T> {
    async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        self.bounded(async {
            let docs = self.docs.read().await;
            docs.iter()
                .filter(|doc| filter.matches(doc))
                .map(|doc| serde_json::from_value((*doc).clone()).map_err(StoreError::from))
                .collect()
        })
        .await
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        self.bounded(async {
            let docs = self.docs.read().await;
            docs.iter()
                .find(|doc| filter.matches(doc))
                .map(|doc| serde_json::from_value(doc.clone()).map_err(StoreError::from))
                .transpose()
        })
        .await
    }

    async fn create(&self, record: &T) -> Result<Uuid, StoreError> {
        self.bounded(async {
            let doc = serde_json::to_value(record)?;
            let mut docs = self.docs.write().await;
            for field in &self.unique {
                let value = doc.get(*field);
                if value.is_some() && docs.iter().any(|existing| existing.get(*field) == value) {
                    return Err(StoreError::UniqueViolation(*field));
                }
            }
            docs.push(doc);
            Ok(record.id())
        })
        .await
    }

    async fn update_one(&self, filter: &Filter, update: &Update) -> Result<Option<T>, StoreError> {
        self.bounded(async {
            if update.is_empty() {
                return Ok(None);
            }
            let mut docs = self.docs.write().await;
            let Some(doc) = docs.iter_mut().find(|doc| filter.matches(doc)) else {
                return Ok(None);
            };
            update.apply(doc);
            serde_json::from_value(doc.clone())
                .map(Some)
                .map_err(StoreError::from)
        })
        .await
    }

    async fn update_many(&self, filter: &Filter, update: &Update) -> Result<u64, StoreError> {
        self.bounded(async {
            let mut docs = self.docs.write().await;
            let mut updated = 0;
            for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
                update.apply(doc);
                updated += 1;
            }
            Ok(updated)
        })
        .await
    }
}
