use super::batch::{CommitReceipt, WriteBatch};
use super::document::{Document, OrderBy, StoredDocument, new_document_id};
use super::error::StoreResult;
use async_trait::async_trait;
use std::collections::HashSet;

/// A document database addressed by collection name and document identity.
///
/// Implementations must apply a [`WriteBatch`] atomically: after `commit`
/// returns an error, no operation of the batch is observable.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Lists a collection, optionally ordered. Unordered listings come back sorted by identity.
    async fn list(&self, collection: &str, order: Option<&OrderBy>)
    -> StoreResult<Vec<StoredDocument>>;

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt>;

    fn allocate_id(&self) -> String {
        new_document_id()
    }

    async fn list_ids(&self, collection: &str) -> StoreResult<HashSet<String>> {
        Ok(self
            .list(collection, None)
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect())
    }

    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(collection, id, data);
        self.commit(batch).await.map(|_| ())
    }

    async fn merge(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.merge(collection, id, data);
        self.commit(batch).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch).await.map(|_| ())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> StoreResult<()> {
        let mut batch = WriteBatch::new();
        batch.increment(collection, id, field, by);
        self.commit(batch).await.map(|_| ())
    }

    /// Stores `data` under a freshly allocated identity and returns it.
    async fn add(&self, collection: &str, data: Document) -> StoreResult<String> {
        let id = self.allocate_id();
        self.set(collection, &id, data).await?;
        Ok(id)
    }
}
