//! Failure injection around any [`DocumentStore`].
//!
//! Lets callers (mostly tests) simulate a backend that rejects the next few
//! reads or commits, to exercise the error paths of everything above the store.

use super::batch::{CommitReceipt, WriteBatch};
use super::document::{OrderBy, StoredDocument};
use super::engine::DocumentStore;
use super::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FlakyStore<S> {
    inner: S,
    failing_reads: AtomicUsize,
    failing_commits: AtomicUsize,
    commit_attempts: AtomicUsize,
}

impl<S: DocumentStore> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_reads: AtomicUsize::new(0),
            failing_commits: AtomicUsize::new(0),
            commit_attempts: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// The next `count` reads (`get`/`list`) fail.
    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    /// The next `count` commits fail without applying anything.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FlakyStore<S> {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        if Self::take(&self.failing_reads) {
            return Err(StoreError::Unavailable(format!("injected read failure for {collection}/{id}")));
        }
        self.inner.get(collection, id).await
    }

    async fn list(
        &self,
        collection: &str,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        if Self::take(&self.failing_reads) {
            return Err(StoreError::Unavailable(format!("injected read failure for {collection}")));
        }
        self.inner.list(collection, order).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.failing_commits) {
            return Err(StoreError::Unavailable(format!(
                "injected commit failure ({} operations dropped)",
                batch.len()
            )));
        }
        self.inner.commit(batch).await
    }

    fn allocate_id(&self) -> String {
        self.inner.allocate_id()
    }
}
