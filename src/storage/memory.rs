use super::batch::{CommitReceipt, WriteBatch, WriteOp};
use super::document::{Document, OrderBy, StoredDocument, deep_merge};
use super::engine::DocumentStore;
use super::error::{StoreError, StoreResult};
use super::persistence::{DurabilityMode, SnapshotManager, StoreSnapshot};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Documents of one collection keyed by identity.
pub type CollectionDocs = BTreeMap<String, Document>;
/// Every collection keyed by name.
pub type Collections = HashMap<String, CollectionDocs>;

/// Embedded document store.
///
/// Commits are staged on a copy of the collections, written to the snapshot
/// (when durability is enabled) and only then swapped in, so neither readers
/// nor the snapshot ever see half of a batch.
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    persistence: Option<Mutex<SnapshotManager>>,
}

impl MemoryDocumentStore {
    /// A volatile store with no durability.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            persistence: None,
        }
    }

    /// Opens a store under `data_dir`, recovering the last snapshot if there is one.
    pub fn open<P: AsRef<Path>>(data_dir: P, mode: DurabilityMode) -> StoreResult<Self> {
        if mode == DurabilityMode::None {
            return Ok(Self::new());
        }

        let manager = SnapshotManager::in_dir(data_dir);
        let collections = match manager.load()? {
            Some(snapshot) => {
                info!(
                    path = %manager.path().display(),
                    documents = snapshot.metadata.document_count,
                    collections = snapshot.metadata.collection_count,
                    "recovered document store snapshot"
                );
                snapshot.collections
            }
            None => {
                info!(path = %manager.path().display(), "starting with an empty document store");
                HashMap::new()
            }
        };

        Ok(Self {
            collections: RwLock::new(collections),
            persistence: Some(Mutex::new(manager)),
        })
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn document_count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, |docs| docs.len())
    }

    /// Forces a snapshot of the current state.
    pub async fn checkpoint(&self) -> StoreResult<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };
        let collections = self.collections.read().await;
        let snapshot = StoreSnapshot::new(collections.clone());
        write_snapshot(persistence, snapshot).await
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes and writes `snapshot` on the blocking pool. Writers queue on the manager lock.
async fn write_snapshot(
    persistence: &Mutex<SnapshotManager>,
    snapshot: StoreSnapshot,
) -> StoreResult<()> {
    let manager = persistence.lock().await;
    let writer = manager.clone();
    tokio::task::spawn_blocking(move || writer.save(&snapshot))
        .await
        .map_err(|err| StoreError::Unavailable(format!("snapshot writer stopped: {err}")))?
}

fn validate_key(kind: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidOperation(format!("{kind} must not be empty")));
    }
    if value.contains('/') {
        return Err(StoreError::InvalidOperation(format!(
            "{kind} '{value}' must not contain '/'"
        )));
    }
    Ok(())
}

fn apply_op(collections: &mut Collections, op: WriteOp) -> StoreResult<()> {
    validate_key("collection name", op.collection())?;
    validate_key("document id", op.id())?;

    match op {
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            collections.entry(collection).or_default().insert(id, data);
        }
        WriteOp::Merge {
            collection,
            id,
            data,
        } => {
            let docs = collections.entry(collection).or_default();
            match docs.get_mut(&id) {
                Some(existing) => deep_merge(existing, data),
                None => {
                    docs.insert(id, data);
                }
            }
        }
        WriteOp::Delete { collection, id } => {
            if let Some(docs) = collections.get_mut(&collection) {
                docs.remove(&id);
            }
        }
        WriteOp::Increment {
            collection,
            id,
            field,
            by,
        } => {
            let doc = collections
                .entry(collection.clone())
                .or_default()
                .entry(id.clone())
                .or_default();
            let next = match doc.get(&field) {
                None | Some(Value::Null) => Value::from(by),
                Some(Value::Number(current)) => match current.as_i64() {
                    Some(current) => Value::from(current.saturating_add(by)),
                    None => Value::from(current.as_f64().unwrap_or_default() + by as f64),
                },
                Some(_) => {
                    return Err(StoreError::InvalidOperation(format!(
                        "cannot increment non-numeric field '{field}' of {collection}/{id}"
                    )));
                }
            };
            doc.insert(field, next);
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| StoredDocument::new(id, data.clone())))
    }

    async fn list(
        &self,
        collection: &str,
        order: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        let documents: Vec<StoredDocument> = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .map(|(id, data)| StoredDocument::new(id.clone(), data.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        Ok(match order {
            Some(order) => order.apply(documents),
            None => documents,
        })
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        let mut collections = self.collections.write().await;
        let mut staged = collections.clone();

        let mut writes = 0;
        let mut deletes = 0;
        for op in batch.into_ops() {
            if op.is_delete() {
                deletes += 1;
            } else {
                writes += 1;
            }
            apply_op(&mut staged, op)?;
        }

        if let Some(persistence) = &self.persistence {
            let snapshot = StoreSnapshot::new(staged.clone());
            if let Err(err) = write_snapshot(persistence, snapshot).await {
                warn!(error = %err, "snapshot write failed, batch discarded");
                return Err(err);
            }
        }

        *collections = staged;
        debug!(writes, deletes, "batch committed");

        Ok(CommitReceipt {
            writes,
            deletes,
            committed_at: chrono::Utc::now(),
        })
    }
}
