//! Ordered collection reconciliation.
//!
//! The admin edits a collection as an ordered list of records. Saving that list
//! diffs it against the identities currently stored and applies, in a single
//! atomic batch, a delete for every stored identity the list no longer carries
//! and an upsert for every element with `order` set to its index.
//!
//! ```text
//!   persisted {A, B, C}          edited [A:X, new:Y, B:Z]
//!          │                              │
//!          └──────────► plan ◄────────────┘
//!                        │
//!        delete C · set A{X,order:0} · set n{Y,order:1} · set B{Z,order:2}
//!                        │
//!                   commit (atomic)
//!                        │
//!               reload ordered by `order`
//! ```

pub mod collection;

pub use collection::{EditError, EditedCollection};

use crate::core::{CvError, Result, ValidationErrors};
use crate::storage::{
    CommitReceipt, Document, DocumentStore, OrderBy, StoreError, StoreResult, StoredDocument,
    WriteBatch, to_document,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Field holding a record's zero-based position.
pub const ORDER_FIELD: &str = "order";

/// A record of an ordered collection.
///
/// `id` is present iff the record has been persisted. `order` is the position
/// the record had at its last save; it is recomputed from the list index on
/// every save and never edited on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRecord<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> OrderedRecord<T> {
    /// A record that has never been saved.
    pub fn new(payload: T) -> Self {
        Self {
            id: None,
            order: 0,
            payload,
        }
    }

    pub fn persisted(id: impl Into<String>, order: u32, payload: T) -> Self {
        Self {
            id: Some(id.into()),
            order,
            payload,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl<T: DeserializeOwned> OrderedRecord<T> {
    pub fn from_document(doc: &StoredDocument) -> StoreResult<Self> {
        let order = match doc.field(ORDER_FIELD) {
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    StoreError::Codec(format!("document '{}' has an invalid order {n}", doc.id))
                })?,
            _ => 0,
        };
        Ok(Self {
            id: Some(doc.id.clone()),
            order,
            payload: doc.decode()?,
        })
    }
}

/// One upsert the plan will issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub id: String,
    pub order: u32,
    /// The identity was allocated by this plan.
    pub created: bool,
}

/// The store operations a save resolves to, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Persisted identities absent from the edited list, sorted.
    pub deletes: Vec<String>,
    /// One write per edited element, in list order.
    pub writes: Vec<PlannedWrite>,
}

impl ReconcilePlan {
    /// Diffs `edited` against `persisted`. `allocate` provides identities for new records.
    pub fn compute<T>(
        persisted: &HashSet<String>,
        edited: &[OrderedRecord<T>],
        mut allocate: impl FnMut() -> String,
    ) -> Result<Self> {
        check_identities(edited)?;

        let submitted: HashSet<&str> = edited.iter().filter_map(|r| r.id.as_deref()).collect();
        let mut deletes: Vec<String> = persisted
            .iter()
            .filter(|id| !submitted.contains(id.as_str()))
            .cloned()
            .collect();
        deletes.sort();

        let mut writes = Vec::with_capacity(edited.len());
        for (index, record) in edited.iter().enumerate() {
            let order = u32::try_from(index)
                .map_err(|_| CvError::validation("records", "too many records in one collection"))?;
            let write = match &record.id {
                Some(id) => PlannedWrite {
                    id: id.clone(),
                    order,
                    created: false,
                },
                None => PlannedWrite {
                    id: allocate(),
                    order,
                    created: true,
                },
            };
            writes.push(write);
        }

        Ok(Self { deletes, writes })
    }

    /// Builds the batch: deletes first, then one `set` per element carrying its order.
    pub fn to_batch<T, F>(
        &self,
        collection: &str,
        edited: &[OrderedRecord<T>],
        mapper: &F,
    ) -> StoreResult<WriteBatch>
    where
        F: Fn(&T) -> StoreResult<Document>,
    {
        let mut batch = WriteBatch::new();
        for id in &self.deletes {
            batch.delete(collection, id);
        }
        for (write, record) in self.writes.iter().zip(edited) {
            let mut data = mapper(&record.payload)?;
            data.remove("id");
            data.insert(ORDER_FIELD.to_string(), Value::from(write.order));
            batch.set(collection, &write.id, data);
        }
        Ok(batch)
    }
}

/// Rejects blank and duplicated identities inside one edited list.
fn check_identities<T>(edited: &[OrderedRecord<T>]) -> Result<()> {
    let mut errors = ValidationErrors::new();
    let mut seen = HashSet::new();
    for (index, record) in edited.iter().enumerate() {
        let Some(id) = record.id.as_deref() else {
            continue;
        };
        if id.trim().is_empty() {
            errors.push(format!("[{index}].id"), "identity must not be blank");
        } else if !seen.insert(id) {
            errors.push(format!("[{index}].id"), format!("identity '{id}' appears more than once"));
        }
    }
    errors.into_result()
}

/// What a successful save did, with the collection as reloaded afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome<T> {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub records: Vec<OrderedRecord<T>>,
    pub receipt: CommitReceipt,
}

/// Serde mapper used when the payload is stored exactly as it serializes.
pub fn serde_mapper<T: Serialize>(payload: &T) -> StoreResult<Document> {
    to_document(payload)
}

/// Loads a collection ordered by `order` ascending.
pub async fn load_ordered<S, T>(store: &S, collection: &str) -> Result<Vec<OrderedRecord<T>>>
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned,
{
    let documents = store
        .list(collection, Some(&OrderBy::asc(ORDER_FIELD)))
        .await
        .map_err(|e| {
            warn!(collection, error = %e, "failed to list collection");
            CvError::fetch(&format!("loading {collection}"), e)
        })?;

    documents
        .iter()
        .map(OrderedRecord::from_document)
        .collect::<StoreResult<Vec<_>>>()
        .map_err(|e| {
            warn!(collection, error = %e, "stored document does not decode");
            CvError::fetch(&format!("decoding {collection}"), e)
        })
}

/// Saves `edited` as the new content of `collection`.
///
/// Nothing is written unless every operation can be applied: a failed commit
/// is reported as [`CvError::Persistence`] and leaves the store untouched, so
/// the caller can keep its edited list and retry.
pub async fn reconcile<S, T, F>(
    store: &S,
    collection: &str,
    edited: &[OrderedRecord<T>],
    mapper: F,
) -> Result<ReconcileOutcome<T>>
where
    S: DocumentStore + ?Sized,
    T: DeserializeOwned + Send + Sync,
    F: Fn(&T) -> StoreResult<Document> + Send + Sync,
{
    check_identities(edited)?;

    let persisted = store.list_ids(collection).await.map_err(|e| {
        warn!(collection, error = %e, "failed to read persisted identities");
        CvError::fetch(&format!("reading {collection} before save"), e)
    })?;

    let plan = ReconcilePlan::compute(&persisted, edited, || store.allocate_id())?;
    let batch = plan
        .to_batch(collection, edited, &mapper)
        .map_err(|e| CvError::persistence(&format!("encoding {collection}"), e))?;
    debug!(collection, operations = batch.len(), "submitting reconcile batch");

    let receipt = store.commit(batch).await.map_err(|e| {
        warn!(collection, error = %e, "reconcile batch rejected, nothing was written");
        CvError::persistence(&format!("saving {collection}"), e)
    })?;

    let (created, updated): (Vec<&PlannedWrite>, Vec<&PlannedWrite>) =
        plan.writes.iter().partition(|w| w.created);
    let created: Vec<String> = created.into_iter().map(|w| w.id.clone()).collect();
    let updated: Vec<String> = updated.into_iter().map(|w| w.id.clone()).collect();

    info!(
        collection,
        created = created.len(),
        updated = updated.len(),
        deleted = plan.deletes.len(),
        "collection saved"
    );

    let records = load_ordered(store, collection).await?;

    Ok(ReconcileOutcome {
        created,
        updated,
        deleted: plan.deletes,
        records,
        receipt,
    })
}
