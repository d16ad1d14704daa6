//! Server-side edit sessions over the ordered collections.
//!
//! Each admin session can hold one draft per collection. Edits only touch the
//! draft; the store sees nothing until the draft is saved. Every draft sits
//! behind its own lock, which a save keeps for the whole reconcile, so edits
//! sent meanwhile apply to the saved result instead of being overwritten.

use super::collections::{CollectionPayload, prepare_payload};
use super::repository::CvRepository;
use crate::core::{CvError, Result};
use crate::reconcile::{EditedCollection, OrderedRecord, ReconcileOutcome};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

type DraftKey = (String, &'static str);
type DraftSlot = Arc<Mutex<Box<dyn Any + Send + Sync>>>;

/// Result of removing a draft row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Removal<T> {
    pub removed: OrderedRecord<T>,
    /// Whether the record was also deleted from the store right away.
    pub deleted_from_store: bool,
}

#[derive(Default)]
pub struct DraftRegistry {
    drafts: Mutex<HashMap<DraftKey, DraftSlot>>,
}

impl DraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key<T: CollectionPayload>(session: &str) -> DraftKey {
        (session.to_string(), T::COLLECTION)
    }

    fn missing<T: CollectionPayload>() -> CvError {
        CvError::NotFound(format!(
            "no draft loaded for {}, load one with POST /api/admin/{}/draft",
            T::COLLECTION,
            T::COLLECTION
        ))
    }

    async fn slot<T: CollectionPayload>(&self, session: &str) -> Result<DraftSlot> {
        self.drafts
            .lock()
            .await
            .get(&Self::key::<T>(session))
            .cloned()
            .ok_or_else(Self::missing::<T>)
    }

    /// Runs `edit` against the session's draft, waiting for a save in progress.
    async fn with_draft<T, R>(
        &self,
        session: &str,
        edit: impl FnOnce(&mut EditedCollection<T>) -> Result<R>,
    ) -> Result<R>
    where
        T: CollectionPayload,
    {
        let slot = self.slot::<T>(session).await?;
        let mut guard = slot.lock().await;
        let draft = guard
            .downcast_mut::<EditedCollection<T>>()
            .ok_or_else(Self::missing::<T>)?;
        edit(draft)
    }

    async fn put<T: CollectionPayload>(&self, session: &str, draft: EditedCollection<T>) {
        let draft: Box<dyn Any + Send + Sync> = Box::new(draft);
        let mut drafts = self.drafts.lock().await;
        let key = Self::key::<T>(session);
        match drafts.get(&key).cloned() {
            Some(slot) => {
                drop(drafts);
                *slot.lock().await = draft;
            }
            None => {
                drafts.insert(key, Arc::new(Mutex::new(draft)));
            }
        }
    }

    /// Replaces the session's draft with the collection as currently stored.
    pub async fn load<T: CollectionPayload>(
        &self,
        repo: &CvRepository,
        session: &str,
    ) -> Result<EditedCollection<T>> {
        let draft = EditedCollection::from_records(repo.load_collection::<T>().await?);
        self.put(session, draft.clone()).await;
        debug!(collection = T::COLLECTION, records = draft.len(), "draft loaded");
        Ok(draft)
    }

    pub async fn get<T: CollectionPayload>(&self, session: &str) -> Result<EditedCollection<T>> {
        self.with_draft(session, |draft: &mut EditedCollection<T>| Ok(draft.clone()))
            .await
    }

    /// Appends a row. The row is checked on its own first, like a form submit.
    pub async fn append<T: CollectionPayload>(
        &self,
        session: &str,
        mut payload: T,
    ) -> Result<EditedCollection<T>> {
        prepare_payload(&mut payload)?;
        self.with_draft(session, |draft: &mut EditedCollection<T>| {
            draft.append(payload);
            Ok(draft.clone())
        })
        .await
    }

    pub async fn replace<T: CollectionPayload>(
        &self,
        session: &str,
        index: usize,
        mut payload: T,
    ) -> Result<EditedCollection<T>> {
        prepare_payload(&mut payload)?;
        self.with_draft(session, |draft: &mut EditedCollection<T>| {
            draft.replace(index, payload)?;
            Ok(draft.clone())
        })
        .await
    }

    pub async fn move_item<T: CollectionPayload>(
        &self,
        session: &str,
        from: usize,
        to: usize,
    ) -> Result<EditedCollection<T>> {
        self.with_draft(session, |draft: &mut EditedCollection<T>| {
            draft.move_item(from, to)?;
            Ok(draft.clone())
        })
        .await
    }

    /// Removes a row from the draft. With `immediate`, a persisted record is
    /// also deleted from the store at once; if that delete fails the row stays
    /// removed from the draft and a [`CvError::Delete`] is returned.
    pub async fn remove<T: CollectionPayload>(
        &self,
        repo: &CvRepository,
        session: &str,
        index: usize,
        immediate: bool,
    ) -> Result<Removal<T>> {
        let removed = self
            .with_draft(session, |draft: &mut EditedCollection<T>| {
                Ok(draft.remove(index)?)
            })
            .await?;

        let deleted_from_store = match (&removed.id, immediate) {
            (Some(id), true) => {
                repo.delete_record::<T>(id).await?;
                true
            }
            _ => false,
        };

        Ok(Removal {
            removed,
            deleted_from_store,
        })
    }

    /// Reconciles the draft. On success the draft becomes the reloaded
    /// collection; on failure it is left exactly as it was. The draft stays
    /// locked until then.
    pub async fn save<T: CollectionPayload>(
        &self,
        repo: &CvRepository,
        session: &str,
    ) -> Result<ReconcileOutcome<T>> {
        let slot = self.slot::<T>(session).await?;
        let mut guard = slot.lock().await;
        let draft = guard
            .downcast_mut::<EditedCollection<T>>()
            .ok_or_else(Self::missing::<T>)?;

        let outcome = repo.save_collection(draft.records().to_vec()).await?;
        *draft = EditedCollection::from_records(outcome.records.clone());
        Ok(outcome)
    }

    /// Drops every draft owned by `session`.
    pub async fn drop_session(&self, session: &str) -> usize {
        let mut drafts = self.drafts.lock().await;
        let before = drafts.len();
        drafts.retain(|(owner, _), _| owner != session);
        let dropped = before - drafts.len();
        if dropped > 0 {
            info!(dropped, "session drafts discarded");
        }
        dropped
    }

    pub async fn len(&self) -> usize {
        self.drafts.lock().await.len()
    }
}
