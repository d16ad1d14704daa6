use super::collections::{CollectionPayload, prepare_records};
use super::models::{
    ContactMessage, CvData, CvStats, DashboardStats, NewContactMessage, PersonalInfo,
};
use super::theme::{ThemePalette, default_palette, find_palette};
use super::validation::{validate_contact, validate_personal_info};
use crate::core::{CvError, Language, Result};
use crate::reconcile::{OrderedRecord, ReconcileOutcome, load_ordered, reconcile};
use crate::storage::{DocumentStore, to_document};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CV_DATA: &str = "cv-data";
pub const PERSONAL_INFO_ID: &str = "personalInfo";
pub const THEME_ID: &str = "theme";
pub const STATS: &str = "stats";
pub const STATS_ID: &str = "cv";
pub const CONTACTS: &str = "contacts";

/// Every read and write the application performs, expressed against a [`DocumentStore`].
///
/// Store errors stop here: each operation turns them into a [`CvError`] and logs them.
#[derive(Clone)]
pub struct CvRepository {
    store: Arc<dyn DocumentStore>,
}

impl CvRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Public read path
    // ------------------------------------------------------------------

    pub async fn load_cv(&self) -> Result<CvData> {
        Ok(CvData {
            personal_info: self.personal_info().await?,
            experiences: self.load_collection().await?,
            education: self.load_collection().await?,
            skills: self.load_collection().await?,
            projects: self.load_collection().await?,
        })
    }

    pub async fn personal_info(&self) -> Result<Option<PersonalInfo>> {
        let doc = self
            .store
            .get(CV_DATA, PERSONAL_INFO_ID)
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to read personal info");
                CvError::fetch("loading personal info", e)
            })?;
        doc.map(|d| d.decode::<PersonalInfo>())
            .transpose()
            .map_err(|e| CvError::fetch("decoding personal info", e))
    }

    /// Active palette. Falls back to the default palette when none is stored or the read fails.
    pub async fn theme(&self) -> ThemePalette {
        match self.store.get(CV_DATA, THEME_ID).await {
            Ok(Some(doc)) => match doc.decode::<ThemePalette>() {
                Ok(palette) => palette,
                Err(e) => {
                    warn!(error = %e, "stored theme is malformed, using default");
                    default_palette().clone()
                }
            },
            Ok(None) => default_palette().clone(),
            Err(e) => {
                warn!(error = %e, "could not fetch theme, falling back to default");
                default_palette().clone()
            }
        }
    }

    // ------------------------------------------------------------------
    // Counters and contact messages
    // ------------------------------------------------------------------

    pub async fn record_view(&self) -> Result<()> {
        self.bump_stat("views").await
    }

    pub async fn record_download(&self) -> Result<()> {
        self.bump_stat("downloads").await
    }

    async fn bump_stat(&self, field: &str) -> Result<()> {
        self.store
            .increment(STATS, STATS_ID, field, 1)
            .await
            .map_err(|e| {
                warn!(field, error = %e, "failed to update counter");
                CvError::persistence(&format!("counting {field}"), e)
            })
    }

    pub async fn stats(&self) -> Result<CvStats> {
        let doc = self.store.get(STATS, STATS_ID).await.map_err(|e| {
            warn!(error = %e, "failed to read stats");
            CvError::fetch("loading stats", e)
        })?;
        match doc {
            Some(doc) => doc.decode().map_err(|e| CvError::fetch("decoding stats", e)),
            None => Ok(CvStats::default()),
        }
    }

    pub async fn submit_contact(&self, message: NewContactMessage) -> Result<ContactMessage> {
        let lang = message
            .lang
            .as_deref()
            .and_then(|l| l.parse::<Language>().ok())
            .unwrap_or_default();
        validate_contact(&message, lang)?;

        let mut contact = ContactMessage {
            id: None,
            name: message.name.trim().to_string(),
            email: message.email.trim().to_string(),
            message: message.message.trim().to_string(),
            created_at: chrono::Utc::now(),
        };
        let data = to_document(&contact).map_err(|e| CvError::persistence("encoding contact", e))?;
        let id = self.store.add(CONTACTS, data).await.map_err(|e| {
            warn!(error = %e, "failed to store contact message");
            CvError::persistence("saving contact message", e)
        })?;
        info!(%id, "contact message received");
        contact.id = Some(id);
        Ok(contact)
    }

    /// Contact messages, newest first.
    pub async fn contacts(&self) -> Result<Vec<ContactMessage>> {
        let docs = self.store.list(CONTACTS, None).await.map_err(|e| {
            warn!(error = %e, "failed to list contacts");
            CvError::fetch("loading contacts", e)
        })?;

        let mut contacts = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut contact: ContactMessage = match doc.decode() {
                Ok(contact) => contact,
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping malformed contact message");
                    continue;
                }
            };
            contact.id = Some(doc.id);
            contacts.push(contact);
        }
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(contacts)
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let stats = self.stats().await?;
        let contacts = self.store.list_ids(CONTACTS).await.map_err(|e| {
            warn!(error = %e, "failed to count contacts");
            CvError::fetch("counting contacts", e)
        })?;
        Ok(DashboardStats {
            views: stats.views,
            downloads: stats.downloads,
            contacts: contacts.len(),
        })
    }

    // ------------------------------------------------------------------
    // Admin writes
    // ------------------------------------------------------------------

    /// Validates and merges the profile, returning it as stored.
    pub async fn save_personal_info(&self, info: PersonalInfo) -> Result<PersonalInfo> {
        validate_personal_info(&info)?;
        let data =
            to_document(&info).map_err(|e| CvError::persistence("encoding personal info", e))?;
        self.store
            .merge(CV_DATA, PERSONAL_INFO_ID, data)
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to save personal info");
                CvError::persistence("saving personal info", e)
            })?;
        info!("personal info saved");

        self.personal_info()
            .await?
            .ok_or_else(|| CvError::Fetch("personal info vanished after save".into()))
    }

    pub async fn save_theme(&self, name: &str) -> Result<ThemePalette> {
        let palette = find_palette(name)
            .ok_or_else(|| {
                CvError::validation("themeName", format!("Thème inconnu : '{}'.", name.trim()))
            })?
            .clone();
        let data = to_document(&palette).map_err(|e| CvError::persistence("encoding theme", e))?;
        self.store.set(CV_DATA, THEME_ID, data).await.map_err(|e| {
            warn!(error = %e, "failed to save theme");
            CvError::persistence("saving theme", e)
        })?;
        info!(theme = %palette.name, "theme saved");
        Ok(palette)
    }

    // ------------------------------------------------------------------
    // Ordered collections
    // ------------------------------------------------------------------

    pub async fn load_collection<T: CollectionPayload>(&self) -> Result<Vec<OrderedRecord<T>>> {
        let records = load_ordered(self.store.as_ref(), T::COLLECTION).await?;
        debug!(collection = T::COLLECTION, count = records.len(), "collection loaded");
        Ok(records)
    }

    /// Validates the whole edited list, then reconciles it against the store.
    pub async fn save_collection<T: CollectionPayload>(
        &self,
        mut records: Vec<OrderedRecord<T>>,
    ) -> Result<ReconcileOutcome<T>> {
        prepare_records(&mut records)?;
        reconcile(self.store.as_ref(), T::COLLECTION, &records, |payload: &T| {
            CollectionPayload::to_document(payload)
        })
        .await
    }

    /// Immediate single delete, outside any batch. Deleting a missing record succeeds.
    pub async fn delete_record<T: CollectionPayload>(&self, id: &str) -> Result<()> {
        self.store.delete(T::COLLECTION, id).await.map_err(|e| {
            warn!(collection = T::COLLECTION, %id, error = %e, "immediate delete failed");
            CvError::delete(&format!("deleting {} '{id}'", T::LABEL), e)
        })?;
        info!(collection = T::COLLECTION, %id, "record deleted");
        Ok(())
    }
}
