use crate::auth::AuthManager;
use crate::cv::{CvRepository, DraftRegistry};
use crate::storage::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub repo: CvRepository,
    pub auth: Arc<AuthManager>,
    pub drafts: Arc<DraftRegistry>,
    pub objects: Arc<dyn ObjectStore>,
    pub track_stats: bool,
    pub uploads_dir: Option<PathBuf>,
    pub cors_origin: Option<String>,
}

impl AppState {
    pub fn new(repo: CvRepository, auth: Arc<AuthManager>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            repo,
            auth,
            drafts: Arc::new(DraftRegistry::new()),
            objects,
            track_stats: true,
            uploads_dir: None,
            cors_origin: None,
        }
    }

    pub fn track_stats(mut self, enabled: bool) -> Self {
        self.track_stats = enabled;
        self
    }

    /// Serve files from `dir` under `/uploads`.
    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }

    pub fn cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }

    /// Forgets expired sessions along with their drafts.
    pub async fn purge_expired_sessions(&self) -> usize {
        let expired = self.auth.purge_expired().await;
        for token in &expired {
            self.drafts.drop_session(token).await;
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "expired sessions purged");
        }
        expired.len()
    }
}
