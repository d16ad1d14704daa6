// ============================================================================
// cvfolio Library
// ============================================================================
//
// Bilingual CV/portfolio backend:
//
//   storage    embedded document store (atomic batches, snapshot durability)
//              and the object store for uploaded images
//   reconcile  ordered collection reconciliation and in-memory edited lists
//   cv         domain payloads, validation, repository, drafts, themes, export
//   auth       admin login and bearer sessions
//   web        axum routes for the public site and the admin API
//
// ============================================================================

pub mod auth;
pub mod config;
pub mod core;
pub mod cv;
pub mod reconcile;
pub mod storage;
pub mod web;

pub use crate::core::{CvError, Language, Result, Translatable, ValidationErrors};
pub use auth::AuthManager;
pub use config::AppConfig;
pub use cv::{CvRepository, CvSnapshot};
pub use reconcile::{EditedCollection, OrderedRecord, ReconcileOutcome, reconcile};
pub use storage::{DocumentStore, MemoryDocumentStore};
pub use web::{AppState, build_router};
