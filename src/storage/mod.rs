pub mod batch;
pub mod document;
pub mod engine;
pub mod error;
pub mod fault;
pub mod memory;
pub mod objects;
pub mod persistence;

pub use batch::{CommitReceipt, WriteBatch, WriteOp};
pub use document::{Direction, Document, OrderBy, StoredDocument, to_document};
pub use engine::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use fault::FlakyStore;
pub use memory::MemoryDocumentStore;
pub use objects::{LocalObjectStore, ObjectCategory, ObjectStore, ObjectStoreError, StoredObject};
pub use persistence::{DurabilityMode, SnapshotManager};
