//! Persistence collaborator interface and reference backends.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use crate::objects::AnnotationObject;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Why an annotation store call failed.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing has been saved for the document yet.
    #[error("No annotations stored for document {0}")]
    NotFound(String),
    #[error("Malformed annotation data: {0}")]
    Serialization(String),
    #[error("Annotation store I/O failed: {0}")]
    Io(String),
    #[error("Annotation store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Future returned by collaborator calls. Not `Send`, so wasm32 backends fit too.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Where a document's annotations are saved.
///
/// On native platforms, implementations must be Send + Sync.
#[cfg(not(target_arch = "wasm32"))]
pub trait AnnotationStore: Send + Sync {
    /// Load the annotations of a document.
    fn load_annotations(&self, doc_id: &str) -> BoxFuture<'_, StorageResult<Vec<AnnotationObject>>>;

    /// Replace the stored annotations of a document.
    fn save_annotations(&self, doc_id: &str, objects: &[AnnotationObject]) -> BoxFuture<'_, StorageResult<()>>;

    /// List stored document ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Where a document's annotations are saved (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait AnnotationStore {
    /// Load the annotations of a document.
    fn load_annotations(&self, doc_id: &str) -> BoxFuture<'_, StorageResult<Vec<AnnotationObject>>>;

    /// Replace the stored annotations of a document.
    fn save_annotations(&self, doc_id: &str, objects: &[AnnotationObject]) -> BoxFuture<'_, StorageResult<()>>;

    /// List stored document ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}
