//! In-memory annotation store.

use super::{AnnotationStore, BoxFuture, StorageError, StorageResult};
use crate::document::AnnotationDocument;
use crate::objects::AnnotationObject;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keeps documents in process memory. Used by tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, AnnotationDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds one document.
    pub fn with_document(doc_id: impl Into<String>, objects: Vec<AnnotationObject>) -> Self {
        let mut documents = BTreeMap::new();
        documents.insert(doc_id.into(), AnnotationDocument::from_objects(objects));
        Self {
            documents: RwLock::new(documents),
        }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, BTreeMap<String, AnnotationDocument>>> {
        self.documents
            .read()
            .map_err(|e| StorageError::Unavailable(format!("poisoned lock: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, BTreeMap<String, AnnotationDocument>>> {
        self.documents
            .write()
            .map_err(|e| StorageError::Unavailable(format!("poisoned lock: {}", e)))
    }
}

impl AnnotationStore for MemoryStore {
    fn load_annotations(&self, doc_id: &str) -> BoxFuture<'_, StorageResult<Vec<AnnotationObject>>> {
        let doc_id = doc_id.to_string();
        Box::pin(async move {
            let documents = self.read()?;
            match documents.get(&doc_id) {
                Some(document) => Ok(document.objects().to_vec()),
                None => Err(StorageError::NotFound(doc_id)),
            }
        })
    }

    fn save_annotations(&self, doc_id: &str, objects: &[AnnotationObject]) -> BoxFuture<'_, StorageResult<()>> {
        let doc_id = doc_id.to_string();
        let document = AnnotationDocument::from_objects(objects.to_vec());
        Box::pin(async move {
            self.write()?.insert(doc_id, document);
            Ok(())
        })
    }

    /// Ids in sorted order.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { Ok(self.read()?.keys().cloned().collect()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Score, Text};
    use kurbo::Point;
    use pollster::block_on;

    #[test]
    fn test_saved_annotations_load_back() {
        let store = MemoryStore::new();
        let objects = vec![
            AnnotationObject::Text(Text::new(0, Point::ZERO, "a".into())),
            AnnotationObject::Score(Score::new(0, Point::new(4.0, 4.0), -1)),
        ];
        block_on(store.save_annotations("doc-2", &objects)).unwrap();
        block_on(store.save_annotations("doc-1", &objects[..1])).unwrap();

        assert_eq!(block_on(store.load_annotations("doc-2")).unwrap(), objects);
        assert_eq!(
            block_on(store.list()).unwrap(),
            vec!["doc-1".to_string(), "doc-2".to_string()]
        );
    }

    #[test]
    fn test_save_replaces_previous() {
        let text = AnnotationObject::Text(Text::new(0, Point::ZERO, "old".into()));
        let store = MemoryStore::with_document("doc", vec![text]);
        block_on(store.save_annotations("doc", &[])).unwrap();
        assert!(block_on(store.load_annotations("doc")).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_document_is_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.load_annotations("nope"));
        assert!(matches!(result, Err(StorageError::NotFound(id)) if id == "nope"));
    }
}
