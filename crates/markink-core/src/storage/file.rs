//! JSON files on disk, one per document. Native only.

use super::{AnnotationStore, BoxFuture, StorageError, StorageResult};
use crate::document::AnnotationDocument;
use crate::objects::AnnotationObject;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Saves each document as `<root>/<doc_id>.json` in the `{"boxes": [...]}` format.
pub struct FileStore {
    root: PathBuf,
}

/// File stem for a document id. Anything outside `[A-Za-z0-9_-]` becomes `_`.
fn file_stem_for(doc_id: &str) -> String {
    doc_id
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn io_error(action: &str, path: &Path, e: io::Error) -> StorageError {
    StorageError::Io(format!("{} {}: {}", action, path.display(), e))
}

impl FileStore {
    /// Open a store at `root`, creating the directory if it is missing.
    pub fn new(root: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&root).map_err(|e| io_error("creating", &root, e))?;
        Ok(Self { root })
    }

    /// `<data dir>/markink/annotations`, e.g. `~/.local/share/markink/annotations` on Linux.
    pub fn default_location() -> StorageResult<Self> {
        let data = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Unavailable("no data or home directory".to_string()))?;
        Self::new(data.join("markink").join("annotations"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, doc_id: &str) -> PathBuf {
        self.root.join(file_stem_for(doc_id)).with_extension(EXTENSION)
    }
}

impl AnnotationStore for FileStore {
    fn load_annotations(&self, doc_id: &str) -> BoxFuture<'_, StorageResult<Vec<AnnotationObject>>> {
        let path = self.path_for(doc_id);
        let doc_id = doc_id.to_string();
        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StorageError::NotFound(doc_id)),
                Err(e) => return Err(io_error("reading", &path, e)),
            };
            let document = AnnotationDocument::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))?;
            log::debug!("Read {} objects from {}", document.len(), path.display());
            Ok(document.objects().to_vec())
        })
    }

    /// Written to a temporary file first, then renamed over the old one.
    fn save_annotations(&self, doc_id: &str, objects: &[AnnotationObject]) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(doc_id);
        let encoded = AnnotationDocument::from_objects(objects.to_vec()).to_json();
        Box::pin(async move {
            let json = encoded?;
            let staging = path.with_extension("json.tmp");
            fs::write(&staging, json).map_err(|e| io_error("writing", &staging, e))?;
            fs::rename(&staging, &path).map_err(|e| io_error("replacing", &path, e))
        })
    }

    /// Stems of the stored files, sorted.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.root).map_err(|e| io_error("listing", &self.root, e))?;
            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }
}
