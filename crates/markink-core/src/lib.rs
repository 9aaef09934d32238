//! Markink Core Library
//!
//! Headless annotation editor for paged documents: object model, pointer
//! interaction, undo history, the stroke overlay pipeline and auto-layout.

pub mod autolayout;
pub mod clipboard;
pub mod config;
pub mod document;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod interaction;
pub mod objects;
pub mod placement;
pub mod selection;
pub mod services;
pub mod storage;
pub mod strokes;

pub use autolayout::{AutoLayoutMapper, LayoutBatch, LayoutReport, Suggestion, SuggestionKind};
pub use clipboard::{Clipboard, LocalClipboard};
pub use config::EditorConfig;
pub use document::AnnotationDocument;
pub use editor::{Editor, EditorKey, Notification, NotificationLevel};
pub use geometry::{NormalizedBox, PageBox, PageLayout, PageSource, PageSurface, ViewMode, project_normalized};
pub use history::History;
pub use interaction::{InteractionState, Modifiers, PointerDevice, PointerInput, ToolKind};
pub use objects::{AnnotationObject, ObjectId, ObjectKind, ObjectTrait, SerializableColor};
pub use placement::Placement;
pub use selection::{Handle, HandleKind, SelectionSet};
pub use services::{CaptureTarget, ExportError, Exporter, LayoutError, LayoutService};
pub use storage::{AnnotationStore, MemoryStore, StorageError, StorageResult};
pub use strokes::{FrameStats, StrokePipeline, StrokeSurface};
