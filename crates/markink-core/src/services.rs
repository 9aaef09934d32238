//! Interfaces of the layout and export collaborators.

use crate::autolayout::{LayoutBatch, Suggestion};
use crate::objects::AnnotationObject;
use crate::storage::BoxFuture;
use kurbo::Size;
use thiserror::Error;

/// Layout service errors.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout service unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid layout response: {0}")]
    InvalidResponse(String),
}

/// Suggests where review comments should be placed.
pub trait LayoutService {
    fn request_auto_layout(&self, doc_id: &str) -> BoxFuture<'_, Result<LayoutBatch, LayoutError>>;
}

/// Parse a raw layout response: either a batch object or a bare suggestion array.
pub fn parse_layout_response(json: &str) -> Result<LayoutBatch, LayoutError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| LayoutError::InvalidResponse(e.to_string()))?;
    let result = if value.is_array() {
        serde_json::from_value::<Vec<Suggestion>>(value).map(LayoutBatch::from)
    } else {
        serde_json::from_value(value)
    };
    result.map_err(|e| LayoutError::InvalidResponse(e.to_string()))
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,
    #[error("Export failed: {0}")]
    Failed(String),
}

/// One page ready for export: the page raster plus the annotations drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureTarget {
    pub page: usize,
    /// Raster reference of the page.
    pub raster: String,
    /// Rendered size the annotation coordinates refer to.
    pub surface_size: Size,
    pub objects: Vec<AnnotationObject>,
}

/// Produces an exported artifact from captured pages.
pub trait Exporter {
    /// Returns a reference to the exported artifact.
    fn export(&self, doc_id: &str, captures: Vec<CaptureTarget>) -> BoxFuture<'_, Result<String, ExportError>>;
}
