//! Stamped raster image.

use super::{GroupId, ObjectId, ObjectTrait};
use base64::Engine;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image format of embedded image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// An image placed on a page. `source` is a URL or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub source: String,
}

impl Image {
    pub const MIN_WIDTH: f64 = 80.0;
    pub const MIN_HEIGHT: f64 = 40.0;
    /// Widest an image is stamped at before the user resizes it.
    pub const MAX_INITIAL_WIDTH: f64 = 240.0;

    pub fn new(page: usize, position: Point, size: Size, source: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            x: position.x,
            y: position.y,
            w: size.width,
            h: size.height,
            source,
        }
    }

    /// Embed raw image bytes as a base64 data URI.
    ///
    /// Returns `None` when the bytes are not a recognised image format.
    pub fn embedded(page: usize, position: Point, size: Size, data: &[u8]) -> Option<Self> {
        let format = ImageFormat::from_magic_bytes(data)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        let source = format!("data:{};base64,{}", format.mime_type(), encoded);
        Some(Self::new(page, position, size, source))
    }

    /// Initial display size for an image of the given pixel size.
    pub fn fit_initial_size(natural: Size) -> Size {
        if natural.width <= 0.0 || natural.height <= 0.0 {
            return Size::new(Self::MAX_INITIAL_WIDTH, Self::MAX_INITIAL_WIDTH / 2.0);
        }
        let scale = (Self::MAX_INITIAL_WIDTH / natural.width).min(1.0);
        Size::new(natural.width * scale, natural.height * scale)
    }

    /// Decode the embedded bytes when the source is a base64 data URI.
    pub fn decode_data(&self) -> Option<Vec<u8>> {
        let rest = self.source.strip_prefix("data:")?;
        let (_, payload) = rest.split_once(";base64,")?;
        base64::engine::general_purpose::STANDARD.decode(payload).ok()
    }
}

impl ObjectTrait for Image {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn page(&self) -> usize {
        self.page
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
