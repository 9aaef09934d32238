//! Annotation object definitions.

mod arrow;
mod image;
mod line;
mod measure;
mod score;
mod stroke;
mod target;
mod text;

pub use arrow::Arrow;
pub use image::{Image, ImageFormat};
pub use line::Line;
pub use measure::{ApproxTextMeasurer, TextMeasurer, strip_math_markup};
pub use score::Score;
pub use stroke::{MAX_PRESSURE_MULTIPLIER, MIN_PRESSURE_MULTIPLIER, Stroke, pressure_multiplier};
pub use target::Target;
pub use text::{FontWeight, Text};

use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for annotation objects.
pub type ObjectId = Uuid;

/// Token shared by objects that move and select together.
pub type GroupId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// The red used for review marks.
    pub fn marking_red() -> Self {
        Self::new(255, 65, 65, 255)
    }
}

impl Default for SerializableColor {
    fn default() -> Self {
        Self::marking_red()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Common behaviour of every annotation kind.
///
/// All coordinates are page-local pixels of the page the object lives on.
pub trait ObjectTrait {
    /// Get the unique identifier.
    fn id(&self) -> ObjectId;

    /// Page index the object is placed on.
    fn page(&self) -> usize;

    /// Bounding box in page-local coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a page-local point hits this object.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Translate the object by a page-local delta.
    fn translate(&mut self, delta: Vec2);
}

/// Discriminant of [`AnnotationObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Text,
    Score,
    Image,
    Line,
    Arrow,
    Target,
    Draw,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Text => "text",
            ObjectKind::Score => "score",
            ObjectKind::Image => "image",
            ObjectKind::Line => "line",
            ObjectKind::Arrow => "arrow",
            ObjectKind::Target => "target",
            ObjectKind::Draw => "draw",
        }
    }
}

/// A placed annotation. Serialized with a `"type"` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationObject {
    Text(Text),
    Score(Score),
    Image(Image),
    Line(Line),
    Arrow(Arrow),
    Target(Target),
    Draw(Stroke),
}

macro_rules! dispatch {
    ($self:expr, $obj:ident => $body:expr) => {
        match $self {
            AnnotationObject::Text($obj) => $body,
            AnnotationObject::Score($obj) => $body,
            AnnotationObject::Image($obj) => $body,
            AnnotationObject::Line($obj) => $body,
            AnnotationObject::Arrow($obj) => $body,
            AnnotationObject::Target($obj) => $body,
            AnnotationObject::Draw($obj) => $body,
        }
    };
}

impl AnnotationObject {
    pub fn id(&self) -> ObjectId {
        dispatch!(self, o => o.id())
    }

    pub fn page(&self) -> usize {
        dispatch!(self, o => o.page())
    }

    pub fn set_page(&mut self, page: usize) {
        dispatch!(self, o => o.page = page)
    }

    pub fn group(&self) -> Option<GroupId> {
        dispatch!(self, o => o.group)
    }

    pub fn set_group(&mut self, group: Option<GroupId>) {
        dispatch!(self, o => o.group = group)
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            AnnotationObject::Text(_) => ObjectKind::Text,
            AnnotationObject::Score(_) => ObjectKind::Score,
            AnnotationObject::Image(_) => ObjectKind::Image,
            AnnotationObject::Line(_) => ObjectKind::Line,
            AnnotationObject::Arrow(_) => ObjectKind::Arrow,
            AnnotationObject::Target(_) => ObjectKind::Target,
            AnnotationObject::Draw(_) => ObjectKind::Draw,
        }
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, o => o.bounds())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, o => o.hit_test(point, tolerance))
    }

    /// Translate by a page-local delta. Strokes move through their `offset`.
    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, o => o.translate(delta))
    }

    /// Regenerate the object's ID.
    /// Used when pasting so copies never alias the originals.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        dispatch!(self, o => o.id = new_id)
    }

    /// Check if this object is a freehand stroke.
    pub fn is_stroke(&self) -> bool {
        matches!(self, AnnotationObject::Draw(_))
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            AnnotationObject::Draw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            AnnotationObject::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            AnnotationObject::Text(t) => Some(t),
            _ => None,
        }
    }
}
