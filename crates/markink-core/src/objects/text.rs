//! Text comment box.

use super::{GroupId, ObjectId, ObjectTrait, TextMeasurer};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight (default).
    #[default]
    Normal,
    /// Bold weight, used for question score labels.
    Bold,
}

/// A wrapped text comment anchored at its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub content: String,
    /// Height is never refit to the content.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fixed_height: bool,
}

impl Text {
    pub const DEFAULT_WIDTH: f64 = 240.0;
    pub const DEFAULT_HEIGHT: f64 = 100.0;
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const MIN_WIDTH: f64 = 80.0;
    pub const MIN_HEIGHT: f64 = 40.0;
    /// Inner padding between the box edge and the text.
    pub const PADDING: f64 = 4.0;

    /// Create a text box with the default size.
    pub fn new(page: usize, position: Point, content: String) -> Self {
        Self::with_size(
            page,
            position,
            Size::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT),
            content,
        )
    }

    pub fn with_size(page: usize, position: Point, size: Size, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            x: position.x,
            y: position.y,
            w: size.width,
            h: size.height,
            font_size: Self::DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            content,
            fixed_height: false,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Height the content needs at the current width and font.
    pub fn content_height(&self, measurer: &dyn TextMeasurer) -> f64 {
        let inner_width = (self.w - 2.0 * Self::PADDING).max(1.0);
        let measured = measurer.measure(&self.content, self.font_size, self.font_weight, inner_width);
        measured.height + 2.0 * Self::PADDING
    }

    /// Grow the height so the content fits. Never shrinks below the current height.
    ///
    /// Returns true if the height changed.
    pub fn fit_height(&mut self, measurer: &dyn TextMeasurer) -> bool {
        if self.fixed_height {
            return false;
        }
        let needed = self.content_height(measurer).max(Self::MIN_HEIGHT);
        if needed > self.h {
            self.h = needed;
            true
        } else {
            false
        }
    }
}

impl ObjectTrait for Text {
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
