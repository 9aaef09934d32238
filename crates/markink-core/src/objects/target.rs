//! Target callout: a labelled box pointing reviewers at a region.

use super::{GroupId, ObjectId, ObjectTrait};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
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
    pub content: String,
}

impl Target {
    pub const DEFAULT_WIDTH: f64 = 160.0;
    pub const DEFAULT_HEIGHT: f64 = 40.0;
    pub const MIN_WIDTH: f64 = 80.0;
    pub const MIN_HEIGHT: f64 = 40.0;

    pub fn new(page: usize, position: Point, content: String, font_size: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            x: position.x,
            y: position.y,
            w: Self::DEFAULT_WIDTH,
            h: Self::DEFAULT_HEIGHT,
            font_size,
            content,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }
}

impl ObjectTrait for Target {
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
