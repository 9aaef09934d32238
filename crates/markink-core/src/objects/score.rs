//! Score marker: a bracket glyph followed by a signed points pill.

use super::{GroupId, ObjectId, ObjectTrait};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Glyph advance used to size the pill label, as a fraction of the font size.
const LABEL_ADVANCE: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub x: f64,
    pub y: f64,
    pub points: i64,
    pub font_size: f64,
}

impl Score {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const MIN_FONT_SIZE: f64 = 8.0;

    pub fn new(page: usize, position: Point, points: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            x: position.x,
            y: position.y,
            points,
            font_size: Self::DEFAULT_FONT_SIZE,
        }
    }

    /// Text shown inside the pill, e.g. `+3` or `-1`.
    pub fn label(&self) -> String {
        format!("{:+}", self.points)
    }

    /// Marker size at a given font size. Width follows the label length.
    pub fn size_for(points: i64, font_size: f64) -> Size {
        let label_chars = format!("{:+}", points).chars().count() as f64;
        let pad = (0.35 * font_size).max(2.0);
        let bracket = font_size * LABEL_ADVANCE;
        let pill = label_chars * font_size * LABEL_ADVANCE + 2.0 * pad;
        Size::new(bracket + pill, font_size * 1.6)
    }

    pub fn size(&self) -> Size {
        Self::size_for(self.points, self.font_size)
    }

    /// Marker height a box of height `box_height` gets when a score is pinned to it.
    pub fn marker_height_for(box_height: f64) -> f64 {
        (box_height * 0.22).max(16.0)
    }
}

impl ObjectTrait for Score {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn page(&self) -> usize {
        self.page
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::new(self.x, self.y), self.size())
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}
