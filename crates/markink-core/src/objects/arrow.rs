//! Straight arrow from `start` to `end` with a head at `end`.

use super::{GroupId, ObjectId, ObjectTrait, point_to_segment_dist};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrow {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub start: Point,
    pub end: Point,
    pub stroke_width: f64,
}

impl Arrow {
    pub const DEFAULT_LENGTH: f64 = 120.0;
    pub const DEFAULT_STROKE_WIDTH: f64 = 3.0;

    pub fn new(page: usize, start: Point, end: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            start,
            end,
            stroke_width: Self::DEFAULT_STROKE_WIDTH,
        }
    }

    /// Length of the arrow head along the shaft.
    pub fn head_length(&self) -> f64 {
        self.stroke_width * 4.0
    }

    /// The two barb tips of the head, or `None` for a zero-length arrow.
    pub fn head_points(&self) -> Option<(Point, Point)> {
        let dir = self.end - self.start;
        let len = dir.hypot();
        if len < f64::EPSILON {
            return None;
        }
        let unit = dir / len;
        let normal = Vec2::new(-unit.y, unit.x);
        let head = self.head_length().min(len);
        let base = self.end - unit * head;
        let half = head * 0.5;
        Some((base + normal * half, base - normal * half))
    }
}

impl ObjectTrait for Arrow {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn page(&self) -> usize {
        self.page
    }

    fn bounds(&self) -> Rect {
        let pad = self.head_length() * 0.5;
        Rect::from_points(self.start, self.end).inflate(pad, pad)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance + self.stroke_width / 2.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }
}
