//! Horizontal rule. `w` is the length, `h` the thickness.

use super::{GroupId, ObjectId, ObjectTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Line {
    pub const DEFAULT_LENGTH: f64 = 160.0;
    pub const DEFAULT_THICKNESS: f64 = 2.0;
    pub const MIN_LENGTH: f64 = 10.0;

    pub fn new(page: usize, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            x: position.x,
            y: position.y,
            w: Self::DEFAULT_LENGTH,
            h: Self::DEFAULT_THICKNESS,
        }
    }
}

impl ObjectTrait for Line {
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
        // Thin rules get a generous vertical band
        let band = tolerance.max(6.0);
        self.bounds().inflate(tolerance, band).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thin_line_hit_band() {
        let line = Line::new(0, Point::new(0.0, 100.0));
        assert!(line.hit_test(Point::new(50.0, 105.0), 0.0));
        assert!(!line.hit_test(Point::new(50.0, 120.0), 0.0));
    }
}
