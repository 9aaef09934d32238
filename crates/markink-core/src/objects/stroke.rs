//! Freehand pen stroke.

use super::{GroupId, ObjectId, ObjectTrait, SerializableColor, point_to_segment_dist};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lower bound of the pressure width multiplier.
pub const MIN_PRESSURE_MULTIPLIER: f64 = 0.5;
/// Upper bound of the pressure width multiplier.
pub const MAX_PRESSURE_MULTIPLIER: f64 = 1.5;

/// Width multiplier for a pen pressure sample in `[0, 1]`.
///
/// Devices that report no pressure draw at the nominal width.
pub fn pressure_multiplier(pressure: Option<f64>) -> f64 {
    match pressure {
        Some(p) => (0.5 + p).clamp(MIN_PRESSURE_MULTIPLIER, MAX_PRESSURE_MULTIPLIER),
        None => 1.0,
    }
}

/// A committed freehand stroke.
///
/// Points are recorded in page-local coordinates at capture time. Moving the
/// stroke only changes `offset`, so the captured samples are never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub(crate) id: ObjectId,
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    pub points: Vec<Point>,
    /// Per-point pressure. Empty when the device reported none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pressures: Vec<f64>,
    pub stroke_width: f64,
    #[serde(default)]
    pub color: SerializableColor,
    #[serde(default)]
    pub offset: Vec2,
}

impl Stroke {
    pub fn new(page: usize, points: Vec<Point>, stroke_width: f64, color: SerializableColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            group: None,
            points,
            pressures: Vec::new(),
            stroke_width,
            color,
            offset: Vec2::ZERO,
        }
    }

    pub fn with_pressures(mut self, pressures: Vec<f64>) -> Self {
        self.pressures = pressures;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sample points with the move offset applied.
    pub fn placed_points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().map(move |p| *p + self.offset)
    }

    /// Rendered width at sample `index`.
    pub fn width_at(&self, index: usize) -> f64 {
        self.stroke_width * pressure_multiplier(self.pressures.get(index).copied())
    }

    /// True if any sample point lies within `radius` of `point`.
    pub fn touches(&self, point: Point, radius: f64) -> bool {
        self.placed_points().any(|p| p.distance(point) <= radius)
    }
}

impl ObjectTrait for Stroke {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn page(&self) -> usize {
        self.page
    }

    fn bounds(&self) -> Rect {
        let mut points = self.placed_points();
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        let rect = points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p));
        let pad = self.stroke_width * MAX_PRESSURE_MULTIPLIER / 2.0;
        rect.inflate(pad, pad)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let points: Vec<Point> = self.placed_points().collect();
        let reach = tolerance + self.stroke_width / 2.0;
        match points.as_slice() {
            [] => false,
            [only] => only.distance(point) <= reach,
            _ => points
                .windows(2)
                .any(|w| point_to_segment_dist(point, w[0], w[1]) <= reach),
        }
    }

    fn translate(&mut self, delta: Vec2) {
        self.offset += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Stroke {
        Stroke::new(
            0,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0)],
            3.0,
            SerializableColor::marking_red(),
        )
    }

    #[test]
    fn test_pressure_multiplier_bounds() {
        assert!((pressure_multiplier(None) - 1.0).abs() < f64::EPSILON);
        assert!((pressure_multiplier(Some(0.0)) - 0.5).abs() < f64::EPSILON);
        assert!((pressure_multiplier(Some(0.5)) - 1.0).abs() < f64::EPSILON);
        assert!((pressure_multiplier(Some(1.0)) - 1.5).abs() < f64::EPSILON);
        assert!((pressure_multiplier(Some(3.0)) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_translate_moves_offset_only() {
        let mut stroke = sample();
        let before = stroke.points.clone();
        stroke.translate(Vec2::new(5.0, 7.0));
        assert_eq!(stroke.points, before);
        assert_eq!(stroke.offset, Vec2::new(5.0, 7.0));
        assert!(stroke.touches(Point::new(25.0, 7.0), 0.5));
        assert!(!stroke.touches(Point::new(20.0, 0.0), 0.5));
    }

    #[test]
    fn test_touches_uses_sample_points() {
        let stroke = sample();
        assert!(stroke.touches(Point::new(10.0, 4.0), 4.0));
        // Between samples but farther than the radius from both
        assert!(!stroke.touches(Point::new(5.0, 0.0), 4.0));
    }

    #[test]
    fn test_width_at_uses_pressure() {
        let stroke = sample().with_pressures(vec![0.0, 0.5, 1.0]);
        assert!((stroke.width_at(0) - 1.5).abs() < 1e-9);
        assert!((stroke.width_at(2) - 4.5).abs() < 1e-9);
        assert!((sample().width_at(1) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_json_without_offset() {
        let json = r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","page":1,"points":[{"x":1.0,"y":2.0}],"strokeWidth":2.0}"#;
        let stroke: Stroke = serde_json::from_str(json).unwrap();
        assert_eq!(stroke.offset, Vec2::ZERO);
        assert_eq!(stroke.color, SerializableColor::marking_red());
    }
}
