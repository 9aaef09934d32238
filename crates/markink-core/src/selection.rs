//! Selection set, resize handles and the per-kind resize rules.

use crate::objects::{AnnotationObject, Image, Line, ObjectId, Score, Target, Text};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Ordered set of selected object ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    ids: Vec<ObjectId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: ObjectId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: ObjectId) {
        self.ids.retain(|i| *i != id);
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.ids.clear();
        for id in ids {
            self.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The only selected id, when exactly one object is selected.
    pub fn single(&self) -> Option<ObjectId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Drop ids the predicate rejects, e.g. after undo removed them.
    pub fn retain(&mut self, keep: impl Fn(ObjectId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }
}

/// Type of resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Corner(Corner),
    Edge(Edge),
    /// Arrow endpoint.
    Endpoint(Endpoint),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// A resize handle with its page-local position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.position.distance(point) <= tolerance
    }
}

fn corner_handles(bounds: Rect) -> Vec<Handle> {
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
    ]
}

fn edge_handle(bounds: Rect, edge: Edge) -> Handle {
    let center = bounds.center();
    let position = match edge {
        Edge::Top => Point::new(center.x, bounds.y0),
        Edge::Right => Point::new(bounds.x1, center.y),
        Edge::Bottom => Point::new(center.x, bounds.y1),
        Edge::Left => Point::new(bounds.x0, center.y),
    };
    Handle::new(position, HandleKind::Edge(edge))
}

/// Resize handles offered for an object. Strokes have none.
pub fn get_handles(object: &AnnotationObject) -> Vec<Handle> {
    let bounds = object.bounds();
    match object {
        AnnotationObject::Text(_) => {
            let mut handles = corner_handles(bounds);
            handles.push(edge_handle(bounds, Edge::Left));
            handles.push(edge_handle(bounds, Edge::Right));
            handles
        }
        AnnotationObject::Image(_) | AnnotationObject::Target(_) => {
            let mut handles = corner_handles(bounds);
            for edge in [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left] {
                handles.push(edge_handle(bounds, edge));
            }
            handles
        }
        AnnotationObject::Score(_) => corner_handles(bounds),
        AnnotationObject::Line(_) => vec![edge_handle(bounds, Edge::Left), edge_handle(bounds, Edge::Right)],
        AnnotationObject::Arrow(arrow) => vec![
            Handle::new(arrow.start, HandleKind::Endpoint(Endpoint::Start)),
            Handle::new(arrow.end, HandleKind::Endpoint(Endpoint::End)),
        ],
        AnnotationObject::Draw(_) => Vec::new(),
    }
}

/// First handle of `object` within `tolerance` of a page-local point.
pub fn hit_test_handles(object: &AnnotationObject, point: Point, tolerance: f64) -> Option<HandleKind> {
    get_handles(object)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Scale a box from a corner, keeping aspect ratio and anchoring the opposite corner.
///
/// The scale is the larger of the two requested factors, raised to `min_scale`.
fn scale_from_corner(rect: Rect, corner: Corner, delta: Vec2, min_scale: f64) -> f64 {
    let w = rect.width().max(f64::EPSILON);
    let h = rect.height().max(f64::EPSILON);
    let (req_w, req_h) = match corner {
        Corner::TopLeft => (w - delta.x, h - delta.y),
        Corner::TopRight => (w + delta.x, h - delta.y),
        Corner::BottomLeft => (w - delta.x, h + delta.y),
        Corner::BottomRight => (w + delta.x, h + delta.y),
    };
    (req_w / w).max(req_h / h).max(min_scale)
}

/// Place a box of `new_w`×`new_h` so the corner opposite `corner` stays put.
fn anchor_opposite(rect: Rect, corner: Corner, new_w: f64, new_h: f64) -> Point {
    match corner {
        Corner::TopLeft => Point::new(rect.x1 - new_w, rect.y1 - new_h),
        Corner::TopRight => Point::new(rect.x0, rect.y1 - new_h),
        Corner::BottomLeft => Point::new(rect.x1 - new_w, rect.y0),
        Corner::BottomRight => Point::new(rect.x0, rect.y0),
    }
}

/// Min scale that keeps a box at or above the box minimums.
fn box_min_scale(w: f64, h: f64, min_w: f64, min_h: f64) -> f64 {
    (min_w / w.max(f64::EPSILON)).max(min_h / h.max(f64::EPSILON))
}

/// New `(x, w)` after dragging a vertical edge horizontally.
fn drag_horizontal(x: f64, w: f64, edge: Edge, dx: f64, min_w: f64) -> (f64, f64) {
    match edge {
        Edge::Left => {
            let new_w = (w - dx).max(min_w);
            (x + w - new_w, new_w)
        }
        Edge::Right => (x, (w + dx).max(min_w)),
        Edge::Top | Edge::Bottom => (x, w),
    }
}

/// New `(y, h)` after dragging a horizontal edge vertically.
fn drag_vertical(y: f64, h: f64, edge: Edge, dy: f64, min_h: f64) -> (f64, f64) {
    match edge {
        Edge::Top => {
            let new_h = (h - dy).max(min_h);
            (y + h - new_h, new_h)
        }
        Edge::Bottom => (y, (h + dy).max(min_h)),
        Edge::Left | Edge::Right => (y, h),
    }
}

fn resize_text(text: &mut Text, handle: HandleKind, delta: Vec2) {
    match handle {
        HandleKind::Corner(corner) => {
            let rect = Rect::new(text.x, text.y, text.x + text.w, text.y + text.h);
            let min = box_min_scale(text.w, text.h, Text::MIN_WIDTH, Text::MIN_HEIGHT);
            let scale = scale_from_corner(rect, corner, delta, min);
            let (w, h) = (text.w * scale, text.h * scale);
            let origin = anchor_opposite(rect, corner, w, h);
            text.x = origin.x;
            text.y = origin.y;
            text.w = w;
            text.h = h;
        }
        HandleKind::Edge(edge @ (Edge::Left | Edge::Right)) => {
            (text.x, text.w) = drag_horizontal(text.x, text.w, edge, delta.x, Text::MIN_WIDTH);
        }
        _ => {}
    }
}

fn resize_image(image: &mut Image, handle: HandleKind, delta: Vec2) {
    match handle {
        HandleKind::Corner(corner) => {
            let rect = Rect::new(image.x, image.y, image.x + image.w, image.y + image.h);
            let min = box_min_scale(image.w, image.h, Image::MIN_WIDTH, Image::MIN_HEIGHT);
            let scale = scale_from_corner(rect, corner, delta, min);
            let (w, h) = (image.w * scale, image.h * scale);
            let origin = anchor_opposite(rect, corner, w, h);
            image.x = origin.x;
            image.y = origin.y;
            image.w = w;
            image.h = h;
        }
        HandleKind::Edge(edge) => {
            (image.x, image.w) = drag_horizontal(image.x, image.w, edge, delta.x, Image::MIN_WIDTH);
            (image.y, image.h) = drag_vertical(image.y, image.h, edge, delta.y, Image::MIN_HEIGHT);
        }
        HandleKind::Endpoint(_) => {}
    }
}

fn resize_target(target: &mut Target, handle: HandleKind, delta: Vec2) {
    match handle {
        HandleKind::Corner(corner) => {
            let rect = Rect::new(target.x, target.y, target.x + target.w, target.y + target.h);
            let min = box_min_scale(target.w, target.h, Target::MIN_WIDTH, Target::MIN_HEIGHT);
            let scale = scale_from_corner(rect, corner, delta, min);
            let (w, h) = (target.w * scale, target.h * scale);
            let origin = anchor_opposite(rect, corner, w, h);
            target.x = origin.x;
            target.y = origin.y;
            target.w = w;
            target.h = h;
            target.font_size *= scale;
        }
        HandleKind::Edge(edge) => {
            (target.x, target.w) = drag_horizontal(target.x, target.w, edge, delta.x, Target::MIN_WIDTH);
            (target.y, target.h) = drag_vertical(target.y, target.h, edge, delta.y, Target::MIN_HEIGHT);
        }
        HandleKind::Endpoint(_) => {}
    }
}

fn resize_score(score: &mut Score, handle: HandleKind, delta: Vec2) {
    let HandleKind::Corner(corner) = handle else {
        return;
    };
    let size = score.size();
    let rect = Rect::from_origin_size(Point::new(score.x, score.y), size);
    let min = Score::MIN_FONT_SIZE / score.font_size.max(f64::EPSILON);
    let scale = scale_from_corner(rect, corner, delta, min);
    let font_size = (score.font_size * scale).max(Score::MIN_FONT_SIZE);
    let new_size = Score::size_for(score.points, font_size);
    let origin = anchor_opposite(rect, corner, new_size.width, new_size.height);
    score.x = origin.x;
    score.y = origin.y;
    score.font_size = font_size;
}

fn resize_line(line: &mut Line, handle: HandleKind, delta: Vec2) {
    if let HandleKind::Edge(edge @ (Edge::Left | Edge::Right)) = handle {
        (line.x, line.w) = drag_horizontal(line.x, line.w, edge, delta.x, Line::MIN_LENGTH);
    }
}

/// Resize `original` by dragging `handle` a page-local `delta` from its start position.
///
/// Always computed from the start-of-gesture object so repeated moves never accumulate error.
/// Handles that do not apply to the object's kind leave it unchanged.
pub fn apply_resize(original: &AnnotationObject, handle: HandleKind, delta: Vec2) -> AnnotationObject {
    let mut object = original.clone();
    match &mut object {
        AnnotationObject::Text(text) => resize_text(text, handle, delta),
        AnnotationObject::Image(image) => resize_image(image, handle, delta),
        AnnotationObject::Target(target) => resize_target(target, handle, delta),
        AnnotationObject::Score(score) => resize_score(score, handle, delta),
        AnnotationObject::Line(line) => resize_line(line, handle, delta),
        AnnotationObject::Arrow(arrow) => match handle {
            HandleKind::Endpoint(Endpoint::Start) => arrow.start += delta,
            HandleKind::Endpoint(Endpoint::End) => arrow.end += delta,
            _ => {}
        },
        AnnotationObject::Draw(_) => {}
    }
    object
}

/// State of an active handle drag on a single object.
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    pub pointer_id: u64,
    pub object_id: ObjectId,
    pub handle: HandleKind,
    /// Starting point of the drag, container coordinates.
    pub start_point: Point,
    pub current_point: Point,
    /// The object as it was at pointer-down.
    pub original: AnnotationObject,
}

impl ResizeGesture {
    pub fn new(pointer_id: u64, handle: HandleKind, start_point: Point, original: AnnotationObject) -> Self {
        Self {
            pointer_id,
            object_id: original.id(),
            handle,
            start_point,
            current_point: start_point,
            original,
        }
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}

/// State for moving the selection.
#[derive(Debug, Clone)]
pub struct MoveGesture {
    pub pointer_id: u64,
    /// Starting point of the drag, container coordinates.
    pub start_point: Point,
    pub current_point: Point,
    /// Selected objects as they were at pointer-down.
    pub originals: Vec<AnnotationObject>,
    /// Whether history was recorded for this gesture yet.
    pub history_pushed: bool,
}

impl MoveGesture {
    pub fn new(pointer_id: u64, start_point: Point, originals: Vec<AnnotationObject>) -> Self {
        Self {
            pointer_id,
            start_point,
            current_point: start_point,
            originals,
            history_pushed: false,
        }
    }

    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.originals.iter().map(AnnotationObject::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Arrow, ObjectTrait};
    use kurbo::Size;

    fn text_box() -> AnnotationObject {
        AnnotationObject::Text(Text::new(0, Point::new(40.0, 40.0), "note".into()))
    }

    #[test]
    fn test_selection_set_unique() {
        let mut set = SelectionSet::new();
        let id = uuid::Uuid::new_v4();
        set.insert(id);
        set.insert(id);
        assert_eq!(set.len(), 1);
        assert_eq!(set.single(), Some(id));
        set.insert(uuid::Uuid::new_v4());
        assert_eq!(set.single(), None);
        set.remove(id);
        assert!(!set.contains(id));
    }

    #[test]
    fn test_text_left_edge_drag() {
        let resized = apply_resize(&text_box(), HandleKind::Edge(Edge::Left), Vec2::new(-30.0, 0.0));
        let text = resized.as_text().unwrap();
        assert!((text.x - 10.0).abs() < 1e-9);
        assert!((text.w - 270.0).abs() < 1e-9);
        assert!((text.h - 100.0).abs() < 1e-9);
        assert!((text.font_size - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_edge_respects_min_width() {
        let resized = apply_resize(&text_box(), HandleKind::Edge(Edge::Right), Vec2::new(-500.0, 0.0));
        let text = resized.as_text().unwrap();
        assert!((text.w - Text::MIN_WIDTH).abs() < 1e-9);
        assert!((text.x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_corner_keeps_aspect_and_font() {
        let resized = apply_resize(
            &text_box(),
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(240.0, 10.0),
        );
        let text = resized.as_text().unwrap();
        assert!((text.w - 480.0).abs() < 1e-9);
        assert!((text.h - 200.0).abs() < 1e-9);
        assert!((text.font_size - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_corner_anchors_opposite() {
        let resized = apply_resize(
            &text_box(),
            HandleKind::Corner(Corner::TopLeft),
            Vec2::new(-240.0, 0.0),
        );
        let bounds = resized.bounds();
        assert!((bounds.x1 - 280.0).abs() < 1e-9);
        assert!((bounds.y1 - 140.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_shrink_clamped_to_minimums() {
        let resized = apply_resize(
            &text_box(),
            HandleKind::Corner(Corner::BottomRight),
            Vec2::new(-1000.0, -1000.0),
        );
        let text = resized.as_text().unwrap();
        assert!(text.w >= Text::MIN_WIDTH - 1e-9);
        assert!(text.h >= Text::MIN_HEIGHT - 1e-9);
    }

    #[test]
    fn test_target_corner_scales_font() {
        let target = AnnotationObject::Target(Target::new(0, Point::ZERO, "Q1".into(), 16.0));
        let resized = apply_resize(&target, HandleKind::Corner(Corner::BottomRight), Vec2::new(160.0, 0.0));
        let AnnotationObject::Target(t) = resized else { panic!("kind changed") };
        assert!((t.font_size - 32.0).abs() < 1e-9);
        assert!((t.w - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_image_edge_changes_one_dimension() {
        let image = AnnotationObject::Image(Image::new(0, Point::ZERO, Size::new(200.0, 100.0), "a.png".into()));
        let resized = apply_resize(&image, HandleKind::Edge(Edge::Bottom), Vec2::new(30.0, 50.0));
        let AnnotationObject::Image(i) = resized else { panic!("kind changed") };
        assert!((i.w - 200.0).abs() < 1e-9);
        assert!((i.h - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_font_clamped() {
        let score = AnnotationObject::Score(Score::new(0, Point::new(100.0, 100.0), 4));
        let resized = apply_resize(&score, HandleKind::Corner(Corner::BottomRight), Vec2::new(-500.0, -500.0));
        let AnnotationObject::Score(s) = resized else { panic!("kind changed") };
        assert!((s.font_size - Score::MIN_FONT_SIZE).abs() < 1e-9);
        assert!((s.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_thickness_invariant() {
        let line = AnnotationObject::Line(Line::new(0, Point::new(50.0, 50.0)));
        for (edge, dx) in [(Edge::Left, -40.0), (Edge::Left, 500.0), (Edge::Right, 75.0)] {
            let resized = apply_resize(&line, HandleKind::Edge(edge), Vec2::new(dx, 33.0));
            let AnnotationObject::Line(l) = resized else { panic!("kind changed") };
            assert!((l.h - Line::DEFAULT_THICKNESS).abs() < f64::EPSILON);
            assert!((l.y - 50.0).abs() < f64::EPSILON);
            assert!(l.w >= Line::MIN_LENGTH);
        }
        let AnnotationObject::Line(l) = apply_resize(&line, HandleKind::Edge(Edge::Left), Vec2::new(-40.0, 0.0)) else {
            panic!("kind changed")
        };
        assert!((l.x - 10.0).abs() < 1e-9);
        assert!((l.w - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_arrow_endpoint_only() {
        let arrow = Arrow::new(0, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let original = AnnotationObject::Arrow(arrow.clone());
        let resized = apply_resize(&original, HandleKind::Endpoint(Endpoint::End), Vec2::new(10.0, 20.0));
        let AnnotationObject::Arrow(a) = resized else { panic!("kind changed") };
        assert_eq!(a.start, arrow.start);
        assert_eq!(a.end, Point::new(110.0, 20.0));
        assert_eq!(a.id(), arrow.id());
        assert!((a.stroke_width - arrow.stroke_width).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handles_per_kind() {
        assert_eq!(get_handles(&text_box()).len(), 6);
        let line = AnnotationObject::Line(Line::new(0, Point::ZERO));
        assert_eq!(get_handles(&line).len(), 2);
        let score = AnnotationObject::Score(Score::new(0, Point::ZERO, 1));
        assert_eq!(get_handles(&score).len(), 4);
    }

    #[test]
    fn test_hit_test_handles() {
        let hit = hit_test_handles(&text_box(), Point::new(41.0, 90.0), 5.0);
        assert_eq!(hit, Some(HandleKind::Edge(Edge::Left)));
        assert_eq!(hit_test_handles(&text_box(), Point::new(150.0, 90.0), 5.0), None);
    }
}
