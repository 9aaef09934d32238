//! Freehand stroke render pipeline.
//!
//! Completed strokes are cached per page, apart from the object collection.
//! While a stroke is being drawn, each new sample queues one incremental
//! segment. The host calls [`StrokePipeline::flush`] once per display frame:
//! dirty pages are redrawn from scratch, then queued segments for the other
//! pages are drawn on top.

use crate::geometry::PageLayout;
use crate::objects::{AnnotationObject, ObjectId, SerializableColor, Stroke, pressure_multiplier};
use kurbo::{Point, Size};
use std::collections::{BTreeMap, BTreeSet};

/// A drawing backend holding one overlay per page.
///
/// Coordinates are page-local. Segments use round caps and joins.
pub trait StrokeSurface {
    /// Clear the page overlay and size it to `size`.
    fn reset_page(&mut self, page: usize, size: Size);

    /// Draw a filled dot of diameter `width`.
    fn draw_dot(&mut self, page: usize, center: Point, width: f64, color: SerializableColor);

    /// Draw a line segment of the given width.
    fn draw_segment(&mut self, page: usize, from: Point, to: Point, width: f64, color: SerializableColor);

    /// Release the page overlay.
    fn drop_page(&mut self, page: usize);
}

/// A cached completed stroke, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeRecord {
    pub id: ObjectId,
    /// Sample points with the move offset applied.
    pub points: Vec<Point>,
    /// Width at each sample.
    pub widths: Vec<f64>,
    pub color: SerializableColor,
}

impl StrokeRecord {
    pub fn from_stroke(stroke: &Stroke) -> Self {
        Self {
            id: stroke.id,
            points: stroke.placed_points().collect(),
            widths: (0..stroke.points.len()).map(|i| stroke.width_at(i)).collect(),
            color: stroke.color,
        }
    }

    fn segments(&self, page: usize) -> Vec<Segment> {
        segments_for(page, &self.points, &self.widths, self.color)
    }
}

/// One incremental drawing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Dot {
        page: usize,
        center: Point,
        width: f64,
        color: SerializableColor,
    },
    Line {
        page: usize,
        from: Point,
        to: Point,
        width: f64,
        color: SerializableColor,
    },
}

impl Segment {
    pub fn page(&self) -> usize {
        match self {
            Segment::Dot { page, .. } | Segment::Line { page, .. } => *page,
        }
    }

    fn draw(&self, surface: &mut dyn StrokeSurface) {
        match *self {
            Segment::Dot {
                page,
                center,
                width,
                color,
            } => surface.draw_dot(page, center, width, color),
            Segment::Line {
                page,
                from,
                to,
                width,
                color,
            } => surface.draw_segment(page, from, to, width, color),
        }
    }
}

fn segments_for(page: usize, points: &[Point], widths: &[f64], color: SerializableColor) -> Vec<Segment> {
    let width_at = |i: usize| widths.get(i).copied().unwrap_or(1.0);
    match points {
        [] => Vec::new(),
        [only] => vec![Segment::Dot {
            page,
            center: *only,
            width: width_at(0),
            color,
        }],
        _ => points
            .windows(2)
            .enumerate()
            .map(|(i, w)| Segment::Line {
                page,
                from: w[0],
                to: w[1],
                width: (width_at(i) + width_at(i + 1)) / 2.0,
                color,
            })
            .collect(),
    }
}

/// The stroke being drawn, in page-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStroke {
    pub page: usize,
    pub points: Vec<Point>,
    /// Empty when the device reports no pressure.
    pub pressures: Vec<f64>,
    pub width: f64,
    pub color: SerializableColor,
}

impl ActiveStroke {
    fn width_at(&self, index: usize) -> f64 {
        self.width * pressure_multiplier(self.pressures.get(index).copied())
    }

    fn widths(&self) -> Vec<f64> {
        (0..self.points.len()).map(|i| self.width_at(i)).collect()
    }

    /// Turn the captured samples into a stroke object.
    pub fn into_stroke(self) -> Stroke {
        Stroke::new(self.page, self.points, self.width, self.color).with_pressures(self.pressures)
    }
}

/// What a flush drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub pages_redrawn: usize,
    pub segments_drawn: usize,
}

/// Per-page stroke caches, the active stroke and the pending frame work.
#[derive(Debug, Default)]
pub struct StrokePipeline {
    pages: BTreeMap<usize, Vec<StrokeRecord>>,
    active: Option<ActiveStroke>,
    queue: Vec<Segment>,
    dirty: BTreeSet<usize>,
    dropped: BTreeSet<usize>,
    frame_requested: bool,
}

impl StrokePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-sync the caches from the collection, marking pages whose strokes changed.
    pub fn sync(&mut self, objects: &[AnnotationObject]) {
        let mut fresh: BTreeMap<usize, Vec<StrokeRecord>> = BTreeMap::new();
        for stroke in objects.iter().filter_map(AnnotationObject::as_stroke) {
            fresh
                .entry(stroke.page)
                .or_default()
                .push(StrokeRecord::from_stroke(stroke));
        }

        let pages: BTreeSet<usize> = self.pages.keys().chain(fresh.keys()).copied().collect();
        for page in pages {
            if self.pages.get(&page) != fresh.get(&page) {
                self.mark_dirty(page);
            }
        }
        self.pages = fresh;
    }

    /// Force a full redraw of one page, e.g. after its surface was resized.
    pub fn invalidate_page(&mut self, page: usize) {
        self.mark_dirty(page);
    }

    /// Tear down a page surface: drop its queued segments and release its overlay.
    ///
    /// The cache still mirrors the collection; the page is redrawn in full if it
    /// is rendered again.
    pub fn remove_page(&mut self, page: usize) {
        self.queue.retain(|s| s.page() != page);
        self.dirty.remove(&page);
        if self.active.as_ref().is_some_and(|a| a.page == page) {
            self.active = None;
        }
        self.dropped.insert(page);
        self.frame_requested = true;
    }

    fn mark_dirty(&mut self, page: usize) {
        self.dirty.insert(page);
        self.frame_requested = true;
    }

    fn enqueue(&mut self, segment: Segment) {
        self.queue.push(segment);
        self.frame_requested = true;
    }

    /// Start a stroke with its first sample.
    pub fn begin_stroke(&mut self, page: usize, point: Point, pressure: Option<f64>, width: f64, color: SerializableColor) {
        let stroke = ActiveStroke {
            page,
            points: vec![point],
            pressures: pressure.into_iter().collect(),
            width,
            color,
        };
        let dot = Segment::Dot {
            page,
            center: point,
            width: stroke.width_at(0),
            color,
        };
        self.active = Some(stroke);
        self.enqueue(dot);
    }

    /// Append a sample to the active stroke if it is at least `min_distance`
    /// from the previous one. Returns true if the sample was kept.
    pub fn extend_stroke(&mut self, point: Point, pressure: Option<f64>, min_distance: f64) -> bool {
        let Some(stroke) = self.active.as_mut() else {
            return false;
        };
        let Some(&last) = stroke.points.last() else {
            return false;
        };
        if last.distance(point) < min_distance {
            return false;
        }

        let prev = stroke.points.len() - 1;
        stroke.points.push(point);
        if !stroke.pressures.is_empty() {
            stroke.pressures.push(pressure.unwrap_or(0.5));
        }
        let segment = Segment::Line {
            page: stroke.page,
            from: last,
            to: point,
            width: (stroke.width_at(prev) + stroke.width_at(prev + 1)) / 2.0,
            color: stroke.color,
        };
        self.enqueue(segment);
        true
    }

    pub fn active(&self) -> Option<&ActiveStroke> {
        self.active.as_ref()
    }

    /// Take the active stroke for committing.
    pub fn take_active(&mut self) -> Option<ActiveStroke> {
        self.active.take()
    }

    /// Abandon the active stroke and wipe its partial segments.
    pub fn cancel_stroke(&mut self) {
        if let Some(stroke) = self.active.take() {
            self.queue.retain(|s| s.page() != stroke.page);
            self.mark_dirty(stroke.page);
        }
    }

    pub fn records(&self, page: usize) -> &[StrokeRecord] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pending_segments(&self) -> usize {
        self.queue.len()
    }

    pub fn is_dirty(&self, page: usize) -> bool {
        self.dirty.contains(&page)
    }

    /// Whether the host should schedule a frame.
    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Draw all pending work onto `surface`. Pages not in `layout` are skipped.
    pub fn flush(&mut self, surface: &mut dyn StrokeSurface, layout: &PageLayout) -> FrameStats {
        let mut stats = FrameStats::default();

        for page in std::mem::take(&mut self.dropped) {
            surface.drop_page(page);
        }

        let dirty = std::mem::take(&mut self.dirty);
        for &page in &dirty {
            let Some(page_surface) = layout.surface(page) else {
                continue;
            };
            surface.reset_page(page, page_surface.size());
            let mut segments: Vec<Segment> = self.records(page).iter().flat_map(|r| r.segments(page)).collect();
            if let Some(active) = self.active.as_ref().filter(|a| a.page == page) {
                segments.extend(segments_for(page, &active.points, &active.widths(), active.color));
            }
            for segment in &segments {
                segment.draw(surface);
            }
            stats.pages_redrawn += 1;
            stats.segments_drawn += segments.len();
        }

        for segment in std::mem::take(&mut self.queue) {
            let page = segment.page();
            if dirty.contains(&page) || !layout.is_rendered(page) {
                continue;
            }
            segment.draw(surface);
            stats.segments_drawn += 1;
        }

        self.frame_requested = false;
        if stats.pages_redrawn > 0 {
            log::debug!(
                "Stroke frame: {} pages redrawn, {} segments",
                stats.pages_redrawn,
                stats.segments_drawn
            );
        }
        stats
    }
}
