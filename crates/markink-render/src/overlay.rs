//! Per-page raster overlay the stroke pipeline draws into.

use crate::renderer::{OverlayStyle, paint_for, pixel_size};
use kurbo::{Point, Size};
use markink_core::{SerializableColor, StrokeSurface};
use std::collections::BTreeMap;
use tiny_skia::{FillRule, LineCap, LineJoin, PathBuilder, Pixmap, Stroke, Transform};

/// One transparent pixmap per rendered page, sized to the page surface.
#[derive(Default)]
pub struct RasterOverlay {
    pages: BTreeMap<usize, Pixmap>,
    style: OverlayStyle,
}

impl RasterOverlay {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            pages: BTreeMap::new(),
            style,
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// The overlay of a page, if it is alive.
    pub fn pixmap(&self, page: usize) -> Option<&Pixmap> {
        self.pages.get(&page)
    }

    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }

    fn page_mut(&mut self, page: usize) -> Option<&mut Pixmap> {
        let pixmap = self.pages.get_mut(&page);
        if pixmap.is_none() {
            log::debug!("No overlay for page {}, skipping draw", page);
        }
        pixmap
    }
}

impl StrokeSurface for RasterOverlay {
    fn reset_page(&mut self, page: usize, size: Size) {
        let (w, h) = pixel_size(size);
        if let Some(pixmap) = self.pages.get_mut(&page) {
            if pixmap.width() == w && pixmap.height() == h {
                pixmap.fill(tiny_skia::Color::TRANSPARENT);
                return;
            }
        }
        match Pixmap::new(w, h) {
            Some(pixmap) => {
                self.pages.insert(page, pixmap);
            }
            None => log::warn!("Could not allocate a {}x{} overlay for page {}", w, h, page),
        }
    }

    fn draw_dot(&mut self, page: usize, center: Point, width: f64, color: SerializableColor) {
        let paint = paint_for(color, &self.style);
        let Some(pixmap) = self.page_mut(page) else {
            return;
        };
        let radius = (width / 2.0).max(0.5) as f32;
        if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    fn draw_segment(&mut self, page: usize, from: Point, to: Point, width: f64, color: SerializableColor) {
        if from == to {
            self.draw_dot(page, from, width, color);
            return;
        }
        let paint = paint_for(color, &self.style);
        let Some(pixmap) = self.page_mut(page) else {
            return;
        };
        let mut builder = PathBuilder::new();
        builder.move_to(from.x as f32, from.y as f32);
        builder.line_to(to.x as f32, to.y as f32);
        let Some(path) = builder.finish() else {
            return;
        };
        let stroke = Stroke {
            width: width.max(0.5) as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn drop_page(&mut self, page: usize) {
        if self.pages.remove(&page).is_some() {
            log::debug!("Released overlay for page {}", page);
        }
    }
}
