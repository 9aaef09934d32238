//! Page surfaces and the transforms between page-local and container coordinates.
//!
//! Every object stores page-local pixel coordinates. Pointer input arrives in
//! container coordinates: the scrolling area holding one page (single view) or
//! all pages stacked vertically (combined view).

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// How pages are laid out in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Only the current page is rendered, at the container origin.
    #[default]
    Single,
    /// All pages stacked vertically with a gap between them.
    Combined,
}

/// A page raster supplied by the host, with its natural pixel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSource {
    /// Opaque raster reference (URL or path).
    pub reference: String,
    pub width: f64,
    pub height: f64,
}

impl PageSource {
    pub fn new(reference: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            reference: reference.into(),
            width,
            height,
        }
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One rendered page surface and its rectangle in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSurface {
    pub page: usize,
    pub rect: Rect,
}

impl PageSurface {
    pub fn origin(&self) -> Point {
        self.rect.origin()
    }

    pub fn size(&self) -> Size {
        self.rect.size()
    }

    /// Transform from page-local to container coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin().to_vec2())
    }

    pub fn to_local(&self, container_point: Point) -> Point {
        self.transform().inverse() * container_point
    }

    pub fn to_container(&self, local_point: Point) -> Point {
        self.transform() * local_point
    }

    /// Local rect of the page, `(0, 0)` to its size.
    pub fn local_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, self.size())
    }
}

/// The set of rendered page surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    surfaces: Vec<PageSurface>,
}

impl PageLayout {
    /// One page at the container origin.
    pub fn single(page: usize, size: Size) -> Self {
        Self {
            surfaces: vec![PageSurface {
                page,
                rect: Rect::from_origin_size(Point::ZERO, size),
            }],
        }
    }

    /// Pages stacked top to bottom, `gap` pixels apart, left aligned.
    pub fn combined(sizes: &[Size], gap: f64) -> Self {
        let mut y = 0.0;
        let surfaces = sizes
            .iter()
            .enumerate()
            .map(|(page, size)| {
                let rect = Rect::from_origin_size(Point::new(0.0, y), *size);
                y += size.height + gap;
                PageSurface { page, rect }
            })
            .collect();
        Self { surfaces }
    }

    pub fn from_surfaces(surfaces: Vec<PageSurface>) -> Self {
        Self { surfaces }
    }

    pub fn surfaces(&self) -> &[PageSurface] {
        &self.surfaces
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn surface(&self, page: usize) -> Option<&PageSurface> {
        self.surfaces.iter().find(|s| s.page == page)
    }

    pub fn is_rendered(&self, page: usize) -> bool {
        self.surface(page).is_some()
    }

    /// First rendered page whose bounds contain the point, with the page-local point.
    pub fn locate_page(&self, container_point: Point) -> Option<(usize, Point)> {
        self.surfaces
            .iter()
            .find(|s| s.rect.contains(container_point))
            .map(|s| (s.page, s.to_local(container_point)))
    }

    pub fn page_to_container(&self, page: usize, local_point: Point) -> Option<Point> {
        self.surface(page).map(|s| s.to_container(local_point))
    }

    pub fn container_to_page(&self, page: usize, container_point: Point) -> Option<Point> {
        self.surface(page).map(|s| s.to_local(container_point))
    }

    /// Offset that re-bases page-local coordinates from one page onto another.
    pub fn rebase_offset(&self, from_page: usize, to_page: usize) -> Option<Vec2> {
        let from = self.surface(from_page)?;
        let to = self.surface(to_page)?;
        Some(from.origin() - to.origin())
    }

    /// Container extent covering every surface.
    pub fn bounds(&self) -> Option<Rect> {
        let mut surfaces = self.surfaces.iter();
        let first = surfaces.next()?.rect;
        Some(surfaces.fold(first, |acc, s| acc.union(s.rect)))
    }
}

/// A box in fractions of a page's size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedBox {
    pub page: usize,
    pub x_frac: f64,
    pub y_frac: f64,
    pub w_frac: f64,
    pub h_frac: f64,
}

/// A box in page-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub page: usize,
    pub rect: Rect,
}

/// Scale a normalized box by the rendered pixel size of its page surface.
pub fn project_normalized(b: &NormalizedBox, surface_size: Size) -> PageBox {
    let rect = Rect::from_origin_size(
        Point::new(b.x_frac * surface_size.width, b.y_frac * surface_size.height),
        Size::new(b.w_frac * surface_size.width, b.h_frac * surface_size.height),
    );
    PageBox { page: b.page, rect }
}
