//! Markink Render Library
//!
//! CPU raster backend for the stroke overlay and page capture, built on tiny-skia.

mod capture;
mod overlay;
mod renderer;

pub use capture::{compose_capture, decode_png, encode_png};
pub use overlay::RasterOverlay;
pub use renderer::{OverlayStyle, RenderResult, RendererError};
