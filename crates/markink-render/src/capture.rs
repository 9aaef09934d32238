//! Flattening a page raster and its stroke overlay into one image.

use crate::renderer::{RenderResult, RendererError};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

/// Draw `overlay` over a copy of `page`, scaled to cover the page.
///
/// The overlay is sized to the rendered surface, which usually differs from
/// the raster's natural size.
pub fn compose_capture(page: &Pixmap, overlay: Option<&Pixmap>) -> RenderResult<Pixmap> {
    let mut output = page.clone();
    let Some(overlay) = overlay else {
        return Ok(output);
    };
    if overlay.width() == 0 || overlay.height() == 0 {
        return Err(RendererError::RenderFailed("empty overlay".to_string()));
    }
    let sx = page.width() as f32 / overlay.width() as f32;
    let sy = page.height() as f32 / overlay.height() as f32;
    output.draw_pixmap(
        0,
        0,
        overlay.as_ref(),
        &PixmapPaint::default(),
        Transform::from_scale(sx, sy),
        None,
    );
    Ok(output)
}

/// Decode a PNG page raster.
pub fn decode_png(data: &[u8]) -> RenderResult<Pixmap> {
    Pixmap::decode_png(data).map_err(|e| RendererError::Surface(e.to_string()))
}

/// Encode a captured page as PNG.
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    pixmap.encode_png().map_err(|e| RendererError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid(w: u32, h: u32, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn test_overlay_scaled_to_page() {
        let page = solid(100, 100, Color::WHITE);
        let mut overlay = Pixmap::new(50, 50).unwrap();
        // Top-left quarter of the overlay is opaque black
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        overlay.fill_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 25.0, 25.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );

        let composed = compose_capture(&page, Some(&overlay)).unwrap();
        let dark = composed.pixel(20, 20).unwrap();
        let light = composed.pixel(80, 80).unwrap();
        assert!(dark.red() < 10);
        assert_eq!(light.red(), 255);
    }

    #[test]
    fn test_without_overlay_is_copy() {
        let page = solid(4, 4, Color::WHITE);
        let composed = compose_capture(&page, None).unwrap();
        assert_eq!(composed.data(), page.data());
    }

    #[test]
    fn test_png_roundtrip_keeps_size() {
        let page = solid(8, 6, Color::WHITE);
        let bytes = encode_png(&page).unwrap();
        let decoded = decode_png(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
        assert!(decode_png(b"nope").is_err());
    }
}
