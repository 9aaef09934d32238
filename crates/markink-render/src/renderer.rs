//! Shared renderer types.

use markink_core::SerializableColor;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// How strokes are rasterized onto the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub anti_alias: bool,
    /// Multiplies every stroke's opacity.
    pub opacity: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            anti_alias: true,
            opacity: 1.0,
        }
    }
}

/// Paint for a stroke color under the given style.
pub(crate) fn paint_for(color: SerializableColor, style: &OverlayStyle) -> tiny_skia::Paint<'static> {
    let rgba = Color::from(color).to_rgba8();
    let alpha = (f32::from(rgba.a) * style.opacity.clamp(0.0, 1.0)).round() as u8;
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, alpha);
    paint.anti_alias = style.anti_alias;
    paint
}

/// Pixel extent of a surface, at least one pixel per side.
pub(crate) fn pixel_size(size: kurbo::Size) -> (u32, u32) {
    let w = size.width.ceil().max(1.0) as u32;
    let h = size.height.ceil().max(1.0) as u32;
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_size_rounds_up() {
        assert_eq!(pixel_size(kurbo::Size::new(10.2, 0.0)), (11, 1));
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let style = OverlayStyle {
            anti_alias: false,
            opacity: 0.5,
        };
        let paint = paint_for(SerializableColor::new(255, 0, 0, 200), &style);
        assert!(!paint.anti_alias);
        if let tiny_skia::Shader::SolidColor(color) = paint.shader {
            assert!((color.alpha() - 100.0 / 255.0).abs() < 0.01);
        } else {
            panic!("expected a solid color");
        }
    }
}
