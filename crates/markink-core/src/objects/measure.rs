//! Text measurement for content-driven box heights.

use super::FontWeight;
use kurbo::Size;

/// Measures wrapped text. Hosts with a real text shaper plug in their own.
pub trait TextMeasurer {
    /// Size of `content` wrapped at `max_width`.
    fn measure(&self, content: &str, font_size: f64, weight: FontWeight, max_width: f64) -> Size;
}

/// Character-count approximation of a proportional font.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasurer {
    /// Average glyph advance as a fraction of the font size.
    pub char_width: f64,
    /// Extra advance for bold glyphs, as a fraction of the font size.
    pub bold_extra: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self {
            char_width: 0.55,
            bold_extra: 0.05,
            line_height: 1.3,
        }
    }
}

impl ApproxTextMeasurer {
    fn advance(&self, font_size: f64, weight: FontWeight) -> f64 {
        let factor = match weight {
            FontWeight::Normal => self.char_width,
            FontWeight::Bold => self.char_width + self.bold_extra,
        };
        font_size * factor
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, content: &str, font_size: f64, weight: FontWeight, max_width: f64) -> Size {
        let advance = self.advance(font_size, weight).max(f64::EPSILON);
        let max_chars = ((max_width / advance).floor() as usize).max(1);
        let plain = strip_math_markup(content);

        let mut lines = 0;
        let mut widest = 0usize;
        for paragraph in plain.split('\n') {
            lines += wrapped_line_count(paragraph, max_chars);
            widest = widest.max(paragraph.chars().count().min(max_chars));
        }

        Size::new(
            widest as f64 * advance,
            lines.max(1) as f64 * font_size * self.line_height,
        )
    }
}

/// Greedy word wrap. Words longer than a line are broken across lines.
fn wrapped_line_count(paragraph: &str, max_chars: usize) -> usize {
    let mut lines = 1;
    let mut current = 0;
    for word in paragraph.split(' ') {
        let len = word.chars().count();
        let needed = if current == 0 { len } else { current + 1 + len };
        if needed <= max_chars {
            current = needed;
            continue;
        }
        if current > 0 {
            lines += 1;
        }
        let mut rest = len;
        while rest > max_chars {
            lines += 1;
            rest -= max_chars;
        }
        current = rest;
    }
    lines
}

/// Drop `$` math delimiters so formulas measure like the rendered glyphs.
pub fn strip_math_markup(content: &str) -> String {
    content.replace("$$", "").replace('$', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_counts() {
        assert_eq!(wrapped_line_count("", 10), 1);
        assert_eq!(wrapped_line_count("one two", 10), 1);
        assert_eq!(wrapped_line_count("one two three", 10), 2);
        assert_eq!(wrapped_line_count(&"x".repeat(25), 10), 3);
    }

    #[test]
    fn test_measure_multiline() {
        let m = ApproxTextMeasurer::default();
        let one = m.measure("a", 10.0, FontWeight::Normal, 200.0);
        let three = m.measure("a\nb\nc", 10.0, FontWeight::Normal, 200.0);
        assert!((one.height - 13.0).abs() < 1e-9);
        assert!((three.height - 39.0).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let m = ApproxTextMeasurer::default();
        let normal = m.measure("12/20", 16.0, FontWeight::Normal, 1000.0);
        let bold = m.measure("12/20", 16.0, FontWeight::Bold, 1000.0);
        assert!(bold.width > normal.width);
    }

    #[test]
    fn test_math_markup_stripped() {
        assert_eq!(strip_math_markup("area $x^2$ and $$y$$"), "area x^2 and y");
    }
}
