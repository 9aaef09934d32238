//! Editor tuning knobs.

use crate::objects::SerializableColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Editor configuration. Missing fields in JSON fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Pointer samples closer than this to the previous one are dropped.
    pub min_stroke_distance: f64,
    pub erase_radius: f64,
    pub handle_tolerance: f64,
    pub selection_tolerance: f64,
    pub paste_offset: f64,
    pub history_limit: usize,
    /// Vertical gap between pages in the combined view.
    pub page_gap: f64,
    /// Horizontal gap between a suggestion box and the note placed beside it.
    pub layout_margin: f64,
    /// Suggestions reporting a lower confidence are skipped. Ones without a confidence always pass.
    pub min_layout_confidence: f64,
    pub text_size: Size,
    pub font_size: f64,
    pub stroke_width: f64,
    pub stroke_color: SerializableColor,
    /// Vertical step between comments placed in one bulk placement.
    pub bulk_increment: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_stroke_distance: 2.0,
            erase_radius: 12.0,
            handle_tolerance: 10.0,
            selection_tolerance: 4.0,
            paste_offset: 20.0,
            history_limit: 100,
            page_gap: 16.0,
            layout_margin: 8.0,
            min_layout_confidence: 0.0,
            text_size: Size::new(240.0, 100.0),
            font_size: 16.0,
            stroke_width: 3.0,
            stroke_color: SerializableColor::marking_red(),
            bulk_increment: 110.0,
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"eraseRadius": 20.0, "historyLimit": 5}"#).unwrap();
        assert!((config.erase_radius - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 5);
        assert!((config.min_stroke_distance - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.stroke_color, SerializableColor::marking_red());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EditorConfig::default();
        let back = EditorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_malformed_json() {
        assert!(EditorConfig::from_json("{").is_err());
    }
}
