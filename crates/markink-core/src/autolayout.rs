//! Projection of layout-service suggestions into placed annotations.
//!
//! Suggestions arrive in the pixel space of the page raster the service saw.
//! Each one is scaled onto the rendered surface of its page and the note is
//! placed just right of the suggested box, clamped inside the page. Normalized
//! suggestions carry page fractions and are projected onto the surface directly.

use crate::config::EditorConfig;
use crate::geometry::{NormalizedBox, PageLayout, project_normalized};
use crate::objects::{AnnotationObject, Score, TextMeasurer};
use crate::placement::{comment, pinned_score, question_label};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Kind of a layout suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    #[default]
    Text,
    Score,
}

/// A box the layout service wants annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    /// Width of the raster the coordinates refer to. Unused for normalized boxes.
    #[serde(default, alias = "page_w")]
    pub page_width: f64,
    #[serde(default, alias = "page_h")]
    pub page_height: f64,
    /// `x`, `y`, `w`, `h` are fractions of the page instead of raster pixels.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub normalized: bool,
    /// How sure the service is about the box, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "type")]
    pub kind: SuggestionKind,
    /// Question this suggestion belongs to.
    #[serde(default, deserialize_with = "deserialize_qid", skip_serializing_if = "Option::is_none")]
    pub qid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
}

/// Question ids come back as strings or integers.
fn deserialize_qid<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// One auto-layout response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBatch {
    #[serde(alias = "placements")]
    pub suggestions: Vec<Suggestion>,
    /// Maximum points per question id.
    #[serde(default)]
    pub max_points: BTreeMap<String, i64>,
}

impl From<Vec<Suggestion>> for LayoutBatch {
    fn from(suggestions: Vec<Suggestion>) -> Self {
        Self {
            suggestions,
            max_points: BTreeMap::new(),
        }
    }
}

/// Outcome of applying a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub applied: usize,
    pub skipped: usize,
    pub objects_created: usize,
}

/// Running totals for one question.
#[derive(Debug, Default)]
struct QuestionGroup {
    anchor: Option<(usize, f64)>,
    awarded: i64,
}

impl QuestionGroup {
    fn observe(&mut self, page: usize, y: f64) {
        let candidate = (page, y);
        self.anchor = Some(match self.anchor {
            Some(current) if current <= candidate => current,
            _ => candidate,
        });
    }
}

/// Maps suggestions onto the current page layout.
pub struct AutoLayoutMapper<'a> {
    layout: &'a PageLayout,
    config: &'a EditorConfig,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> AutoLayoutMapper<'a> {
    pub fn new(layout: &'a PageLayout, config: &'a EditorConfig, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            layout,
            config,
            measurer,
        }
    }

    /// Build the objects for a batch. Nothing is applied; the caller commits
    /// them as one history step.
    pub fn map(&self, batch: &LayoutBatch) -> (Vec<AnnotationObject>, LayoutReport) {
        let mut objects = Vec::new();
        let mut report = LayoutReport::default();
        let mut questions: Vec<(String, QuestionGroup)> = Vec::new();

        for suggestion in &batch.suggestions {
            if suggestion
                .confidence
                .is_some_and(|c| c < self.config.min_layout_confidence)
            {
                log::debug!("Skipping low-confidence suggestion on page {}", suggestion.page);
                report.skipped += 1;
                continue;
            }
            let placed = self.map_one(suggestion);
            if placed.is_empty() {
                log::debug!("Skipping unresolvable suggestion on page {}", suggestion.page);
                report.skipped += 1;
                continue;
            }
            report.applied += 1;

            if let Some(qid) = &suggestion.qid {
                let index = match questions.iter().position(|(id, _)| id == qid) {
                    Some(index) => index,
                    None => {
                        questions.push((qid.clone(), QuestionGroup::default()));
                        questions.len() - 1
                    }
                };
                let group = &mut questions[index].1;
                if suggestion.kind == SuggestionKind::Score {
                    group.awarded += suggestion.points.unwrap_or(0);
                }
                let anchor_from_text = placed.iter().any(|o| o.as_text().is_some());
                for object in &placed {
                    if object.as_text().is_some() || !anchor_from_text {
                        group.observe(object.page(), object.bounds().y0);
                    }
                }
            }
            objects.extend(placed);
        }

        for (qid, group) in questions {
            let Some((page, y)) = group.anchor else { continue };
            let max = batch.max_points.get(&qid).copied();
            let at = Point::new(self.config.layout_margin, y);
            let label = question_label(page, at, group.awarded, max, self.measurer);
            objects.push(AnnotationObject::Text(label));
        }

        report.objects_created = objects.len();
        (objects, report)
    }

    /// The suggested box in page-local pixels of the rendered surface.
    fn source_box(s: &Suggestion, surface_size: Size) -> Option<Rect> {
        if s.normalized {
            let fractions = NormalizedBox {
                page: s.page,
                x_frac: s.x,
                y_frac: s.y,
                w_frac: s.w,
                h_frac: s.h,
            };
            return Some(project_normalized(&fractions, surface_size).rect);
        }
        if s.page_width <= 0.0 || s.page_height <= 0.0 {
            return None;
        }
        let sx = surface_size.width / s.page_width;
        let sy = surface_size.height / s.page_height;
        Some(Rect::new(s.x * sx, s.y * sy, (s.x + s.w) * sx, (s.y + s.h) * sy))
    }

    fn map_one(&self, s: &Suggestion) -> Vec<AnnotationObject> {
        let Some(surface) = self.layout.surface(s.page) else {
            return Vec::new();
        };
        let size = surface.size();
        let origin = surface.origin();
        let Some(area) = Self::source_box(s, size) else {
            return Vec::new();
        };
        let margin = self.config.layout_margin;

        if s.text.trim().is_empty() {
            // Marker-only score suggestion, placed where the box is
            let Some(points) = s.points.filter(|_| s.kind == SuggestionKind::Score) else {
                return Vec::new();
            };
            let mut score = Score::new(s.page, Point::ZERO, points);
            score.font_size = self.config.font_size;
            let marker = score.size();
            let cx = clamp_into(origin.x + area.x0, origin.x, origin.x + size.width - marker.width);
            let cy = clamp_into(origin.y + area.y0, origin.y, origin.y + size.height - marker.height);
            score.x = cx - origin.x;
            score.y = cy - origin.y;
            return vec![AnnotationObject::Score(score)];
        }

        let mut text = comment(s.page, Point::ZERO, &s.text, self.config, self.measurer);
        text.w = text.w.min(size.width);
        text.fit_height(self.measurer);
        let cx = origin.x + area.x1 + margin;
        let cy = origin.y + area.y0;
        let cx = clamp_into(cx, origin.x, origin.x + size.width - text.w);
        let cy = clamp_into(cy, origin.y, origin.y + size.height - text.h);
        text.x = cx - origin.x;
        text.y = cy - origin.y;

        let mut placed = Vec::with_capacity(2);
        let marker = match (s.kind, s.points) {
            (SuggestionKind::Score, Some(points)) => Some(pinned_score(&text, points, self.config.font_size)),
            _ => None,
        };
        placed.push(AnnotationObject::Text(text));
        if let Some(marker) = marker {
            placed.push(AnnotationObject::Score(marker));
        }
        placed
    }
}

/// Clamp with the lower bound winning when the range is empty.
fn clamp_into(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ApproxTextMeasurer, ObjectKind};

    fn suggestion(page: usize, x: f64, y: f64, text: &str) -> Suggestion {
        Suggestion {
            page,
            x,
            y,
            w: 100.0,
            h: 50.0,
            page_width: 1200.0,
            page_height: 1600.0,
            text: text.to_string(),
            kind: SuggestionKind::Text,
            normalized: false,
            confidence: None,
            qid: None,
            points: None,
        }
    }

    fn map(layout: &PageLayout, batch: &LayoutBatch) -> (Vec<AnnotationObject>, LayoutReport) {
        map_with(layout, batch, &EditorConfig::default())
    }

    fn map_with(
        layout: &PageLayout,
        batch: &LayoutBatch,
        config: &EditorConfig,
    ) -> (Vec<AnnotationObject>, LayoutReport) {
        let measurer = ApproxTextMeasurer::default();
        AutoLayoutMapper::new(layout, config, &measurer).map(batch)
    }

    #[test]
    fn test_scaled_placement_right_of_box() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let batch = LayoutBatch::from(vec![suggestion(0, 100.0, 200.0, "check units")]);
        let (objects, report) = map(&layout, &batch);
        assert_eq!(report.applied, 1);
        let text = objects[0].as_text().unwrap();
        // (100 + 100) * 0.5 + 8
        assert!((text.x - 108.0).abs() < 1e-9);
        assert!((text.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_combined_view_stores_page_local() {
        let layout = PageLayout::combined(&[Size::new(600.0, 800.0), Size::new(600.0, 800.0)], 16.0);
        let batch = LayoutBatch::from(vec![suggestion(1, 0.0, 0.0, "x")]);
        let (objects, _) = map(&layout, &batch);
        let text = objects[0].as_text().unwrap();
        assert_eq!(text.page, 1);
        assert!(text.y.abs() < 1e-9);
    }

    #[test]
    fn test_combined_view_rasters_of_different_sizes() {
        let layout = PageLayout::combined(&[Size::new(600.0, 800.0), Size::new(600.0, 800.0)], 16.0);
        let first = suggestion(0, 300.0, 400.0, "first");
        let mut second = suggestion(1, 400.0, 800.0, "second");
        second.w = 200.0;
        second.page_width = 2400.0;
        second.page_height = 3200.0;
        let (objects, report) = map(&layout, &LayoutBatch::from(vec![first, second]));
        assert_eq!(report.applied, 2);

        let first = objects[0].as_text().unwrap();
        assert_eq!(first.page, 0);
        // (300 + 100) * 0.5 + 8, 400 * 0.5
        assert!((first.x - 208.0).abs() < 1e-9);
        assert!((first.y - 200.0).abs() < 1e-9);

        let second = objects[1].as_text().unwrap();
        assert_eq!(second.page, 1);
        // (400 + 200) * 0.25 + 8, 800 * 0.25, relative to page 1's origin
        assert!((second.x - 158.0).abs() < 1e-9);
        assert!((second.y - 200.0).abs() < 1e-9);
        assert!(layout.surface(1).unwrap().origin().y > 0.0);
    }

    #[test]
    fn test_normalized_box_projects_onto_surface() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let mut s = suggestion(0, 0.25, 0.5, "normalized");
        s.w = 0.1;
        s.h = 0.05;
        s.page_width = 0.0;
        s.page_height = 0.0;
        s.normalized = true;
        let (objects, report) = map(&layout, &LayoutBatch::from(vec![s]));
        assert_eq!(report.applied, 1);
        let text = objects[0].as_text().unwrap();
        // (0.25 + 0.1) * 600 + 8, 0.5 * 800
        assert!((text.x - 218.0).abs() < 1e-9);
        assert!((text.y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_low_confidence_skipped() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let mut unsure = suggestion(0, 0.0, 0.0, "unsure");
        unsure.confidence = Some(0.3);
        let mut sure = suggestion(0, 0.0, 400.0, "sure");
        sure.confidence = Some(0.9);
        let unscored = suggestion(0, 0.0, 800.0, "unscored");
        let batch = LayoutBatch::from(vec![unsure, sure, unscored]);

        let (_, report) = map(&layout, &batch);
        assert_eq!(report.applied, 3);

        let config = EditorConfig {
            min_layout_confidence: 0.45,
            ..EditorConfig::default()
        };
        let (objects, report) = map_with(&layout, &batch, &config);
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(objects[0].as_text().unwrap().content, "sure");
    }

    #[test]
    fn test_clamped_inside_page() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let batch = LayoutBatch::from(vec![suggestion(0, 1150.0, 1590.0, "edge")]);
        let (objects, _) = map(&layout, &batch);
        let bounds = objects[0].bounds();
        assert!(bounds.x1 <= 600.0 + 1e-9);
        assert!(bounds.y1 <= 800.0 + 1e-9);
    }

    #[test]
    fn test_unresolvable_skipped() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let batch = LayoutBatch::from(vec![
            suggestion(0, 0.0, 0.0, "a"),
            suggestion(7, 0.0, 0.0, "b"),
            suggestion(0, 0.0, 400.0, "c"),
        ]);
        let (objects, report) = map(&layout, &batch);
        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.objects_created, 2);
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_score_suggestion_pairs_marker() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let mut s = suggestion(0, 0.0, 0.0, "well done");
        s.kind = SuggestionKind::Score;
        s.points = Some(3);
        let (objects, _) = map(&layout, &LayoutBatch::from(vec![s]));
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].kind(), ObjectKind::Score);
        let text = objects[0].bounds();
        let marker = objects[1].bounds();
        assert!((marker.x0 - (text.x0 + 4.0)).abs() < 1e-9);
        assert!(marker.y0 > text.y0);
    }

    #[test]
    fn test_marker_only_score() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let mut s = suggestion(0, 200.0, 400.0, "");
        s.kind = SuggestionKind::Score;
        s.points = Some(-1);
        let (objects, report) = map(&layout, &LayoutBatch::from(vec![s]));
        assert_eq!(report.applied, 1);
        let AnnotationObject::Score(score) = &objects[0] else { panic!("expected score") };
        assert!((score.x - 100.0).abs() < 1e-9);
        assert!((score.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_question_label_anchored_at_group_top() {
        let layout = PageLayout::single(0, Size::new(600.0, 800.0));
        let mut first = suggestion(0, 0.0, 600.0, "later");
        first.qid = Some("q1".into());
        first.kind = SuggestionKind::Score;
        first.points = Some(2);
        let mut second = suggestion(0, 0.0, 200.0, "earlier");
        second.qid = Some("q1".into());
        second.kind = SuggestionKind::Score;
        second.points = Some(3);

        let mut batch = LayoutBatch::from(vec![first, second]);
        batch.max_points.insert("q1".into(), 10);
        let (objects, report) = map(&layout, &batch);
        assert_eq!(report.objects_created, 5);

        let label = objects.last().unwrap().as_text().unwrap();
        assert_eq!(label.content, "5/10");
        assert!((label.x - 8.0).abs() < 1e-9);
        assert!((label.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_suggestion_json_accepts_numeric_qid() {
        let json = r#"{"page":0,"x":1,"y":2,"w":3,"h":4,"pageWidth":100,"pageHeight":200,"text":"t","type":"score","qid":7,"points":2}"#;
        let s: Suggestion = serde_json::from_str(json).unwrap();
        assert_eq!(s.qid.as_deref(), Some("7"));
        assert_eq!(s.kind, SuggestionKind::Score);
    }

    #[test]
    fn test_service_placements_with_short_page_keys() {
        let json = r#"{"placements":[
            {"type":"score","points":2,"page":0,"x":60,"y":84,"page_w":800,"page_h":1000,"confidence":0.8},
            {"type":"text","text":"show working","page":0,"x":100,"y":300,"w":200,"h":40,"page_w":800,"page_h":1000}
        ]}"#;
        let batch: LayoutBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.suggestions.len(), 2);
        assert_eq!(batch.suggestions[0].page_width, 800.0);
        assert_eq!(batch.suggestions[0].page_height, 1000.0);
        assert_eq!(batch.suggestions[0].confidence, Some(0.8));

        let layout = PageLayout::single(0, Size::new(400.0, 500.0));
        let (objects, report) = map(&layout, &batch);
        assert_eq!(report.applied, 2);
        let AnnotationObject::Score(score) = &objects[0] else { panic!("expected score") };
        assert!((score.x - 30.0).abs() < 1e-9);
        assert!((score.y - 42.0).abs() < 1e-9);
        let text = objects[1].as_text().unwrap();
        // (100 + 200) * 0.5 + 8
        assert!((text.x - 158.0).abs() < 1e-9);
        assert!((text.y - 150.0).abs() < 1e-9);
    }
}
