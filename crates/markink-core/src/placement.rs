//! Click-to-place annotation requests.

use crate::config::EditorConfig;
use crate::objects::{
    AnnotationObject, Arrow, FontWeight, Image, Line, Score, Target, Text, TextMeasurer,
};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Font size of glyph stamps such as check marks.
const GLYPH_FONT_SIZE: f64 = 48.0;
/// Font size of `awarded/max` question labels.
const QUESTION_SCORE_FONT_SIZE: f64 = 20.0;

/// What the next canvas click places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Placement {
    Text { content: String },
    Score { points: i64 },
    Line,
    Arrow,
    /// A single large symbol, e.g. a check mark.
    Glyph { symbol: String },
    Image { source: String, size: Size },
    Target { content: String },
    /// A comment with a score marker pinned to it, grouped.
    Combo { content: String, points: i64 },
    /// Several comments stacked downwards from the click.
    Bulk { comments: Vec<String> },
    /// A bold `awarded/max` question total.
    #[serde(rename = "qscore")]
    QuestionScore { awarded: i64, max: Option<i64> },
}

impl Placement {
    pub fn name(&self) -> &'static str {
        match self {
            Placement::Text { .. } => "text",
            Placement::Score { .. } => "score",
            Placement::Line => "line",
            Placement::Arrow => "arrow",
            Placement::Glyph { .. } => "glyph",
            Placement::Image { .. } => "image",
            Placement::Target { .. } => "target",
            Placement::Combo { .. } => "combo",
            Placement::Bulk { .. } => "bulk",
            Placement::QuestionScore { .. } => "qscore",
        }
    }

    /// Build the objects for a click at page-local `at` on a page of `page_size`.
    pub fn build(
        &self,
        page: usize,
        at: Point,
        page_size: Size,
        config: &EditorConfig,
        measurer: &dyn TextMeasurer,
    ) -> Vec<AnnotationObject> {
        match self {
            Placement::Text { content } => {
                vec![AnnotationObject::Text(comment(page, at, content, config, measurer))]
            }
            Placement::Score { points } => {
                let mut score = Score::new(page, at, *points);
                score.font_size = config.font_size;
                vec![AnnotationObject::Score(score)]
            }
            Placement::Line => vec![AnnotationObject::Line(Line::new(page, at))],
            Placement::Arrow => {
                let mut arrow = Arrow::new(page, at, at + Vec2::new(Arrow::DEFAULT_LENGTH, 0.0));
                arrow.stroke_width = config.stroke_width;
                vec![AnnotationObject::Arrow(arrow)]
            }
            Placement::Glyph { symbol } => {
                let side = Text::MIN_WIDTH;
                let mut text = Text::with_size(page, at, Size::new(side, side), symbol.clone());
                text.font_size = GLYPH_FONT_SIZE;
                text.fixed_height = true;
                vec![AnnotationObject::Text(text)]
            }
            Placement::Image { source, size } => {
                let size = Image::fit_initial_size(*size);
                vec![AnnotationObject::Image(Image::new(page, at, size, source.clone()))]
            }
            Placement::Target { content } => vec![AnnotationObject::Target(Target::new(
                page,
                at,
                content.clone(),
                config.font_size,
            ))],
            Placement::Combo { content, points } => {
                let text = comment(page, at, content, config, measurer);
                let group = Uuid::new_v4();
                let mut marker = pinned_score(&text, *points, config.font_size);
                marker.group = Some(group);
                let mut text = text;
                text.group = Some(group);
                vec![AnnotationObject::Text(text), AnnotationObject::Score(marker)]
            }
            Placement::Bulk { comments } => comments
                .iter()
                .enumerate()
                .map(|(i, content)| {
                    let y = at.y + i as f64 * config.bulk_increment;
                    let mut text = comment(page, Point::new(at.x, y), content, config, measurer);
                    text.y = text.y.min(page_size.height - text.h).max(0.0);
                    AnnotationObject::Text(text)
                })
                .collect(),
            Placement::QuestionScore { awarded, max } => {
                vec![AnnotationObject::Text(question_label(page, at, *awarded, *max, measurer))]
            }
        }
    }
}

/// A comment box at the configured default size, grown to fit its content.
pub(crate) fn comment(
    page: usize,
    at: Point,
    content: &str,
    config: &EditorConfig,
    measurer: &dyn TextMeasurer,
) -> Text {
    let mut text = Text::with_size(page, at, config.text_size, content.to_string());
    text.font_size = config.font_size;
    text.fit_height(measurer);
    text
}

/// Score marker pinned inside the bottom-left corner of a text box.
pub(crate) fn pinned_score(text: &Text, points: i64, font_size: f64) -> Score {
    let marker_h = Score::marker_height_for(text.h);
    let mut score = Score::new(text.page, Point::new(text.x + 4.0, text.y + text.h - marker_h), points);
    score.font_size = font_size;
    score
}

/// Bold `awarded/max` label. Without a max only the awarded sum is shown.
pub(crate) fn question_label(
    page: usize,
    at: Point,
    awarded: i64,
    max: Option<i64>,
    measurer: &dyn TextMeasurer,
) -> Text {
    let content = match max {
        Some(max) => format!("{awarded}/{max}"),
        None => awarded.to_string(),
    };
    let measured = measurer.measure(&content, QUESTION_SCORE_FONT_SIZE, FontWeight::Bold, f64::MAX);
    let size = Size::new(
        (measured.width + 2.0 * Text::PADDING).max(Text::MIN_WIDTH),
        (measured.height + 2.0 * Text::PADDING).max(Text::MIN_HEIGHT),
    );
    let mut text = Text::with_size(page, at, size, content);
    text.font_size = QUESTION_SCORE_FONT_SIZE;
    text.font_weight = FontWeight::Bold;
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ApproxTextMeasurer, ObjectKind};

    fn build(placement: Placement, at: Point) -> Vec<AnnotationObject> {
        placement.build(
            0,
            at,
            Size::new(600.0, 800.0),
            &EditorConfig::default(),
            &ApproxTextMeasurer::default(),
        )
    }

    #[test]
    fn test_text_placement_defaults() {
        let objects = build(Placement::Text { content: "ok".into() }, Point::new(40.0, 40.0));
        let text = objects[0].as_text().unwrap();
        assert!((text.w - 240.0).abs() < f64::EPSILON);
        assert!((text.h - 100.0).abs() < f64::EPSILON);
        assert!((text.x - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_combo_is_grouped() {
        let objects = build(
            Placement::Combo {
                content: "good".into(),
                points: 2,
            },
            Point::new(10.0, 10.0),
        );
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].kind(), ObjectKind::Score);
        assert!(objects[0].group().is_some());
        assert_eq!(objects[0].group(), objects[1].group());

        let text_bounds = objects[0].bounds();
        let AnnotationObject::Score(score) = &objects[1] else { panic!("expected score") };
        assert!((score.x - (text_bounds.x0 + 4.0)).abs() < 1e-9);
        assert!((score.y - (text_bounds.y1 - 22.0)).abs() < 1e-9);
    }

    #[test]
    fn test_bulk_stacks_and_clamps() {
        let comments = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let objects = build(Placement::Bulk { comments }, Point::new(20.0, 600.0));
        let ys: Vec<f64> = objects.iter().map(|o| o.as_text().unwrap().y).collect();
        assert!((ys[0] - 600.0).abs() < f64::EPSILON);
        assert!((ys[1] - 700.0).abs() < f64::EPSILON);
        // Later rows would overflow the 800px page
        assert!((ys[2] - 700.0).abs() < f64::EPSILON);
        assert!(objects.iter().all(|o| o.group().is_none()));
    }

    #[test]
    fn test_question_score_label() {
        let objects = build(
            Placement::QuestionScore {
                awarded: 7,
                max: Some(10),
            },
            Point::ZERO,
        );
        let text = objects[0].as_text().unwrap();
        assert_eq!(text.content, "7/10");
        assert_eq!(text.font_weight, FontWeight::Bold);
    }

    #[test]
    fn test_glyph_is_fixed() {
        let objects = build(Placement::Glyph { symbol: "✓".into() }, Point::ZERO);
        let text = objects[0].as_text().unwrap();
        assert!(text.fixed_height);
        assert!((text.font_size - 48.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_placement_serde_tag() {
        let json = serde_json::to_value(Placement::QuestionScore { awarded: 1, max: None }).unwrap();
        assert_eq!(json["kind"], "qscore");
        assert_eq!(Placement::Line.name(), "line");
    }
}
