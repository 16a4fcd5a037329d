//! Display-ready projection of a document against a data snapshot.
//!
//! The renderer never resolves tokens itself. It receives a [`CardView`] in
//! which every token has been replaced and every rating bar laid out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::component::{Component, ComponentId, ComponentKind, RatingBar, Shadow, TextAlign};
use crate::document::{Background, CardDocument};
use crate::geometry::Point;
use crate::token::{classify, resolve_text, RatingClass};

/// Resolved background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BackgroundView {
    /// Solid color.
    Color {
        /// CSS color.
        color: String,
    },
    /// Blurred cover image.
    Cover {
        /// Resolved image source.
        source: String,
        /// Blur radius.
        blur: f64,
    },
}

/// One laid-out rating box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    /// Difficulty label.
    pub label: String,
    /// Resolved rating text.
    pub value: String,
    /// CSS fill.
    pub color: String,
    /// Sizing class.
    pub class: RatingClass,
    /// Left edge in card pixels.
    pub x: f64,
    /// Top edge in card pixels.
    pub y: f64,
    /// Box width.
    pub width: f64,
    /// Box height.
    pub height: f64,
}

/// Resolved variant content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum ItemContent {
    #[serde(rename_all = "camelCase")]
    RoundedRect {
        width: f64,
        height: f64,
        corner_radius: f64,
        fill_style: String,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font: String,
        fill_style: String,
        max_width: f64,
        text_align: TextAlign,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        width: f64,
        height: f64,
        source: String,
        corner_radius: f64,
        clip: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        shadow: Option<Shadow>,
    },
    #[serde(rename = "starRating")]
    RatingBar { segments: Vec<SegmentView> },
}

/// A resolved component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    /// Component id.
    pub id: ComponentId,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Resolved content.
    #[serde(flatten)]
    pub content: ItemContent,
}

/// Everything the renderer needs to paint a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// Card width.
    pub width: f64,
    /// Card height.
    pub height: f64,
    /// Card corner radius.
    pub card_corner_radius: f64,
    /// Resolved background.
    pub background: BackgroundView,
    /// Items in paint order.
    pub items: Vec<ItemView>,
}

impl CardView {
    /// Resolve a document against a data snapshot.
    #[must_use]
    pub fn build(doc: &CardDocument, data: &Value) -> Self {
        let background = match &doc.background {
            Background::Color { color } => BackgroundView::Color {
                color: color.clone(),
            },
            Background::Cover { path, blur } => BackgroundView::Cover {
                source: resolve_source(path, data),
                blur: *blur,
            },
        };
        Self {
            width: doc.width(),
            height: doc.height(),
            card_corner_radius: doc.card_corner_radius,
            background,
            items: doc
                .components()
                .iter()
                .map(|component| item_view(component, data))
                .collect(),
        }
    }
}

fn item_view(component: &Component, data: &Value) -> ItemView {
    let content = match &component.kind {
        ComponentKind::RoundedRect(rect) => ItemContent::RoundedRect {
            width: rect.width,
            height: rect.height,
            corner_radius: rect.corner_radius,
            fill_style: rect.fill_style.clone(),
        },
        ComponentKind::Text(text) => ItemContent::Text {
            text: resolve_text(&text.text, data).unwrap_or_default(),
            font: text.font.clone(),
            fill_style: text.fill_style.clone(),
            max_width: text.max_width,
            text_align: text.text_align,
        },
        ComponentKind::Image(image) => ItemContent::Image {
            width: image.width,
            height: image.height,
            source: resolve_source(&image.source_path, data),
            corner_radius: image.corner_radius,
            clip: image.clip,
            shadow: image.shadow.clone(),
        },
        ComponentKind::RatingBar(bar) => ItemContent::RatingBar {
            segments: layout_rating_bar(bar, component.position(), data),
        },
    };
    ItemView {
        id: component.id.clone(),
        x: component.x,
        y: component.y,
        content,
    }
}

// A missing image falls back to the literal text so the renderer can show
// what was asked for.
fn resolve_source(template: &str, data: &Value) -> String {
    resolve_text(template, data).unwrap_or_else(|| template.to_string())
}

/// Lay out the segments of a rating bar from `origin`.
///
/// Segments whose token does not resolve are skipped and take no space.
/// Each included segment advances the next one by its class spacing.
#[must_use]
pub fn layout_rating_bar(bar: &RatingBar, origin: Point, data: &Value) -> Vec<SegmentView> {
    let mut offset = 0.0;
    let mut segments = Vec::with_capacity(bar.ratings.len());
    for segment in &bar.ratings {
        let value = resolve_text(&segment.rating_token, data);
        let Some(class) = classify(value.as_deref()) else {
            continue;
        };
        let (width, spacing) = match class {
            RatingClass::Special => (bar.special_width, bar.special_spacing),
            RatingClass::Default => (bar.default_width, bar.default_spacing),
        };
        segments.push(SegmentView {
            label: segment.label.clone(),
            value: value.unwrap_or_default(),
            color: segment.color.clone(),
            class,
            x: origin.x + offset,
            y: origin.y,
            width,
            height: bar.height,
        });
        offset += spacing;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentTag;
    use serde_json::json;

    fn beatmap() -> Value {
        json!({
            "metadata": {"songName": "Night Drive"},
            "starRatings": {"ES": "Unranked", "HARD": 7.2, "EXP": "Qualified"},
            "versions": [{"coverURL": "https://cdn.example/cover.jpg"}]
        })
    }

    #[test]
    fn test_rating_layout_skips_missing_segments() {
        let bar = RatingBar::default();
        let segments = layout_rating_bar(&bar, Point::new(10.0, 20.0), &beatmap());

        let labels: Vec<_> = segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["ES", "HARD", "EXP"]);

        assert_eq!(segments[0].class, RatingClass::Special);
        assert!((segments[0].x - 10.0).abs() < f64::EPSILON);
        assert!((segments[0].width - 120.0).abs() < f64::EPSILON);

        assert_eq!(segments[1].value, "7.2");
        assert!((segments[1].x - 140.0).abs() < f64::EPSILON);
        assert!((segments[1].width - 100.0).abs() < f64::EPSILON);

        assert!((segments[2].x - 250.0).abs() < f64::EPSILON);
        assert!((segments[2].y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_view_resolves_tokens() {
        let mut doc = CardDocument::default();
        doc.set_background(Background::default_cover());
        let mut text = Component::create_default(ComponentTag::Text, Point::default());
        if let ComponentKind::Text(t) = &mut text.kind {
            t.text = "{metadata.songName}".to_string();
        }
        doc.add(text).expect("add");
        let mut missing = Component::create_default(ComponentTag::Text, Point::default());
        if let ComponentKind::Text(t) = &mut missing.kind {
            t.text = "{metadata.levelAuthorName}".to_string();
        }
        doc.add(missing).expect("add");
        doc.add(Component::create_default(ComponentTag::Image, Point::default()))
            .expect("add");

        let view = CardView::build(&doc, &beatmap());
        assert_eq!(
            view.background,
            BackgroundView::Cover {
                source: "https://cdn.example/cover.jpg".to_string(),
                blur: 10.0
            }
        );
        assert!(matches!(&view.items[0].content, ItemContent::Text { text, .. } if text == "Night Drive"));
        assert!(matches!(&view.items[1].content, ItemContent::Text { text, .. } if text.is_empty()));
        assert!(matches!(
            &view.items[2].content,
            ItemContent::Image { source, .. } if source == "https://cdn.example/cover.jpg"
        ));
    }

    #[test]
    fn test_image_miss_falls_back_to_literal() {
        let mut doc = CardDocument::default();
        doc.add(Component::create_default(ComponentTag::Image, Point::default()))
            .expect("add");
        let view = CardView::build(&doc, &json!({}));
        assert!(matches!(
            &view.items[0].content,
            ItemContent::Image { source, .. } if source == "{versions.0.coverURL}"
        ));
    }

    #[test]
    fn test_view_wire_shape() {
        let mut doc = CardDocument::default();
        doc.add(Component::create_default(ComponentTag::RatingBar, Point::default()))
            .expect("add");
        let json = serde_json::to_value(CardView::build(&doc, &beatmap())).expect("serialize");
        assert_eq!(json["items"][0]["type"], "starRating");
        assert_eq!(json["items"][0]["segments"][0]["class"], "special");
        assert_eq!(json["background"]["kind"], "color");
    }
}
