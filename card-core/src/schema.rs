//! Document text: the portable, pretty-printed form of a card document.
//!
//! Shape:
//! `{configName, width, height, cardCornerRadius, background: {kind, ...},
//! components: [{id, type, x, y, ...}]}`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::component::Component;
use crate::document::CardDocument;
use crate::error::{CardResult, ParseError};
use crate::store::sanitize_filename;

/// Render a document as pretty-printed text.
///
/// Component order and every field are preserved, including fields carried
/// over from earlier variants.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_document_text(doc: &CardDocument) -> CardResult<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse document text.
///
/// Components without an id get `comp<N>`, where `N` is their one-based
/// position, moved past any id already in use.
///
/// # Errors
///
/// Returns an error for malformed text, a non-object root, duplicate
/// explicit ids, or a document that violates its invariants.
pub fn from_document_text(text: &str) -> Result<CardDocument, ParseError> {
    let mut value: Value = serde_json::from_str(text)?;
    let Value::Object(root) = &mut value else {
        return Err(ParseError::NotAnObject);
    };

    if let Some(Value::Object(background)) = root.get_mut("background") {
        normalize_background(background);
    }
    if let Some(Value::Array(components)) = root.get_mut("components") {
        assign_missing_ids(components)?;
    }

    let doc: CardDocument = serde_json::from_value(value)?;
    doc.validate()
        .map_err(|e| ParseError::InvalidDocument(e.to_string()))?;
    Ok(doc)
}

/// Parse a bare component list, as edited in a raw text panel.
///
/// Ids are assigned the same way as for a whole document.
///
/// # Errors
///
/// Returns an error for malformed text, a root that is not a list, or
/// duplicate explicit ids.
pub fn components_from_text(text: &str) -> Result<Vec<Component>, ParseError> {
    let mut value: Value = serde_json::from_str(text)?;
    let Value::Array(components) = &mut value else {
        return Err(ParseError::InvalidDocument(
            "component list must be an array".to_string(),
        ));
    };
    assign_missing_ids(components)?;
    Ok(serde_json::from_value(value)?)
}

/// File name an exported document is saved under.
#[must_use]
pub fn export_filename(config_name: &str) -> String {
    let stem = sanitize_filename(config_name.trim());
    if stem.is_empty() {
        "card.json".to_string()
    } else {
        format!("{stem}.json")
    }
}

// Older documents tag the background with `type` instead of `kind`.
fn normalize_background(background: &mut Map<String, Value>) {
    if !background.contains_key("kind") {
        if let Some(kind) = background.remove("type") {
            background.insert("kind".to_string(), kind);
        }
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn assign_missing_ids(components: &mut [Value]) -> Result<(), ParseError> {
    let mut taken = HashSet::new();
    for component in components.iter() {
        if let Some(id) = component.get("id").and_then(id_text) {
            if !taken.insert(id.clone()) {
                return Err(ParseError::DuplicateId(id));
            }
        }
    }

    for (index, component) in components.iter_mut().enumerate() {
        let Value::Object(fields) = component else {
            continue;
        };
        if fields.get("id").and_then(id_text).is_some() {
            continue;
        }
        let mut n = index + 1;
        while taken.contains(&format!("comp{n}")) {
            n += 1;
        }
        let id = format!("comp{n}");
        tracing::debug!("Assigned id {id} to component at position {index}");
        taken.insert(id.clone());
        fields.insert("id".to_string(), Value::String(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentTag};
    use crate::document::Background;
    use crate::geometry::Point;

    fn sample_document() -> CardDocument {
        let mut doc = CardDocument::new("Ranked Card", 900.0, 300.0).expect("valid");
        doc.set_background(Background::default_cover());
        for tag in ComponentTag::ALL {
            doc.add(Component::create_default(tag, Point::new(30.0, 60.0)))
                .expect("add");
        }
        doc
    }

    #[test]
    fn test_round_trip() {
        let doc = sample_document();
        let text = to_document_text(&doc).expect("serialize");
        let parsed = from_document_text(&text).expect("parse");
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_text_shape() {
        let text = to_document_text(&sample_document()).expect("serialize");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["configName"], "Ranked Card");
        assert_eq!(value["background"]["kind"], "cover");
        assert_eq!(value["components"][0]["type"], "text");
        assert_eq!(value["components"][3]["type"], "starRating");
    }

    #[test]
    fn test_missing_ids_use_position() {
        let text = r#"{
            "configName": "c", "width": 900, "height": 300,
            "components": [
                {"type": "text", "x": 0, "y": 0},
                {"id": "comp1", "type": "image", "x": 0, "y": 0},
                {"type": "roundedRect", "x": 0, "y": 0}
            ]
        }"#;
        let doc = from_document_text(text).expect("parse");
        let ids: Vec<_> = doc.components().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["comp2", "comp1", "comp3"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let text = r#"{"configName":"c","width":9,"height":3,
            "components":[{"id":"a","type":"text"},{"id":"a","type":"image"}]}"#;
        assert!(matches!(
            from_document_text(text),
            Err(ParseError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn test_malformed_and_invalid_text() {
        assert!(matches!(
            from_document_text("{not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(from_document_text("[]"), Err(ParseError::NotAnObject)));
        assert!(matches!(
            from_document_text(r#"{"configName":"c","width":0,"height":3}"#),
            Err(ParseError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_legacy_background_tag() {
        let text = r#"{"configName":"c","width":9,"height":3,
            "background":{"type":"cover","srcField":"versions.0.coverURL","blur":10}}"#;
        let doc = from_document_text(text).expect("parse");
        assert_eq!(
            doc.background,
            Background::Cover {
                path: "versions.0.coverURL".to_string(),
                blur: 10.0
            }
        );
    }

    #[test]
    fn test_stale_fields_survive_round_trip() {
        let mut doc = sample_document();
        let id = doc.components()[2].id.clone();
        assert!(doc.retag(&id, ComponentTag::Text));
        let text = to_document_text(&doc).expect("serialize");
        let parsed = from_document_text(&text).expect("parse");
        assert_eq!(parsed, doc);
        assert!(matches!(parsed.components()[2].kind, ComponentKind::Text(_)));
        assert!(parsed.components()[2].kind.extra().contains_key("cornerRadius"));
    }

    #[test]
    fn test_components_from_text() {
        let components =
            components_from_text(r#"[{"type":"rating","x":10,"y":20}]"#).expect("parse");
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id.as_str(), "comp1");
        assert!(components_from_text("{}").is_err());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("MyCardConfig"), "MyCardConfig.json");
        assert_eq!(export_filename("my card/v2"), "my_card_v2.json");
        assert_eq!(export_filename("  "), "card.json");
    }

    mod proptest_tests {
        use super::*;
        use crate::geometry::Size;
        use proptest::prelude::*;

        type ComponentSpec = (usize, f64, f64, f64, f64, Vec<usize>, bool);

        fn component_spec() -> impl Strategy<Value = ComponentSpec> {
            (
                0usize..4,
                -2_000.0f64..2_000.0,
                -2_000.0f64..2_000.0,
                1.0f64..800.0,
                1.0f64..800.0,
                prop::collection::vec(0usize..4, 0..4),
                any::<bool>(),
            )
        }

        fn build_document(
            name: String,
            radius: f64,
            cover_blur: Option<f64>,
            specs: Vec<ComponentSpec>,
        ) -> CardDocument {
            let mut doc = CardDocument::new(name, 900.0, 300.0).expect("valid");
            doc.set_card_corner_radius(radius).expect("radius");
            if let Some(blur) = cover_blur {
                doc.set_background(Background::Cover {
                    path: "{versions.0.coverURL}".to_string(),
                    blur,
                });
            }
            for (index, (tag, x, y, width, height, retags, numeric_id)) in
                specs.into_iter().enumerate()
            {
                let id = if numeric_id {
                    (1_700_000_000_000usize + index).to_string()
                } else {
                    format!("comp{index}")
                };
                let mut component =
                    Component::create_default(ComponentTag::ALL[tag], Point::new(x, y))
                        .with_id(id);
                component.set_size(Size::new(width, height));
                for next in retags {
                    component = component.retag(ComponentTag::ALL[next]);
                }
                doc.add(component).expect("add");
            }
            doc
        }

        // Rewrites decimal string ids as JSON numbers, as older files store them.
        fn with_numeric_ids(text: &str) -> String {
            let mut value: Value = serde_json::from_str(text).expect("json");
            if let Some(Value::Array(items)) = value.get_mut("components") {
                for item in items {
                    let number = item
                        .get("id")
                        .and_then(Value::as_str)
                        .and_then(|id| id.parse::<u64>().ok());
                    if let Some(number) = number {
                        item["id"] = Value::from(number);
                    }
                }
            }
            value.to_string()
        }

        proptest! {
            #[test]
            fn prop_document_text_round_trips(
                name in "[A-Za-z0-9 ]{0,16}",
                radius in 0.0f64..60.0,
                cover_blur in prop::option::of(0.0f64..40.0),
                specs in prop::collection::vec(component_spec(), 0..8)
            ) {
                let doc = build_document(name, radius, cover_blur, specs);
                let text = to_document_text(&doc).expect("serialize");

                let parsed = from_document_text(&text).expect("parse");
                prop_assert_eq!(&parsed, &doc);

                let numeric = from_document_text(&with_numeric_ids(&text)).expect("parse");
                prop_assert_eq!(&numeric, &doc);
            }
        }
    }
}
