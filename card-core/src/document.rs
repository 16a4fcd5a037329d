//! The card document: dimensions, background, and the ordered component list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentId, ComponentTag};
use crate::error::ValidationError;
use crate::geometry::GridPolicy;
use crate::patch::ComponentPatch;

/// Card background. Switching kind replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Background {
    /// Solid color.
    Color {
        /// CSS color.
        color: String,
    },
    /// Blurred cover image.
    Cover {
        /// Literal path or a single `{path}` token.
        #[serde(alias = "srcField")]
        path: String,
        /// Blur radius in pixels.
        #[serde(default)]
        blur: f64,
    },
}

impl Background {
    /// The cover background the editor offers by default.
    #[must_use]
    pub fn default_cover() -> Self {
        Self::Cover {
            path: "{versions.0.coverURL}".to_string(),
            blur: 10.0,
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::Color {
            color: "#ffffff".to_string(),
        }
    }
}

/// A card layout.
///
/// Component order is paint order: later components draw on top. Ids are
/// unique within the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDocument {
    /// Name used for the exported file.
    pub config_name: String,
    width: f64,
    height: f64,
    /// Corner radius of the card itself.
    #[serde(default)]
    pub card_corner_radius: f64,
    /// Card background.
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    components: Vec<Component>,
}

impl Default for CardDocument {
    fn default() -> Self {
        Self {
            config_name: "MyCardConfig".to_string(),
            width: 900.0,
            height: 300.0,
            card_corner_radius: 20.0,
            background: Background::default(),
            components: Vec::new(),
        }
    }
}

impl CardDocument {
    /// Create an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not positive and finite.
    pub fn new(config_name: impl Into<String>, width: f64, height: f64) -> Result<Self, ValidationError> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        Ok(Self {
            config_name: config_name.into(),
            width,
            height,
            ..Self::default()
        })
    }

    /// Card width in pixels.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Card height in pixels.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Change the card dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not positive and finite.
    pub fn set_dimensions(&mut self, width: f64, height: f64) -> Result<(), ValidationError> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Grid step for this card under a grid policy.
    #[must_use]
    pub fn grid_step(&self, policy: &GridPolicy) -> f64 {
        policy.step(self.width, self.height)
    }

    /// Components in paint order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the document has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Find a component by id.
    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == *id)
    }

    /// Position of a component in paint order.
    #[must_use]
    pub fn index_of(&self, id: &ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c.id == *id)
    }

    /// Append a component on top of the others.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is already present or a geometry field
    /// is not finite.
    pub fn add(&mut self, component: Component) -> Result<ComponentId, ValidationError> {
        if self.index_of(&component.id).is_some() {
            return Err(ValidationError::DuplicateId(component.id.to_string()));
        }
        check_geometry(&component)?;
        let id = component.id.clone();
        self.components.push(component);
        Ok(id)
    }

    /// Remove a component. Returns it, or `None` if the id is absent.
    pub fn remove(&mut self, id: &ComponentId) -> Option<Component> {
        let index = self.index_of(id)?;
        Some(self.components.remove(index))
    }

    /// Apply a field-level patch to a component.
    ///
    /// Returns `Ok(false)` when no component has the id. Fields the
    /// component's variant does not define are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the component unchanged, when a field the
    /// variant defines is given a non-finite number or a non-positive size.
    pub fn update(&mut self, id: &ComponentId, patch: &ComponentPatch) -> Result<bool, ValidationError> {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("Update for unknown component {id}");
            return Ok(false);
        };
        let component = &self.components[index];
        patch.restricted_to(component.tag()).validate()?;
        self.components[index] = patch.apply(component);
        Ok(true)
    }

    /// Change a component's variant.
    ///
    /// Returns `true` if the component's variant changed. Returns `false`
    /// if the id is absent, the component already has the variant, or its
    /// fields cannot be read as the new variant.
    pub fn retag(&mut self, id: &ComponentId, tag: ComponentTag) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if self.components[index].tag() == tag {
            return false;
        }
        let next = self.components[index].retag(tag);
        if next.tag() != tag {
            return false;
        }
        self.components[index] = next;
        true
    }

    /// Rename the document.
    pub fn set_config_name(&mut self, config_name: impl Into<String>) {
        self.config_name = config_name.into();
    }

    /// Change the corner radius of the card itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is negative or not finite.
    pub fn set_card_corner_radius(&mut self, radius: f64) -> Result<(), ValidationError> {
        check_radius(radius)?;
        self.card_corner_radius = radius;
        Ok(())
    }

    /// Remove the component at `from` and reinsert it at `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either index is out of range.
    pub fn move_component(&mut self, from: usize, to: usize) -> Result<(), ValidationError> {
        let len = self.components.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::IndexOutOfRange { index, len });
            }
        }
        let component = self.components.remove(from);
        self.components.insert(to, component);
        Ok(())
    }

    /// Replace the whole component list.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the list unchanged, if ids repeat or a
    /// geometry field is not finite.
    pub fn replace_components(&mut self, components: Vec<Component>) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for component in &components {
            if !seen.insert(&component.id) {
                return Err(ValidationError::DuplicateId(component.id.to_string()));
            }
            check_geometry(component)?;
        }
        self.components = components;
        Ok(())
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Numbered list labels, e.g. `1: text - Title...`.
    #[must_use]
    pub fn component_labels(&self) -> Vec<String> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, c)| format!("{}: {} - {}", index + 1, c.tag(), c.summary()))
            .collect()
    }

    /// Check every document invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: card dimensions, id
    /// uniqueness, or finite component geometry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_dimension("width", self.width)?;
        check_dimension("height", self.height)?;
        check_radius(self.card_corner_radius)?;
        let mut seen = HashSet::new();
        for component in &self.components {
            if !seen.insert(&component.id) {
                return Err(ValidationError::DuplicateId(component.id.to_string()));
            }
            check_geometry(component)?;
        }
        Ok(())
    }
}

fn check_dimension(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NonPositiveDimension { field, value });
    }
    Ok(())
}

fn check_radius(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: "cardCornerRadius",
        });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: "cardCornerRadius",
            value,
        });
    }
    Ok(())
}

fn check_geometry(component: &Component) -> Result<(), ValidationError> {
    match component
        .geometry_fields()
        .into_iter()
        .find(|(_, value)| !value.is_finite())
    {
        Some((field, _)) => Err(ValidationError::NonFinite { field }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use crate::geometry::Point;

    fn sample_document() -> CardDocument {
        let mut doc = CardDocument::default();
        for (id, tag) in [
            ("a", ComponentTag::RoundedRect),
            ("b", ComponentTag::Text),
            ("c", ComponentTag::Image),
        ] {
            doc.add(Component::create_default(tag, Point::default()).with_id(id))
                .expect("add");
        }
        doc
    }

    fn ids(doc: &CardDocument) -> Vec<&str> {
        doc.components().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_new_rejects_bad_dimensions() {
        assert!(CardDocument::new("card", 0.0, 300.0).is_err());
        assert!(CardDocument::new("card", 900.0, f64::INFINITY).is_err());
        let doc = CardDocument::new("card", 900.0, 300.0).expect("valid");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_add_appends_on_top() {
        let doc = sample_document();
        assert_eq!(ids(&doc), ["a", "b", "c"]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut doc = sample_document();
        let dup = Component::create_default(ComponentTag::Text, Point::default()).with_id("b");
        assert_eq!(doc.add(dup), Err(ValidationError::DuplicateId("b".to_string())));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_remove() {
        let mut doc = sample_document();
        let removed = doc.remove(&ComponentId::from("b")).expect("present");
        assert_eq!(removed.tag(), ComponentTag::Text);
        assert_eq!(ids(&doc), ["a", "c"]);
        assert!(doc.remove(&ComponentId::from("b")).is_none());
    }

    #[test]
    fn test_move_splices() {
        let mut doc = sample_document();
        doc.move_component(0, 2).expect("move");
        assert_eq!(ids(&doc), ["b", "c", "a"]);
        doc.move_component(2, 0).expect("move back");
        assert_eq!(ids(&doc), ["a", "b", "c"]);
    }

    #[test]
    fn test_move_rejects_out_of_range() {
        let mut doc = sample_document();
        let before = doc.clone();
        assert_eq!(
            doc.move_component(1, 3),
            Err(ValidationError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_absent_id_is_noop() {
        let mut doc = sample_document();
        let before = doc.clone();
        let updated = doc
            .update(&ComponentId::from("zzz"), &ComponentPatch::position(5.0, 5.0))
            .expect("no error");
        assert!(!updated);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_rejects_negative_width() {
        let mut doc = sample_document();
        let before = doc.clone();
        let result = doc.update(&ComponentId::from("a"), &ComponentPatch::size(-10.0, 40.0));
        assert!(matches!(
            result,
            Err(ValidationError::NonPositiveDimension { field: "width", .. })
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_update_ignores_invalid_foreign_field() {
        let mut doc = sample_document();
        let before = doc.clone();
        let updated = doc
            .update(&ComponentId::from("b"), &ComponentPatch::size(-10.0, 40.0))
            .expect("foreign fields are not validated");
        assert!(updated);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_retag_keeps_order_and_id() {
        let mut doc = sample_document();
        assert!(doc.retag(&ComponentId::from("a"), ComponentTag::Image));
        assert_eq!(ids(&doc), ["a", "b", "c"]);
        assert!(matches!(doc.components()[0].kind, ComponentKind::Image(_)));
        assert!(!doc.retag(&ComponentId::from("nope"), ComponentTag::Text));
    }

    #[test]
    fn test_retag_reports_no_change() {
        let mut doc = sample_document();
        let before = doc.clone();
        assert!(!doc.retag(&ComponentId::from("b"), ComponentTag::Text));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_retag_with_unreadable_fields_reports_failure() {
        let mut doc = CardDocument::default();
        let mut rect = Component::create_default(ComponentTag::RoundedRect, Point::default())
            .with_id("odd");
        if let ComponentKind::RoundedRect(r) = &mut rect.kind {
            r.extra
                .insert("clip".to_string(), serde_json::Value::from("sometimes"));
        }
        doc.add(rect).expect("add");
        let before = doc.clone();

        assert!(!doc.retag(&ComponentId::from("odd"), ComponentTag::Image));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_card_settings() {
        let mut doc = CardDocument::default();
        doc.set_config_name("Ranked Card");
        doc.set_card_corner_radius(0.0).expect("zero radius");
        assert_eq!(doc.config_name, "Ranked Card");
        assert!(doc.card_corner_radius.abs() < f64::EPSILON);

        assert_eq!(
            doc.set_card_corner_radius(-4.0),
            Err(ValidationError::Negative {
                field: "cardCornerRadius",
                value: -4.0
            })
        );
        assert!(doc.set_card_corner_radius(f64::NAN).is_err());
        assert!(doc.card_corner_radius.abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_background_replaces_kind() {
        let mut doc = CardDocument::default();
        doc.set_background(Background::default_cover());
        let json = serde_json::to_value(&doc.background).expect("serialize");
        assert_eq!(json["kind"], "cover");
        assert!(json.get("color").is_none());
    }

    #[test]
    fn test_component_labels() {
        let doc = sample_document();
        let labels = doc.component_labels();
        assert_eq!(labels[0], "1: roundedRect - (100x100, r=10)");
        assert_eq!(labels[1], "2: text - New Text...");
    }

    #[test]
    fn test_validate_detects_duplicates() {
        let mut doc = sample_document();
        doc.components[2].id = ComponentId::from("a");
        assert_eq!(doc.validate(), Err(ValidationError::DuplicateId("a".to_string())));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn document_with(count: usize) -> CardDocument {
            let mut doc = CardDocument::default();
            for i in 0..count {
                doc.add(Component::create_default(ComponentTag::Text, Point::default()).with_id(format!("c{i}")))
                    .expect("add");
            }
            doc
        }

        proptest! {
            #[test]
            fn prop_move_and_back_restores_order(
                (len, from, to) in (1usize..12).prop_flat_map(|len| (Just(len), 0..len, 0..len))
            ) {
                let mut doc = document_with(len);
                let original = doc.clone();
                doc.move_component(from, to).expect("move");
                prop_assert_eq!(doc.len(), len);
                doc.move_component(to, from).expect("move back");
                prop_assert_eq!(doc, original);
            }

            #[test]
            fn prop_add_then_remove_restores(len in 0usize..8, tag_index in 0usize..4) {
                let mut doc = document_with(len);
                let original = doc.clone();
                let tag = ComponentTag::ALL[tag_index];
                let id = doc.add(Component::create_default(tag, Point::new(10.0, 10.0))).expect("add");
                doc.remove(&id).expect("remove");
                prop_assert_eq!(doc, original);
            }
        }
    }
}
