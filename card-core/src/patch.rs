//! Field-level component updates.
//!
//! A [`ComponentPatch`] names any subset of component fields. Applying it
//! touches only the fields the component's variant defines; everything else
//! in the patch is dropped without error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::component::{
    Component, ComponentKind, ComponentTag, MapField, RatingSegment, Shadow, TextAlign,
};
use crate::error::ValidationError;

/// Partial update of a shadow. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShadowPatch {
    /// CSS color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Horizontal offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,
    /// Vertical offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
    /// Blur radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
}

impl ShadowPatch {
    fn merge_into(&self, shadow: &mut Shadow) {
        assign(&mut shadow.color, self.color.as_ref());
        assign(&mut shadow.offset_x, self.offset_x.as_ref());
        assign(&mut shadow.offset_y, self.offset_y.as_ref());
        assign(&mut shadow.blur, self.blur.as_ref());
    }
}

/// A partial update to a component, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ComponentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<MapField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(alias = "srcField", skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<Vec<RatingSegment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_spacing: Option<f64>,
}

impl ComponentPatch {
    /// Patch that moves a component.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that resizes a component.
    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Build a single-field patch from a form key and a JSON value.
    ///
    /// Keys are wire names (`cornerRadius`, `srcField`, ...). A dotted key
    /// such as `shadow.offsetX` edits one field of a nested object. Unknown
    /// keys and values of the wrong type give an empty patch.
    #[must_use]
    pub fn field(key: &str, value: Value) -> Self {
        let nested = key
            .rsplit('.')
            .fold(value, |inner, segment| {
                let mut object = Map::new();
                object.insert(segment.to_string(), inner);
                Value::Object(object)
            });
        match serde_json::from_value::<Self>(nested) {
            Ok(patch) => {
                if patch.is_empty() {
                    tracing::debug!("Ignoring patch for unknown field {key}");
                }
                patch
            }
            Err(e) => {
                tracing::debug!("Ignoring patch for {key}: {e}");
                Self::default()
            }
        }
    }

    /// Whether the patch sets nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The subset of this patch a variant defines.
    #[must_use]
    pub fn restricted_to(&self, tag: ComponentTag) -> Self {
        let mut legal = Self {
            x: self.x,
            y: self.y,
            ..Self::default()
        };
        match tag {
            ComponentTag::RoundedRect => {
                legal.width = self.width;
                legal.height = self.height;
                legal.corner_radius = self.corner_radius;
                legal.fill_style.clone_from(&self.fill_style);
            }
            ComponentTag::Text => {
                legal.field.clone_from(&self.field);
                legal.text.clone_from(&self.text);
                legal.font.clone_from(&self.font);
                legal.fill_style.clone_from(&self.fill_style);
                legal.max_width = self.max_width;
                legal.text_align = self.text_align;
            }
            ComponentTag::Image => {
                legal.width = self.width;
                legal.height = self.height;
                legal.corner_radius = self.corner_radius;
                legal.source_path.clone_from(&self.source_path);
                legal.clip = self.clip;
                legal.shadow.clone_from(&self.shadow);
            }
            ComponentTag::RatingBar => {
                legal.height = self.height;
                legal.ratings.clone_from(&self.ratings);
                legal.default_width = self.default_width;
                legal.special_width = self.special_width;
                legal.default_spacing = self.default_spacing;
                legal.special_spacing = self.special_spacing;
            }
        }
        legal
    }

    /// Check the numeric fields this patch sets.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFinite`] for NaN or infinite numbers
    /// and [`ValidationError::NonPositiveDimension`] for a width or height
    /// that is zero or negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let shadow = self.shadow.as_ref();
        let numbers = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("cornerRadius", self.corner_radius),
            ("maxWidth", self.max_width),
            ("defaultWidth", self.default_width),
            ("specialWidth", self.special_width),
            ("defaultSpacing", self.default_spacing),
            ("specialSpacing", self.special_spacing),
            ("shadow.offsetX", shadow.and_then(|s| s.offset_x)),
            ("shadow.offsetY", shadow.and_then(|s| s.offset_y)),
            ("shadow.blur", shadow.and_then(|s| s.blur)),
        ];
        for (field, value) in numbers {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(ValidationError::NonFinite { field });
            }
        }

        let dimensions = [
            ("width", self.width),
            ("height", self.height),
            ("defaultWidth", self.default_width),
            ("specialWidth", self.special_width),
        ];
        for (field, value) in dimensions {
            if let Some(value) = value.filter(|v| *v <= 0.0) {
                return Err(ValidationError::NonPositiveDimension { field, value });
            }
        }
        Ok(())
    }

    /// Apply the patch, returning the updated component.
    ///
    /// Fields the component's variant does not define are ignored. The
    /// input is not modified.
    #[must_use]
    pub fn apply(&self, component: &Component) -> Component {
        let legal = self.restricted_to(component.tag());
        if legal != *self {
            tracing::debug!(
                "Ignoring fields not defined on {} for component {}",
                component.tag(),
                component.id
            );
        }

        let mut next = component.clone();
        assign(&mut next.x, legal.x.as_ref());
        assign(&mut next.y, legal.y.as_ref());

        match &mut next.kind {
            ComponentKind::RoundedRect(rect) => {
                assign(&mut rect.width, legal.width.as_ref());
                assign(&mut rect.height, legal.height.as_ref());
                assign(&mut rect.corner_radius, legal.corner_radius.as_ref());
                assign(&mut rect.fill_style, legal.fill_style.as_ref());
            }
            ComponentKind::Text(text) => {
                if legal.field.is_some() {
                    text.field.clone_from(&legal.field);
                }
                assign(&mut text.text, legal.text.as_ref());
                assign(&mut text.font, legal.font.as_ref());
                assign(&mut text.fill_style, legal.fill_style.as_ref());
                assign(&mut text.max_width, legal.max_width.as_ref());
                assign(&mut text.text_align, legal.text_align.as_ref());
            }
            ComponentKind::Image(image) => {
                assign(&mut image.width, legal.width.as_ref());
                assign(&mut image.height, legal.height.as_ref());
                assign(&mut image.corner_radius, legal.corner_radius.as_ref());
                assign(&mut image.source_path, legal.source_path.as_ref());
                assign(&mut image.clip, legal.clip.as_ref());
                if let Some(shadow_patch) = &legal.shadow {
                    shadow_patch.merge_into(image.shadow.get_or_insert_with(Shadow::default));
                }
            }
            ComponentKind::RatingBar(bar) => {
                assign(&mut bar.height, legal.height.as_ref());
                assign(&mut bar.ratings, legal.ratings.as_ref());
                assign(&mut bar.default_width, legal.default_width.as_ref());
                assign(&mut bar.special_width, legal.special_width.as_ref());
                assign(&mut bar.default_spacing, legal.default_spacing.as_ref());
                assign(&mut bar.special_spacing, legal.special_spacing.as_ref());
            }
        }
        next
    }
}

fn assign<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        slot.clone_from(value);
    }
}
