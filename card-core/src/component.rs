//! Card components - the placeable building blocks of a card.
//!
//! Every component carries an id and a position; the rest of its fields
//! depend on its variant. Fields a variant does not define are kept in the
//! variant's `extra` map, so a component retagged to another variant and
//! back again loses nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::geometry::{Point, Size};

/// Unique identifier for a component within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Create a new unique component ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Ids written by older editors are millisecond timestamps, i.e. numbers.
impl<'de> Deserialize<'de> for ComponentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// Variant discriminant, used by the factory and by retagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentTag {
    /// Filled rectangle with rounded corners.
    RoundedRect,
    /// Single line of text.
    Text,
    /// Image box.
    Image,
    /// Row of difficulty rating boxes.
    #[serde(rename = "starRating")]
    RatingBar,
}

impl ComponentTag {
    /// All tags in palette order.
    pub const ALL: [Self; 4] = [Self::Text, Self::Image, Self::RoundedRect, Self::RatingBar];

    /// Wire name used in the `type` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoundedRect => "roundedRect",
            Self::Text => "text",
            Self::Image => "image",
            Self::RatingBar => "starRating",
        }
    }

    /// Whether components of this variant have a draggable size.
    #[must_use]
    pub const fn is_resizable(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no component variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component type: {0}")]
pub struct UnknownTag(pub String);

impl FromStr for ComponentTag {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "roundedRect" | "rect" => Ok(Self::RoundedRect),
            "text" | "textField" => Ok(Self::Text),
            "image" | "coverImage" => Ok(Self::Image),
            "starRating" | "ratingBar" | "rating" => Ok(Self::RatingBar),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// Map metadata a text field is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapField {
    /// Song title.
    MapName,
    /// Song author.
    Author,
    /// Level author.
    Mapper,
    /// Song subtitle.
    MapSubname,
    /// Song length.
    Duration,
    /// Anything else.
    Custom(String),
}

impl MapField {
    /// Known fields in palette order.
    pub const KNOWN: [Self; 5] = [
        Self::MapName,
        Self::Author,
        Self::Mapper,
        Self::MapSubname,
        Self::Duration,
    ];

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::MapName => "mapname",
            Self::Author => "author",
            Self::Mapper => "mapper",
            Self::MapSubname => "mapsubname",
            Self::Duration => "duration",
            Self::Custom(name) => name,
        }
    }

    /// Preset label: the wire name with its first letter capitalised.
    #[must_use]
    pub fn label(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl From<String> for MapField {
    fn from(value: String) -> Self {
        match value.as_str() {
            "mapname" => Self::MapName,
            "author" => Self::Author,
            "mapper" => Self::Mapper,
            "mapsubname" => Self::MapSubname,
            "duration" => Self::Duration,
            _ => Self::Custom(value),
        }
    }
}

impl From<MapField> for String {
    fn from(value: MapField) -> Self {
        match value {
            MapField::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left aligned.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
}

/// Drop shadow behind an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// CSS color.
    pub color: String,
    /// Horizontal offset in pixels.
    pub offset_x: f64,
    /// Vertical offset in pixels.
    pub offset_y: f64,
    /// Blur radius in pixels.
    pub blur: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "rgba(0,0,0,0.5)".to_string(),
            offset_x: 5.0,
            offset_y: 5.0,
            blur: 5.0,
        }
    }
}

/// A filled rectangle with rounded corners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoundedRect {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Corner radius in pixels.
    pub corner_radius: f64,
    /// CSS fill.
    pub fill_style: String,
    /// Fields carried over from other variants.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RoundedRect {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            corner_radius: 10.0,
            fill_style: "transparent".to_string(),
            extra: Map::new(),
        }
    }
}

/// A line of text, literal or bound to a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextField {
    /// Map field this text shows, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<MapField>,
    /// Literal text or a single `{path}` token.
    pub text: String,
    /// CSS font shorthand.
    pub font: String,
    /// CSS fill.
    pub fill_style: String,
    /// Wrap width in pixels.
    pub max_width: f64,
    /// Alignment within `max_width`.
    pub text_align: TextAlign,
    /// Fields carried over from other variants.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TextField {
    fn default() -> Self {
        Self {
            field: None,
            text: "New Text".to_string(),
            font: "24px sans-serif".to_string(),
            fill_style: "white".to_string(),
            max_width: 200.0,
            text_align: TextAlign::Left,
            extra: Map::new(),
        }
    }
}

/// An image box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageSlot {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
    /// Literal path or a single `{path}` token.
    #[serde(alias = "srcField")]
    pub source_path: String,
    /// Corner radius in pixels.
    pub corner_radius: f64,
    /// Clip the image to the rounded box.
    pub clip: bool,
    /// Optional drop shadow. Written as `null` when absent so that a
    /// missing shadow is not replaced by the default one on reload.
    pub shadow: Option<Shadow>,
    /// Fields carried over from other variants.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ImageSlot {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            source_path: "{versions.0.coverURL}".to_string(),
            corner_radius: 0.0,
            clip: true,
            shadow: Some(Shadow::default()),
            extra: Map::new(),
        }
    }
}

/// One box of a rating bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSegment {
    /// Difficulty label drawn in the box.
    pub label: String,
    /// Token resolving to the rating value.
    #[serde(alias = "rating")]
    pub rating_token: String,
    /// CSS fill of the box.
    pub color: String,
}

impl RatingSegment {
    fn preset(label: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            rating_token: format!("{{starRatings.{label}}}"),
            color: color.to_string(),
        }
    }
}

/// Canonical difficulty segments.
#[must_use]
pub fn default_rating_segments() -> Vec<RatingSegment> {
    vec![
        RatingSegment::preset("ES", "rgb(22 163 74)"),
        RatingSegment::preset("NOR", "rgb(59 130 246)"),
        RatingSegment::preset("HARD", "rgb(249 115 22)"),
        RatingSegment::preset("EX", "rgb(220 38 38)"),
        RatingSegment::preset("EXP", "rgb(126 34 206)"),
    ]
}

/// A row of rating boxes sized by the value each one resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RatingBar {
    /// Segments in drawing order.
    pub ratings: Vec<RatingSegment>,
    /// Box width for plain ratings.
    pub default_width: f64,
    /// Box width for special ratings.
    pub special_width: f64,
    /// Box height.
    pub height: f64,
    /// Advance after a plain box.
    pub default_spacing: f64,
    /// Advance after a special box.
    pub special_spacing: f64,
    /// Fields carried over from other variants.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RatingBar {
    fn default() -> Self {
        Self {
            ratings: default_rating_segments(),
            default_width: 100.0,
            special_width: 120.0,
            height: 50.0,
            default_spacing: 110.0,
            special_spacing: 130.0,
            extra: Map::new(),
        }
    }
}

/// Variant payload of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentKind {
    /// Rounded rectangle.
    #[serde(rename = "roundedRect", alias = "rect")]
    RoundedRect(RoundedRect),
    /// Text field.
    #[serde(rename = "text", alias = "textField")]
    Text(TextField),
    /// Image slot.
    #[serde(rename = "image", alias = "coverImage")]
    Image(ImageSlot),
    /// Rating bar.
    #[serde(rename = "starRating", alias = "ratingBar", alias = "rating")]
    RatingBar(RatingBar),
}

impl ComponentKind {
    /// Factory defaults for a variant.
    #[must_use]
    pub fn default_for(tag: ComponentTag) -> Self {
        match tag {
            ComponentTag::RoundedRect => Self::RoundedRect(RoundedRect::default()),
            ComponentTag::Text => Self::Text(TextField::default()),
            ComponentTag::Image => Self::Image(ImageSlot::default()),
            ComponentTag::RatingBar => Self::RatingBar(RatingBar::default()),
        }
    }

    /// Discriminant of this payload.
    #[must_use]
    pub const fn tag(&self) -> ComponentTag {
        match self {
            Self::RoundedRect(_) => ComponentTag::RoundedRect,
            Self::Text(_) => ComponentTag::Text,
            Self::Image(_) => ComponentTag::Image,
            Self::RatingBar(_) => ComponentTag::RatingBar,
        }
    }

    /// Carried-over fields of this payload.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Self::RoundedRect(rect) => &rect.extra,
            Self::Text(text) => &text.extra,
            Self::Image(image) => &image.extra,
            Self::RatingBar(bar) => &bar.extra,
        }
    }

    /// Payload fields as a flat map, without the `type` key.
    fn to_fields(&self) -> Option<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => {
                fields.remove("type");
                Some(fields)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to flatten component fields: {e}");
                None
            }
        }
    }
}

/// A placeable element on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier.
    pub id: ComponentId,
    /// Left edge in card pixels.
    #[serde(default)]
    pub x: f64,
    /// Top edge in card pixels.
    #[serde(default)]
    pub y: f64,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: ComponentKind,
}

impl Component {
    /// Create a component with a fresh id.
    #[must_use]
    pub fn new(kind: ComponentKind, position: Point) -> Self {
        Self {
            id: ComponentId::new(),
            x: position.x,
            y: position.y,
            kind,
        }
    }

    /// Create a fully populated component of the given variant.
    #[must_use]
    pub fn create_default(tag: ComponentTag, position: Point) -> Self {
        Self::new(ComponentKind::default_for(tag), position)
    }

    /// Create a text field bound to a map field, labelled with its name.
    #[must_use]
    pub fn create_text_field(field: MapField, position: Point) -> Self {
        let text = TextField {
            text: field.label(),
            field: Some(field),
            font: "Arial".to_string(),
            fill_style: "#000".to_string(),
            max_width: 200.0,
            text_align: TextAlign::Left,
            extra: Map::new(),
        };
        Self::new(ComponentKind::Text(text), position)
    }

    /// Set the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<ComponentId>) -> Self {
        self.id = id.into();
        self
    }

    /// Variant discriminant.
    #[must_use]
    pub const fn tag(&self) -> ComponentTag {
        self.kind.tag()
    }

    /// Top-left corner.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Box size, for variants that have one.
    ///
    /// Text is sized by its content and has none. A rating bar reports one
    /// default-width segment.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        match &self.kind {
            ComponentKind::RoundedRect(rect) => Some(Size::new(rect.width, rect.height)),
            ComponentKind::Image(image) => Some(Size::new(image.width, image.height)),
            ComponentKind::RatingBar(bar) => Some(Size::new(bar.default_width, bar.height)),
            ComponentKind::Text(_) => None,
        }
    }

    /// Replace the box size. Ignored for text.
    pub fn set_size(&mut self, size: Size) {
        match &mut self.kind {
            ComponentKind::RoundedRect(rect) => {
                rect.width = size.width;
                rect.height = size.height;
            }
            ComponentKind::Image(image) => {
                image.width = size.width;
                image.height = size.height;
            }
            ComponentKind::RatingBar(bar) => {
                bar.default_width = size.width;
                bar.height = size.height;
            }
            ComponentKind::Text(_) => {}
        }
    }

    /// Change the variant, keeping position and any shared fields.
    ///
    /// Fields the new variant does not define are kept as carried-over
    /// fields, so retagging back restores them. Missing fields take the
    /// factory defaults. Returns an unchanged clone when the carried-over
    /// fields cannot be read as the new variant.
    #[must_use]
    pub fn retag(&self, tag: ComponentTag) -> Self {
        if self.tag() == tag {
            return self.clone();
        }
        let (Some(mut fields), Some(defaults)) = (
            self.kind.to_fields(),
            ComponentKind::default_for(tag).to_fields(),
        ) else {
            return self.clone();
        };
        for (key, value) in defaults {
            fields.entry(key).or_insert(value);
        }
        fields.insert("type".to_string(), Value::from(tag.as_str()));

        match serde_json::from_value::<ComponentKind>(Value::Object(fields)) {
            Ok(kind) => Self {
                id: self.id.clone(),
                x: self.x,
                y: self.y,
                kind,
            },
            Err(e) => {
                tracing::warn!("Cannot retag component {} to {tag}: {e}", self.id);
                self.clone()
            }
        }
    }

    /// One-line description used in component lists.
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.kind {
            ComponentKind::Text(text) if text.text.is_empty() => String::new(),
            ComponentKind::Text(text) => {
                let head: String = text.text.chars().take(20).collect();
                format!("{head}...")
            }
            ComponentKind::Image(image) => format!("({}x{})", image.width, image.height),
            ComponentKind::RoundedRect(rect) => {
                format!("({}x{}, r={})", rect.width, rect.height, rect.corner_radius)
            }
            ComponentKind::RatingBar(bar) => format!("({} ratings)", bar.ratings.len()),
        }
    }

    /// Every numeric geometry field, by wire name.
    pub(crate) fn geometry_fields(&self) -> Vec<(&'static str, f64)> {
        let mut fields = vec![("x", self.x), ("y", self.y)];
        match &self.kind {
            ComponentKind::RoundedRect(rect) => fields.extend([
                ("width", rect.width),
                ("height", rect.height),
                ("cornerRadius", rect.corner_radius),
            ]),
            ComponentKind::Text(text) => fields.push(("maxWidth", text.max_width)),
            ComponentKind::Image(image) => fields.extend([
                ("width", image.width),
                ("height", image.height),
                ("cornerRadius", image.corner_radius),
            ]),
            ComponentKind::RatingBar(bar) => fields.extend([
                ("defaultWidth", bar.default_width),
                ("specialWidth", bar.special_width),
                ("height", bar.height),
                ("defaultSpacing", bar.default_spacing),
                ("specialSpacing", bar.special_spacing),
            ]),
        }
        fields
    }
}
