//! # Map Card Core
//!
//! Layout engine for map cards: a fixed-size canvas composed of rectangles,
//! text, images, and rating bars whose content can be bound to fetched map
//! metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 card-core                   │
//! ├─────────────────────────────────────────────┤
//! │  Session          │  View                   │
//! │  - Selection      │  - Token resolution     │
//! │  - Drag / resize  │  - Rating layout        │
//! │  - Unused tray    │                         │
//! ├─────────────────────────────────────────────┤
//! │  Document         │  Document text          │
//! │  - Components     │  - Id assignment        │
//! │  - Patches        │  - Stores               │
//! ├─────────────────────────────────────────────┤
//! │  Geometry: snapping, drag and resize deltas │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod component;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod patch;
pub mod schema;
pub mod session;
pub mod store;
pub mod token;
pub mod view;

pub use color::{with_alpha, with_hex, Rgba};
pub use component::{
    default_rating_segments, Component, ComponentId, ComponentKind, ComponentTag, ImageSlot,
    MapField, RatingBar, RatingSegment, RoundedRect, Shadow, TextAlign, TextField, UnknownTag,
};
pub use config::EditorConfig;
pub use document::{Background, CardDocument};
pub use error::{CardError, CardResult, ParseError, StoreError, ValidationError};
pub use event::{HitRegion, PointerKind, SurfaceEvent};
pub use geometry::{
    apply_drag, apply_resize, grid_lines, snap, snap_point, GridLines, GridPolicy, Point, Size,
    SnapPolicy,
};
pub use patch::{ComponentPatch, ShadowPatch};
pub use schema::{components_from_text, export_filename, from_document_text, to_document_text};
pub use session::{require_component, EditorSession, Interaction};
pub use store::{DocumentStore, FileStore, MemoryStore};
pub use token::{
    classify, list_paths, list_subpaths, resolve, resolve_text, token_for, token_path, PathEntry,
    RatingClass,
};
pub use view::{layout_rating_bar, BackgroundView, CardView, ItemContent, ItemView, SegmentView};

/// Card core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
