//! Editing session state.
//!
//! An [`EditorSession`] owns the current document snapshot together with
//! the state that is never saved: the selection, the pointer interaction in
//! progress, the tray of parked components, and the ids deleted so far. Every successful mutation
//! swaps in a new snapshot, so a reader holding an older [`Arc`] never
//! observes a half-applied edit.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::component::{Component, ComponentId, ComponentTag, MapField};
use crate::config::EditorConfig;
use crate::document::{Background, CardDocument};
use crate::error::{CardError, CardResult, ValidationError};
use crate::event::{HitRegion, PointerKind, SurfaceEvent};
use crate::geometry::{apply_drag, apply_resize, grid_lines, snap_point, GridLines, Point, Size};
use crate::patch::ComponentPatch;
use crate::schema::{components_from_text, from_document_text, to_document_text};
use crate::store::DocumentStore;
use crate::view::CardView;

/// Pointer interaction in progress. At most one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    /// No button held.
    #[default]
    Idle,
    /// Moving a component.
    Dragging {
        /// Component being moved.
        id: ComponentId,
        /// Its position at pointer-down.
        origin: Point,
        /// Pointer position at pointer-down.
        pointer_start: Point,
    },
    /// Resizing a component from its handle.
    Resizing {
        /// Component being resized.
        id: ComponentId,
        /// Its size at pointer-down.
        start_size: Size,
        /// Pointer position at pointer-down.
        pointer_start: Point,
    },
}

impl Interaction {
    fn target(&self) -> Option<&ComponentId> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, .. } | Self::Resizing { id, .. } => Some(id),
        }
    }
}

/// A document being edited.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    document: Arc<CardDocument>,
    selected: Option<ComponentId>,
    interaction: Interaction,
    tray: Vec<Component>,
    retired: HashSet<ComponentId>,
    config: EditorConfig,
}

impl EditorSession {
    /// Start editing a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the document is invalid.
    pub fn new(document: CardDocument, config: EditorConfig) -> CardResult<Self> {
        config.validate()?;
        document.validate()?;
        Ok(Self {
            document: Arc::new(document),
            config,
            ..Self::default()
        })
    }

    /// The current document.
    #[must_use]
    pub fn document(&self) -> &CardDocument {
        &self.document
    }

    /// A shared handle to the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CardDocument> {
        Arc::clone(&self.document)
    }

    /// Editing configuration.
    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current grid step.
    #[must_use]
    pub fn grid_step(&self) -> f64 {
        self.document.grid_step(&self.config.grid)
    }

    /// Grid guide positions for the current card.
    #[must_use]
    pub fn grid_lines(&self) -> GridLines {
        grid_lines(self.document.width(), self.document.height(), self.grid_step())
    }

    /// Pointer interaction in progress.
    #[must_use]
    pub const fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// Selected component id.
    #[must_use]
    pub fn selected(&self) -> Option<&ComponentId> {
        self.selected.as_ref()
    }

    /// Selected component.
    #[must_use]
    pub fn selected_component(&self) -> Option<&Component> {
        self.selected.as_ref().and_then(|id| self.document.get(id))
    }

    /// Select a component, or clear the selection with `None`.
    ///
    /// Returns `false`, leaving the selection unchanged, if the id is not
    /// in the document.
    pub fn select(&mut self, id: Option<ComponentId>) -> bool {
        match id {
            Some(id) if self.document.get(&id).is_none() => {
                tracing::debug!("Ignoring selection of unknown component {id}");
                false
            }
            id => {
                self.selected = id;
                true
            }
        }
    }

    /// Run a mutation against a working copy and swap it in on success.
    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut CardDocument) -> Result<T, ValidationError>,
    ) -> Result<T, ValidationError> {
        let mut next = CardDocument::clone(&self.document);
        let out = f(&mut next)?;
        self.document = Arc::new(next);
        Ok(out)
    }

    /// Append a component.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is taken, was deleted earlier in this
    /// session, or the geometry is not finite.
    pub fn add(&mut self, component: Component) -> CardResult<ComponentId> {
        self.check_not_retired(&component.id)?;
        Ok(self.mutate(|doc| doc.add(component))?)
    }

    fn check_not_retired(&self, id: &ComponentId) -> Result<(), ValidationError> {
        if self.retired.contains(id) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Drop a new default component at a pointer position, snapped to the
    /// grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer position is not finite.
    pub fn add_at(&mut self, tag: ComponentTag, pointer: Point) -> CardResult<ComponentId> {
        let at = snap_point(pointer, self.grid_step());
        self.add(Component::create_default(tag, at))
    }

    /// Drop a text field preset bound to a map field.
    ///
    /// # Errors
    ///
    /// Returns an error if the pointer position is not finite.
    pub fn add_text_field(&mut self, field: MapField, pointer: Point) -> CardResult<ComponentId> {
        let at = snap_point(pointer, self.grid_step());
        self.add(Component::create_text_field(field, at))
    }

    /// Remove a component, clearing the selection and any interaction that
    /// refers to it. The id cannot be used again in this session.
    pub fn remove(&mut self, id: &ComponentId) -> Option<Component> {
        let removed = self.take(id)?;
        self.retired.insert(id.clone());
        Some(removed)
    }

    fn take(&mut self, id: &ComponentId) -> Option<Component> {
        self.document.get(id)?;
        let removed = Arc::make_mut(&mut self.document).remove(id)?;
        self.forget(id);
        Some(removed)
    }

    fn forget(&mut self, id: &ComponentId) {
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        if self.interaction.target() == Some(id) {
            self.interaction = Interaction::Idle;
        }
    }

    /// Apply a field-level patch. Returns `false` if the id is absent.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the document unchanged, for non-finite or
    /// non-positive geometry.
    pub fn update(&mut self, id: &ComponentId, patch: &ComponentPatch) -> CardResult<bool> {
        if self.document.get(id).is_none() {
            return Ok(false);
        }
        Ok(self.mutate(|doc| doc.update(id, patch))?)
    }

    /// Change a component's variant. Returns `true` if the variant
    /// changed.
    pub fn retag(&mut self, id: &ComponentId, tag: ComponentTag) -> bool {
        match self.document.get(id) {
            Some(component) if component.tag() != tag => {}
            _ => return false,
        }
        let mut next = CardDocument::clone(&self.document);
        if !next.retag(id, tag) {
            return false;
        }
        self.document = Arc::new(next);
        true
    }

    /// Reorder components with splice semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if either index is out of range.
    pub fn move_component(&mut self, from: usize, to: usize) -> CardResult<()> {
        Ok(self.mutate(|doc| doc.move_component(from, to))?)
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        Arc::make_mut(&mut self.document).set_background(background);
    }

    /// Replace the card dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is not positive and finite.
    pub fn set_dimensions(&mut self, width: f64, height: f64) -> CardResult<()> {
        Ok(self.mutate(|doc| doc.set_dimensions(width, height))?)
    }

    /// Rename the document.
    pub fn set_config_name(&mut self, config_name: impl Into<String>) {
        Arc::make_mut(&mut self.document).set_config_name(config_name);
    }

    /// Change the corner radius of the card.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is negative or not finite.
    pub fn set_card_corner_radius(&mut self, radius: f64) -> CardResult<()> {
        Ok(self.mutate(|doc| doc.set_card_corner_radius(radius))?)
    }

    /// Parked components, oldest first.
    #[must_use]
    pub fn tray(&self) -> &[Component] {
        &self.tray
    }

    /// Take a component off the card into the tray. Returns `false` if the
    /// id is absent.
    pub fn park(&mut self, id: &ComponentId) -> bool {
        match self.take(id) {
            Some(component) => {
                self.tray.push(component);
                true
            }
            None => false,
        }
    }

    /// Put a parked component back on top of the card at a snapped
    /// position. Returns `false` if the id is not in the tray.
    ///
    /// # Errors
    ///
    /// Returns an error, keeping the component in the tray, if the card
    /// already has a component with the same id or the position is not
    /// finite.
    pub fn unpark(&mut self, id: &ComponentId, pointer: Point) -> CardResult<bool> {
        let Some(index) = self.tray.iter().position(|c| c.id == *id) else {
            return Ok(false);
        };
        let at = snap_point(pointer, self.grid_step());
        let mut component = self.tray[index].clone();
        component.x = at.x;
        component.y = at.y;
        self.add(component)?;
        self.tray.remove(index);
        Ok(true)
    }

    /// Feed a pointer notification from the rendering surface.
    ///
    /// Returns `true` if the document changed.
    pub fn handle_event(&mut self, event: &SurfaceEvent) -> bool {
        match event.kind {
            PointerKind::Down => {
                self.on_pointer_down(event);
                false
            }
            PointerKind::Move => self.on_pointer_move(event.position()),
            PointerKind::Up => self.on_pointer_up(event.position()),
            PointerKind::Click => {
                self.select(event.target.clone());
                false
            }
        }
    }

    fn on_pointer_down(&mut self, event: &SurfaceEvent) {
        if self.interaction != Interaction::Idle {
            tracing::debug!("Ignoring pointer-down during {:?}", self.interaction);
            return;
        }
        let Some(component) = event.target.as_ref().and_then(|id| self.document.get(id)) else {
            return;
        };
        let id = component.id.clone();
        let pointer_start = event.position();

        self.interaction = match (event.region, component.size()) {
            (HitRegion::ResizeHandle, Some(start_size)) => Interaction::Resizing {
                id: id.clone(),
                start_size,
                pointer_start,
            },
            _ => Interaction::Dragging {
                id: id.clone(),
                origin: component.position(),
                pointer_start,
            },
        };
        tracing::debug!("Pointer-down on {id}: {:?}", self.interaction);
        self.selected = Some(id);
    }

    fn on_pointer_move(&mut self, pointer: Point) -> bool {
        match self.interaction.clone() {
            Interaction::Idle => false,
            Interaction::Dragging {
                id,
                origin,
                pointer_start,
            } => {
                let mut at = apply_drag(origin, pointer.delta_from(pointer_start));
                if self.config.snap.snaps_during_drag() {
                    at = snap_point(at, self.grid_step());
                }
                self.apply_interactive(&id, &ComponentPatch::position(at.x, at.y))
            }
            Interaction::Resizing {
                id,
                start_size,
                pointer_start,
            } => {
                let size = self.resized(start_size, pointer.delta_from(pointer_start));
                self.apply_interactive(&id, &ComponentPatch::size(size.width, size.height))
            }
        }
    }

    fn on_pointer_up(&mut self, pointer: Point) -> bool {
        match std::mem::replace(&mut self.interaction, Interaction::Idle) {
            Interaction::Idle => false,
            Interaction::Dragging {
                id,
                origin,
                pointer_start,
            } => {
                let dropped = apply_drag(origin, pointer.delta_from(pointer_start));
                let at = snap_point(dropped, self.grid_step());
                tracing::debug!("Dropped {id} at ({}, {})", at.x, at.y);
                self.apply_interactive(&id, &ComponentPatch::position(at.x, at.y))
            }
            Interaction::Resizing {
                id,
                start_size,
                pointer_start,
            } => {
                let size = self.resized(start_size, pointer.delta_from(pointer_start));
                tracing::debug!("Resized {id} to {}x{}", size.width, size.height);
                self.apply_interactive(&id, &ComponentPatch::size(size.width, size.height))
            }
        }
    }

    fn resized(&self, start_size: Size, delta: Point) -> Size {
        apply_resize(start_size, delta, self.grid_step(), self.config.min_size)
    }

    fn apply_interactive(&mut self, id: &ComponentId, patch: &ComponentPatch) -> bool {
        match self.mutate(|doc| doc.update(id, patch)) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("Rejected pointer edit on {id}: {e}");
                false
            }
        }
    }

    /// Display-ready view of the current document.
    #[must_use]
    pub fn view(&self, data: &Value) -> CardView {
        CardView::build(&self.document, data)
    }

    /// Current document as text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn document_text(&self) -> CardResult<String> {
        to_document_text(&self.document)
    }

    /// Replace the document with parsed text.
    ///
    /// On error the current document stays as it was.
    ///
    /// # Errors
    ///
    /// Returns the parse error.
    pub fn load_text(&mut self, text: &str) -> CardResult<()> {
        let document = from_document_text(text)?;
        self.replace_document(document);
        Ok(())
    }

    /// Replace the component list with parsed text.
    ///
    /// Components left out of the new list count as deleted. On error the
    /// current document stays as it was.
    ///
    /// # Errors
    ///
    /// Returns the parse or validation error, including a component that
    /// reuses a deleted id.
    pub fn load_components_text(&mut self, text: &str) -> CardResult<()> {
        let components = components_from_text(text)?;
        for component in &components {
            self.check_not_retired(&component.id)?;
        }
        let kept: HashSet<&ComponentId> = components.iter().map(|c| &c.id).collect();
        let dropped: Vec<ComponentId> = self
            .document
            .components()
            .iter()
            .filter(|c| !kept.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();

        self.mutate(|doc| doc.replace_components(components))?;
        self.retired.extend(dropped);
        self.drop_stale_state();
        Ok(())
    }

    // A whole new document starts a fresh id history.
    fn replace_document(&mut self, document: CardDocument) {
        self.document = Arc::new(document);
        self.retired.clear();
        self.drop_stale_state();
    }

    fn drop_stale_state(&mut self) {
        if let Some(id) = self.selected.clone() {
            if self.document.get(&id).is_none() {
                self.selected = None;
            }
        }
        if let Some(id) = self.interaction.target().cloned() {
            if self.document.get(&id).is_none() {
                self.interaction = Interaction::Idle;
            }
        }
    }

    /// Load the stored document. Returns `false` if the store is empty.
    ///
    /// # Errors
    ///
    /// Returns store and parse errors; the current document is kept.
    pub fn load_from(&mut self, store: &impl DocumentStore) -> CardResult<bool> {
        let Some(text) = store.load()? else {
            return Ok(false);
        };
        if let Err(e) = self.load_text(&text) {
            tracing::warn!("Stored document is invalid, keeping current one: {e}");
            return Err(e);
        }
        tracing::info!("Loaded document {}", self.document.config_name);
        Ok(true)
    }

    /// Save the current document.
    ///
    /// # Errors
    ///
    /// Returns serialization and store errors.
    pub fn save_to(&self, store: &impl DocumentStore) -> CardResult<()> {
        store.save(&self.document_text()?)?;
        tracing::info!("Saved document {}", self.document.config_name);
        Ok(())
    }
}

/// Error helper for callers that only know an id.
///
/// # Errors
///
/// Returns [`CardError::ComponentNotFound`] when the id is absent.
pub fn require_component<'a>(doc: &'a CardDocument, id: &ComponentId) -> CardResult<&'a Component> {
    doc.get(id)
        .ok_or_else(|| CardError::ComponentNotFound(id.to_string()))
}
