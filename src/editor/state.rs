//! Editor state management.
//!
//! [`EditorState`] is the single owner of the diagram collection while the
//! editor runs. Front ends feed it user gestures (clicks, drags, toolbar
//! actions, Escape) and read back the model, the selection and the current
//! interaction mode; they never mutate the collection directly.
//!
//! Every committed mutation is recorded in the undo history and written to
//! the attached [`KeyValueStore`], if any. Stale ids coming from the front end
//! are logged and otherwise ignored.

use indexmap::IndexMap;

use crate::config::EditorConfig;
use crate::geometry::{ConnectionPath, connection_at, element_at, render_scene};
use crate::model::{
    Connection, ConnectionKind, Diagram, Element, ElementStatus, Point, Roadmap,
};
use crate::storage::{KeyValueStore, save_roadmap, try_load_roadmap};

use super::history::{EditorHistory, Snapshot};
use super::operations::{self, ElementPatch, NewElement, StoreResult};
use super::selection::EditorSelection;

/// Name given to the diagram created when the collection would otherwise be empty.
pub const UNTITLED_DIAGRAM: &str = "Untitled Roadmap";
/// How far from a connection's curve a click still selects it.
pub const CONNECTION_HIT_TOLERANCE: f64 = 6.0;

// ────────────────────────────────────────────────────────────────────────────
// Interaction mode / drag state
// ────────────────────────────────────────────────────────────────────────────

/// What the user is in the middle of doing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// A new element's attributes are being entered before it is placed.
    Adding(NewElement),
    /// The source element is chosen; the next element click picks the target.
    Connecting {
        source_id: String,
        kind: ConnectionKind,
    },
}

/// An element drag in progress. Deltas are applied live and committed on release.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub element_id: String,
    /// Accumulated delta since the drag started.
    pub dx: f64,
    pub dy: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// EditorState
// ────────────────────────────────────────────────────────────────────────────

/// The complete state of the roadmap editor.
///
/// # Example
///
/// ```rust,ignore
/// use roadmap_editor::config::EditorConfig;
/// use roadmap_editor::editor::{EditorState, NewElement};
/// use roadmap_editor::model::Roadmap;
///
/// let mut editor = EditorState::new(Roadmap::default(), EditorConfig::default())?;
/// let a = editor.add_element(NewElement { name: "Kickoff".into(), ..Default::default() });
/// editor.undo();
/// ```
pub struct EditorState {
    roadmap: Roadmap,
    active: String,
    selection: EditorSelection,
    mode: InteractionMode,
    drag: Option<DragState>,
    history: EditorHistory,
    config: EditorConfig,
    store: Option<Box<dyn KeyValueStore>>,
    dirty: bool,
}

impl EditorState {
    /// Create an editor over `roadmap`. An empty collection gets one untitled diagram.
    pub fn new(mut roadmap: Roadmap, config: EditorConfig) -> anyhow::Result<Self> {
        if roadmap.is_empty() {
            operations::add_diagram(&mut roadmap, UNTITLED_DIAGRAM);
        }
        let active = roadmap.diagrams.first().map(|d| d.id.clone()).unwrap_or_default();
        let history = EditorHistory::new(Snapshot::capture(&roadmap)?, config.history_limit);
        Ok(Self {
            roadmap,
            active,
            selection: EditorSelection::new(),
            mode: InteractionMode::Idle,
            drag: None,
            history,
            config,
            store: None,
            dirty: false,
        })
    }

    /// Create an editor over the collection persisted in `store`.
    ///
    /// When nothing usable is stored yet, the seeded untitled diagram is
    /// written back immediately so its id stays valid across sessions. An
    /// unreadable stored value is left in place until the first commit.
    pub fn with_store(store: Box<dyn KeyValueStore>, config: EditorConfig) -> anyhow::Result<Self> {
        let (roadmap, seed) = match try_load_roadmap(&*store, &config.storage_key) {
            Ok(Some(roadmap)) => {
                let seed = roadmap.is_empty();
                (roadmap, seed)
            }
            Ok(None) => {
                log::info!("no stored roadmap under `{}`, starting empty", config.storage_key);
                (Roadmap::default(), true)
            }
            Err(err) => {
                log::warn!("failed to load roadmap `{}`, starting empty: {:#}", config.storage_key, err);
                (Roadmap::default(), false)
            }
        };
        let mut state = Self::new(roadmap, config)?;
        state.store = Some(store);
        if seed && !state.persist() {
            state.dirty = true;
        }
        Ok(state)
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    pub fn active_diagram_id(&self) -> &str {
        &self.active
    }

    pub fn active_diagram(&self) -> Option<&Diagram> {
        self.roadmap.diagram(&self.active)
    }

    pub fn selection(&self) -> &EditorSelection {
        &self.selection
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Whether there are committed changes that have not been persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    /// Toggle read-only mode. Entering it abandons any gesture in progress.
    pub fn set_read_only(&mut self, read_only: bool) {
        if read_only {
            self.cancel();
        }
        self.config.read_only = read_only;
    }

    pub fn can_undo(&self) -> bool {
        !self.config.read_only && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.config.read_only && self.history.can_redo()
    }

    pub fn can_delete(&self) -> bool {
        !self.config.read_only && !self.selection.is_empty()
    }

    pub fn can_connect(&self) -> bool {
        !self.config.read_only && self.selection.element().is_some()
    }

    /// Connection geometry of the active diagram, in draw order.
    pub fn scene(&self) -> IndexMap<String, ConnectionPath> {
        self.active_diagram().map(render_scene).unwrap_or_default()
    }

    // ── modes ──────────────────────────────────────────────────────────────

    /// Open the "add element" form with default attributes.
    pub fn begin_add(&mut self) -> bool {
        let defaults = NewElement::default();
        self.begin_add_at(defaults.x, defaults.y)
    }

    /// Open the "add element" form for an element placed at `(x, y)`.
    pub fn begin_add_at(&mut self, x: f64, y: f64) -> bool {
        if self.config.read_only || self.mode != InteractionMode::Idle || self.drag.is_some() {
            return false;
        }
        self.mode = InteractionMode::Adding(NewElement {
            x,
            y,
            ..Default::default()
        });
        true
    }

    /// The attributes being entered while in [`InteractionMode::Adding`].
    pub fn draft_mut(&mut self) -> Option<&mut NewElement> {
        match &mut self.mode {
            InteractionMode::Adding(draft) => Some(draft),
            _ => None,
        }
    }

    /// Create the element described by the form. Nothing happens while the
    /// form is incomplete.
    pub fn confirm_add(&mut self) -> Option<Element> {
        let draft = match &self.mode {
            InteractionMode::Adding(draft) if draft.is_submittable() => draft.clone(),
            _ => return None,
        };
        self.mode = InteractionMode::Idle;
        self.add_element(draft)
    }

    /// Enter connecting mode from the selected element.
    pub fn start_connecting(&mut self, kind: ConnectionKind) -> bool {
        if self.config.read_only || self.mode != InteractionMode::Idle {
            return false;
        }
        let Some(source_id) = self.selection.element().map(str::to_string) else {
            return false;
        };
        if self.active_diagram().and_then(|d| d.element(&source_id)).is_none() {
            return false;
        }
        self.mode = InteractionMode::Connecting { source_id, kind };
        true
    }

    /// Escape: abandon whatever is in progress without committing anything.
    pub fn cancel(&mut self) {
        self.cancel_drag();
        self.mode = InteractionMode::Idle;
    }

    // ── pointer input ──────────────────────────────────────────────────────

    /// A click on an element: selects it, or finishes a connection.
    pub fn click_element(&mut self, element_id: &str) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Connecting { source_id, kind } => {
                if source_id == element_id {
                    log::debug!("ignoring connection from `{}` to itself", element_id);
                } else {
                    self.add_connection(&source_id, element_id, kind);
                }
            }
            adding @ InteractionMode::Adding(_) => self.mode = adding,
            InteractionMode::Idle => {
                self.select_element(element_id);
            }
        }
    }

    /// A click on a connection: selects it, or abandons a pending connection.
    pub fn click_connection(&mut self, connection_id: &str) {
        match self.mode {
            InteractionMode::Idle => {
                self.select_connection(connection_id);
            }
            InteractionMode::Connecting { .. } => self.mode = InteractionMode::Idle,
            InteractionMode::Adding(_) => {}
        }
    }

    /// A click at a diagram position, resolved against elements then connections.
    pub fn click_at(&mut self, p: Point) {
        let Some(diagram) = self.active_diagram() else {
            return;
        };
        if let Some(id) = element_at(diagram, p).map(|e| e.id.clone()) {
            self.click_element(&id);
        } else if let Some(id) = connection_at(diagram, p, CONNECTION_HIT_TOLERANCE).map(|c| c.id.clone()) {
            self.click_connection(&id);
        } else {
            match self.mode {
                InteractionMode::Idle => self.selection.clear(),
                InteractionMode::Connecting { .. } => self.mode = InteractionMode::Idle,
                InteractionMode::Adding(_) => {}
            }
        }
    }

    pub fn select_element(&mut self, element_id: &str) -> bool {
        if self.active_diagram().and_then(|d| d.element(element_id)).is_none() {
            log::warn!("cannot select element `{}`: not in the active diagram", element_id);
            return false;
        }
        self.selection.select_element(element_id);
        true
    }

    pub fn select_connection(&mut self, connection_id: &str) -> bool {
        if self.active_diagram().and_then(|d| d.connection(connection_id)).is_none() {
            log::warn!("cannot select connection `{}`: not in the active diagram", connection_id);
            return false;
        }
        self.selection.select_connection(connection_id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── dragging ───────────────────────────────────────────────────────────

    /// Pointer down on an element: select it and start dragging.
    pub fn begin_drag(&mut self, element_id: &str) -> bool {
        if self.config.read_only || self.mode != InteractionMode::Idle || self.drag.is_some() {
            return false;
        }
        if !self.select_element(element_id) {
            return false;
        }
        self.drag = Some(DragState {
            element_id: element_id.to_string(),
            dx: 0.0,
            dy: 0.0,
        });
        true
    }

    /// Per-frame drag delta. Moves the element without recording history.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        match operations::move_element(&mut self.roadmap, &self.active, &drag.element_id, dx, dy) {
            Ok(_) => {
                drag.dx += dx;
                drag.dy += dy;
                true
            }
            Err(err) => {
                log::warn!("drag abandoned: {}", err);
                self.drag = None;
                false
            }
        }
    }

    /// Pointer up: commit the drag as a single move. Returns true if anything moved.
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if self.config.snap_to_grid {
            let position = self
                .active_diagram()
                .and_then(|d| d.element(&drag.element_id))
                .map(Element::position);
            if let Some(pos) = position {
                let (sx, sy) = (self.config.snap(pos.x) - pos.x, self.config.snap(pos.y) - pos.y);
                if sx != 0.0 || sy != 0.0 {
                    self.apply_silently(&drag.element_id, sx, sy);
                }
            }
        }
        let moved = self.differs_from_history();
        if moved {
            self.commit("move element");
        }
        moved
    }

    /// Undo the live part of a drag that has not been released yet.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if drag.dx != 0.0 || drag.dy != 0.0 {
                self.apply_silently(&drag.element_id, -drag.dx, -drag.dy);
            }
        }
    }

    // ── graph mutations ────────────────────────────────────────────────────

    /// Create an element in the active diagram and select it.
    pub fn add_element(&mut self, new: NewElement) -> Option<Element> {
        if !new.is_submittable() {
            log::debug!("add element ignored: name is empty");
            return None;
        }
        let element = self.apply("add element", |r, d| operations::add_element(r, d, new))?;
        self.selection.select_element(&element.id);
        Some(element)
    }

    pub fn move_element(&mut self, element_id: &str, dx: f64, dy: f64) -> bool {
        self.apply("move element", |r, d| operations::move_element(r, d, element_id, dx, dy))
            .is_some()
    }

    /// Keyboard nudge of the selected element.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        match self.selection.element().map(str::to_string) {
            Some(id) => self.move_element(&id, dx, dy),
            None => false,
        }
    }

    pub fn update_element(&mut self, element_id: &str, patch: ElementPatch) -> Option<Element> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            log::debug!("update element ignored: name is empty");
            return None;
        }
        self.apply("update element", |r, d| operations::update_element(r, d, element_id, patch))
    }

    pub fn rename_element(&mut self, element_id: &str, name: &str) -> bool {
        let patch = ElementPatch {
            name: Some(name.to_string()),
            ..Default::default()
        };
        self.update_element(element_id, patch).is_some()
    }

    /// Advance an element to its next status.
    pub fn cycle_status(&mut self, element_id: &str) -> Option<ElementStatus> {
        let current = self.active_diagram()?.element(element_id)?.status;
        let patch = ElementPatch {
            status: Some(current.next()),
            ..Default::default()
        };
        self.update_element(element_id, patch).map(|e| e.status)
    }

    /// Remove an element and every connection touching it.
    pub fn delete_element(&mut self, element_id: &str) -> bool {
        let removed = self.apply("delete element", |r, d| operations::delete_element(r, d, element_id));
        if let Some((_, cascaded)) = &removed {
            log::debug!("deleted element `{}` and {} connection(s)", element_id, cascaded.len());
            self.selection.retain_valid(self.roadmap.diagram(&self.active));
        }
        removed.is_some()
    }

    pub fn add_connection(&mut self, source_id: &str, target_id: &str, kind: ConnectionKind) -> Option<Connection> {
        self.apply("add connection", |r, d| {
            operations::add_connection(r, d, source_id, target_id, kind)
        })
    }

    pub fn set_connection_kind(&mut self, connection_id: &str, kind: ConnectionKind) -> bool {
        self.apply("set connection type", |r, d| {
            operations::set_connection_kind(r, d, connection_id, kind)
        })
        .is_some()
    }

    pub fn delete_connection(&mut self, connection_id: &str) -> bool {
        let removed = self
            .apply("delete connection", |r, d| operations::delete_connection(r, d, connection_id))
            .is_some();
        if removed {
            self.selection.retain_valid(self.roadmap.diagram(&self.active));
        }
        removed
    }

    /// Delete whatever is selected.
    pub fn delete_selected(&mut self) -> bool {
        match self.selection.clone() {
            EditorSelection::Element(id) => self.delete_element(&id),
            EditorSelection::Connection(id) => self.delete_connection(&id),
            EditorSelection::None => false,
        }
    }

    // ── diagrams ───────────────────────────────────────────────────────────

    /// Create a diagram and make it active. Returns its id.
    pub fn add_diagram(&mut self, name: &str) -> Option<String> {
        if name.trim().is_empty() {
            log::debug!("add diagram ignored: name is empty");
            return None;
        }
        let diagram = self.apply("add diagram", |r, _| Ok(operations::add_diagram(r, name)))?;
        self.activate(&diagram.id);
        Some(diagram.id)
    }

    pub fn rename_diagram(&mut self, diagram_id: &str, name: &str) -> bool {
        if name.trim().is_empty() {
            log::debug!("rename diagram ignored: name is empty");
            return false;
        }
        self.apply("rename diagram", |r, _| operations::rename_diagram(r, diagram_id, name))
            .is_some()
    }

    /// Delete a diagram. The last diagram is replaced by an untitled one.
    pub fn delete_diagram(&mut self, diagram_id: &str) -> bool {
        let removed = self.apply("delete diagram", |r, _| {
            let removed = operations::delete_diagram(r, diagram_id)?;
            if r.is_empty() {
                operations::add_diagram(r, UNTITLED_DIAGRAM);
            }
            Ok(removed)
        });
        if removed.is_some() {
            self.reconcile();
        }
        removed.is_some()
    }

    /// Make another diagram active, looked up by id or name. Not an undoable change.
    pub fn switch_diagram(&mut self, id_or_name: &str) -> bool {
        let Some(id) = self.roadmap.find_diagram(id_or_name).map(|d| d.id.clone()) else {
            log::warn!("cannot switch to diagram `{}`: not found", id_or_name);
            return false;
        };
        self.activate(&id);
        true
    }

    // ── history ────────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        if self.config.read_only {
            return false;
        }
        self.drag = None;
        let restored = match self.history.undo() {
            Some(snapshot) => snapshot.restore(),
            None => return false,
        };
        self.install(restored, "undo")
    }

    pub fn redo(&mut self) -> bool {
        if self.config.read_only {
            return false;
        }
        self.drag = None;
        let restored = match self.history.redo() {
            Some(snapshot) => snapshot.restore(),
            None => return false,
        };
        self.install(restored, "redo")
    }

    // ── persistence ────────────────────────────────────────────────────────

    /// Write the collection to the attached store. Failures are logged, never fatal.
    pub fn persist(&mut self) -> bool {
        let Some(store) = self.store.as_mut() else {
            return false;
        };
        match save_roadmap(&mut **store, &self.config.storage_key, &self.roadmap) {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(err) => {
                log::error!("failed to persist roadmap: {:#}", err);
                false
            }
        }
    }

    // ── internals ──────────────────────────────────────────────────────────

    /// Run a store operation against the active diagram and commit on success.
    fn apply<T>(
        &mut self,
        action: &str,
        op: impl FnOnce(&mut Roadmap, &str) -> StoreResult<T>,
    ) -> Option<T> {
        if self.config.read_only {
            log::debug!("{} ignored: editor is read-only", action);
            return None;
        }
        if let Some(drag) = &self.drag {
            log::debug!("{} ignored: element `{}` is being dragged", action, drag.element_id);
            return None;
        }
        match op(&mut self.roadmap, &self.active) {
            Ok(value) => {
                self.commit(action);
                Some(value)
            }
            Err(err) => {
                log::warn!("{} ignored: {}", action, err);
                None
            }
        }
    }

    /// Move an element without touching history (drag frames, snapping, cancel).
    fn apply_silently(&mut self, element_id: &str, dx: f64, dy: f64) {
        if let Err(err) = operations::move_element(&mut self.roadmap, &self.active, element_id, dx, dy) {
            log::warn!("move element ignored: {}", err);
        }
    }

    /// True if the collection differs from the current history entry.
    fn differs_from_history(&self) -> bool {
        Snapshot::capture(&self.roadmap).is_ok_and(|s| &s != self.history.current())
    }

    fn commit(&mut self, action: &str) {
        match Snapshot::capture(&self.roadmap) {
            Ok(snapshot) => self.history.commit(snapshot),
            Err(err) => log::error!("failed to record history for {}: {:#}", action, err),
        }
        self.dirty = true;
        log::debug!("committed {}", action);
        self.persist();
    }

    fn install(&mut self, restored: anyhow::Result<Roadmap>, action: &str) -> bool {
        match restored {
            Ok(roadmap) => {
                self.roadmap = roadmap;
                self.reconcile();
                self.dirty = true;
                log::debug!("{} applied", action);
                self.persist();
                true
            }
            Err(err) => {
                log::error!("{} failed to restore snapshot: {:#}", action, err);
                false
            }
        }
    }

    fn activate(&mut self, diagram_id: &str) {
        self.cancel();
        self.active = diagram_id.to_string();
        self.selection.clear();
    }

    /// Bring the active diagram, selection and mode back in line with the collection.
    fn reconcile(&mut self) {
        if self.roadmap.diagram(&self.active).is_none() {
            self.active = self.roadmap.diagrams.first().map(|d| d.id.clone()).unwrap_or_default();
            self.selection.clear();
        }
        self.selection.retain_valid(self.roadmap.diagram(&self.active));
        if let InteractionMode::Connecting { source_id, .. } = &self.mode {
            if self.active_diagram().and_then(|d| d.element(source_id)).is_none() {
                self.mode = InteractionMode::Idle;
            }
        }
    }
}
