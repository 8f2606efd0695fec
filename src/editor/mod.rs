//! Roadmap diagram editor.
//!
//! - **Graph store** ([`operations`]): adding, moving, editing and deleting
//!   elements, connections and diagrams, with cascading deletes
//! - **Selection** ([`selection`]): one element or one connection at a time
//! - **History** ([`history`]): linear undo/redo over whole-collection snapshots
//! - **Interaction controller** ([`state`]): turns clicks, drags and toolbar
//!   actions into store mutations, honouring read-only mode

pub mod history;
pub mod operations;
pub mod selection;
pub mod state;

pub use history::{EditorHistory, Snapshot};
pub use operations::{
    ElementPatch, NewElement, StoreError, StoreResult, add_connection, add_diagram, add_element,
    delete_connection, delete_diagram, delete_element, move_element, rename_diagram,
    set_connection_kind, update_element,
};
pub use selection::EditorSelection;
pub use state::{DragState, EditorState, InteractionMode};
