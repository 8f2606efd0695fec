//! Selection management for the editor.
//!
//! At most one thing is selected at a time: either an element or a
//! connection. The selection decides which toolbar actions are available
//! (deleting needs a selection, connecting needs a selected element).

use crate::model::Diagram;

/// The currently selected item, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorSelection {
    #[default]
    None,
    Element(String),
    Connection(String),
}

impl EditorSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Select an element, replacing any previous selection.
    pub fn select_element(&mut self, id: &str) {
        *self = Self::Element(id.to_string());
    }

    /// Select a connection, replacing any previous selection.
    pub fn select_connection(&mut self, id: &str) {
        *self = Self::Connection(id.to_string());
    }

    pub fn element(&self) -> Option<&str> {
        match self {
            Self::Element(id) => Some(id),
            _ => None,
        }
    }

    pub fn connection(&self) -> Option<&str> {
        match self {
            Self::Connection(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_element_selected(&self, id: &str) -> bool {
        self.element() == Some(id)
    }

    pub fn is_connection_selected(&self, id: &str) -> bool {
        self.connection() == Some(id)
    }

    /// Drop the selection if it refers to something `diagram` no longer contains.
    ///
    /// Returns true if the selection was cleared.
    pub fn retain_valid(&mut self, diagram: Option<&Diagram>) -> bool {
        let valid = match (&*self, diagram) {
            (Self::None, _) => true,
            (_, None) => false,
            (Self::Element(id), Some(d)) => d.element(id).is_some(),
            (Self::Connection(id), Some(d)) => d.connection(id).is_some(),
        };
        if !valid {
            self.clear();
        }
        !valid
    }
}
