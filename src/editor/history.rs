//! Undo/redo history over whole-collection snapshots.
//!
//! Each committed mutation stores a complete binary serialization of the
//! [`Roadmap`]. Undo and redo move a cursor through that list; committing
//! after an undo discards everything past the cursor.

use std::sync::Arc;

use crate::model::Roadmap;

/// An immutable serialized copy of the diagram collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Arc<[u8]>,
}

impl Snapshot {
    pub fn capture(roadmap: &Roadmap) -> anyhow::Result<Self> {
        Ok(Self {
            bytes: roadmap.to_bytes()?.into(),
        })
    }

    pub fn restore(&self) -> anyhow::Result<Roadmap> {
        Roadmap::from_bytes(&self.bytes)
    }

    /// Size of the serialized collection in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Linear snapshot history with a cursor.
///
/// `entries[cursor]` is always the snapshot of the current state. At most
/// `max_size` entries are retained, the current one included, so up to
/// `max_size - 1` steps can be undone. The oldest entries are dropped first.
///
/// # Example
///
/// ```rust,ignore
/// let mut history = EditorHistory::new(Snapshot::capture(&roadmap)?, 100);
/// history.commit(Snapshot::capture(&edited)?);
/// let previous = history.undo().unwrap().restore()?; // == roadmap
/// let again = history.redo().unwrap().restore()?;    // == edited
/// ```
#[derive(Debug, Clone)]
pub struct EditorHistory {
    entries: Vec<Snapshot>,
    cursor: usize,
    max_size: usize,
}

impl EditorHistory {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: Snapshot, max_size: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            max_size: max_size.max(1),
        }
    }

    /// Record a new current state, discarding any redoable entries.
    pub fn commit(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor += 1;
        let excess = self.entries.len().saturating_sub(self.max_size);
        if excess > 0 {
            self.entries.drain(..excess);
            self.cursor -= excess;
        }
    }

    /// Step back one entry and return the snapshot to restore.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one entry and return the snapshot to restore.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> &Snapshot {
        &self.entries[self.cursor]
    }

    /// Number of retained entries, the current one included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
