//! Graph store operations.
//!
//! Every mutation of a [`Roadmap`] goes through one of the functions in this
//! module. They mutate the collection in place and report stale ids as a
//! [`StoreError`] instead of silently doing nothing; the caller decides how
//! loud to be about it.
//!
//! Referential integrity is enforced here: connections can only be created
//! between two distinct existing elements of the same diagram, and deleting
//! an element removes every connection that references it.

use thiserror::Error;

use crate::ids::generate_id;
use crate::model::{
    Connection, ConnectionKind, Diagram, Element, ElementKind, ElementStatus, Point, Roadmap,
};

/// A stale or invalid reference passed to a store operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("diagram `{0}` not found")]
    DiagramNotFound(String),
    #[error("element `{0}` not found")]
    ElementNotFound(String),
    #[error("connection `{0}` not found")]
    ConnectionNotFound(String),
    #[error("element `{0}` cannot be connected to itself")]
    SelfConnection(String),
    #[error("coordinate ({x}, {y}) is not a finite number")]
    InvalidCoordinate { x: f64, y: f64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Attributes of an element that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewElement {
    pub kind: ElementKind,
    pub name: String,
    pub status: ElementStatus,
    pub x: f64,
    pub y: f64,
}

impl Default for NewElement {
    fn default() -> Self {
        Self {
            kind: ElementKind::Task,
            name: String::new(),
            status: ElementStatus::Todo,
            x: 100.0,
            y: 100.0,
        }
    }
}

impl NewElement {
    /// Whether the attributes are complete enough to create an element.
    pub fn is_submittable(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Partial update of an element's attributes. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub kind: Option<ElementKind>,
    pub status: Option<ElementStatus>,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagrams
// ────────────────────────────────────────────────────────────────────────────

/// Append a new empty diagram.
pub fn add_diagram(roadmap: &mut Roadmap, name: &str) -> Diagram {
    let diagram = Diagram {
        id: generate_id(),
        name: name.trim().to_string(),
        elements: Vec::new(),
        connections: Vec::new(),
    };
    roadmap.diagrams.push(diagram.clone());
    diagram
}

pub fn rename_diagram(roadmap: &mut Roadmap, diagram_id: &str, name: &str) -> StoreResult<()> {
    diagram_mut(roadmap, diagram_id)?.name = name.trim().to_string();
    Ok(())
}

/// Remove a diagram together with everything in it.
pub fn delete_diagram(roadmap: &mut Roadmap, diagram_id: &str) -> StoreResult<Diagram> {
    let index = roadmap
        .diagrams
        .iter()
        .position(|d| d.id == diagram_id)
        .ok_or_else(|| StoreError::DiagramNotFound(diagram_id.to_string()))?;
    Ok(roadmap.diagrams.remove(index))
}

// ────────────────────────────────────────────────────────────────────────────
// Elements
// ────────────────────────────────────────────────────────────────────────────

/// Create an element with a fresh id and return a copy of it.
pub fn add_element(roadmap: &mut Roadmap, diagram_id: &str, new: NewElement) -> StoreResult<Element> {
    ensure_finite(new.x, new.y)?;
    let diagram = diagram_mut(roadmap, diagram_id)?;
    let element = Element {
        id: generate_id(),
        kind: new.kind,
        name: new.name.trim().to_string(),
        status: new.status,
        x: new.x,
        y: new.y,
    };
    diagram.elements.push(element.clone());
    Ok(element)
}

/// Translate an element by `(dx, dy)` and return its new position.
///
/// The element is left untouched if the offset or the resulting position is
/// not finite.
pub fn move_element(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    element_id: &str,
    dx: f64,
    dy: f64,
) -> StoreResult<Point> {
    ensure_finite(dx, dy)?;
    let element = element_mut(roadmap, diagram_id, element_id)?;
    let moved = element.position().offset(dx, dy);
    ensure_finite(moved.x, moved.y)?;
    element.x = moved.x;
    element.y = moved.y;
    Ok(moved)
}

pub fn update_element(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    element_id: &str,
    patch: ElementPatch,
) -> StoreResult<Element> {
    let element = element_mut(roadmap, diagram_id, element_id)?;
    if let Some(name) = patch.name {
        element.name = name.trim().to_string();
    }
    if let Some(kind) = patch.kind {
        element.kind = kind;
    }
    if let Some(status) = patch.status {
        element.status = status;
    }
    Ok(element.clone())
}

/// Remove an element and every connection that references it.
///
/// Returns the removed element and the connections removed with it.
pub fn delete_element(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    element_id: &str,
) -> StoreResult<(Element, Vec<Connection>)> {
    let diagram = diagram_mut(roadmap, diagram_id)?;
    let index = diagram
        .elements
        .iter()
        .position(|e| e.id == element_id)
        .ok_or_else(|| StoreError::ElementNotFound(element_id.to_string()))?;
    let element = diagram.elements.remove(index);

    let (removed, kept): (Vec<Connection>, Vec<Connection>) = std::mem::take(&mut diagram.connections)
        .into_iter()
        .partition(|c| c.touches(element_id));
    diagram.connections = kept;
    Ok((element, removed))
}

// ────────────────────────────────────────────────────────────────────────────
// Connections
// ────────────────────────────────────────────────────────────────────────────

/// Connect two distinct elements of the same diagram using default anchors.
pub fn add_connection(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    source_id: &str,
    target_id: &str,
    kind: ConnectionKind,
) -> StoreResult<Connection> {
    let diagram = diagram_mut(roadmap, diagram_id)?;
    if source_id == target_id {
        return Err(StoreError::SelfConnection(source_id.to_string()));
    }
    for id in [source_id, target_id] {
        if diagram.element(id).is_none() {
            return Err(StoreError::ElementNotFound(id.to_string()));
        }
    }
    let connection = Connection {
        id: generate_id(),
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
        kind,
        source_anchor: None,
        target_anchor: None,
    };
    diagram.connections.push(connection.clone());
    Ok(connection)
}

pub fn set_connection_kind(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    connection_id: &str,
    kind: ConnectionKind,
) -> StoreResult<()> {
    diagram_mut(roadmap, diagram_id)?
        .connection_mut(connection_id)
        .ok_or_else(|| StoreError::ConnectionNotFound(connection_id.to_string()))?
        .kind = kind;
    Ok(())
}

pub fn delete_connection(
    roadmap: &mut Roadmap,
    diagram_id: &str,
    connection_id: &str,
) -> StoreResult<Connection> {
    let diagram = diagram_mut(roadmap, diagram_id)?;
    let index = diagram
        .connections
        .iter()
        .position(|c| c.id == connection_id)
        .ok_or_else(|| StoreError::ConnectionNotFound(connection_id.to_string()))?;
    Ok(diagram.connections.remove(index))
}

// ────────────────────────────────────────────────────────────────────────────
// Lookup helpers
// ────────────────────────────────────────────────────────────────────────────

/// JSON has no representation for NaN or infinities.
fn ensure_finite(x: f64, y: f64) -> StoreResult<()> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(StoreError::InvalidCoordinate { x, y })
    }
}

fn diagram_mut<'a>(roadmap: &'a mut Roadmap, diagram_id: &str) -> StoreResult<&'a mut Diagram> {
    roadmap
        .diagram_mut(diagram_id)
        .ok_or_else(|| StoreError::DiagramNotFound(diagram_id.to_string()))
}

fn element_mut<'a>(
    roadmap: &'a mut Roadmap,
    diagram_id: &str,
    element_id: &str,
) -> StoreResult<&'a mut Element> {
    diagram_mut(roadmap, diagram_id)?
        .element_mut(element_id)
        .ok_or_else(|| StoreError::ElementNotFound(element_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_roadmap() -> (Roadmap, String) {
        let mut roadmap = Roadmap::default();
        let id = add_diagram(&mut roadmap, "Q3").id;
        (roadmap, id)
    }

    fn new_element(name: &str, x: f64, y: f64) -> NewElement {
        NewElement {
            name: name.to_string(),
            x,
            y,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_element_assigns_fresh_id() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("  Design ", 10.0, 20.0)).unwrap();
        let b = add_element(&mut roadmap, &d, new_element("Build", 0.0, 0.0)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "Design");
        assert_eq!(roadmap.diagram(&d).unwrap().elements.len(), 2);
    }

    #[test]
    fn test_move_element_accumulates() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 100.0, 100.0)).unwrap();
        move_element(&mut roadmap, &d, &a.id, 10.0, 10.0).unwrap();
        let pos = move_element(&mut roadmap, &d, &a.id, -5.0, 0.0).unwrap();
        assert_eq!(pos, Point::new(105.0, 110.0));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 100.0, 100.0)).unwrap();

        assert!(matches!(
            move_element(&mut roadmap, &d, &a.id, f64::NAN, 0.0),
            Err(StoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            move_element(&mut roadmap, &d, &a.id, 0.0, f64::NEG_INFINITY),
            Err(StoreError::InvalidCoordinate { .. })
        ));
        assert!(move_element(&mut roadmap, &d, &a.id, f64::MAX, 0.0).is_ok());
        // A second push past f64::MAX overflows to infinity.
        assert!(matches!(
            move_element(&mut roadmap, &d, &a.id, f64::MAX, 0.0),
            Err(StoreError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            add_element(&mut roadmap, &d, new_element("B", f64::INFINITY, 0.0)),
            Err(StoreError::InvalidCoordinate { .. })
        ));

        let diagram = roadmap.diagram(&d).unwrap();
        assert_eq!(diagram.elements.len(), 1);
        assert!(diagram.elements[0].x.is_finite() && diagram.elements[0].y == 100.0);
        assert!(Roadmap::from_json(&roadmap.to_json().unwrap()).is_ok());
    }

    #[test]
    fn test_delete_element_cascades() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 0.0, 0.0)).unwrap();
        let b = add_element(&mut roadmap, &d, new_element("B", 300.0, 0.0)).unwrap();
        let c = add_element(&mut roadmap, &d, new_element("C", 600.0, 0.0)).unwrap();
        add_connection(&mut roadmap, &d, &a.id, &b.id, ConnectionKind::Solid).unwrap();
        add_connection(&mut roadmap, &d, &b.id, &a.id, ConnectionKind::Dashed).unwrap();
        let keep = add_connection(&mut roadmap, &d, &b.id, &c.id, ConnectionKind::Solid).unwrap();

        let (removed, cascaded) = delete_element(&mut roadmap, &d, &a.id).unwrap();
        assert_eq!(removed.id, a.id);
        assert_eq!(cascaded.len(), 2);

        let diagram = roadmap.diagram(&d).unwrap();
        assert_eq!(diagram.connections, vec![keep]);
        assert!(diagram.connections.iter().all(|c| !c.touches(&a.id)));
    }

    #[test]
    fn test_add_connection_rejects_self_and_missing() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 0.0, 0.0)).unwrap();
        assert_eq!(
            add_connection(&mut roadmap, &d, &a.id, &a.id, ConnectionKind::Solid),
            Err(StoreError::SelfConnection(a.id.clone()))
        );
        assert_eq!(
            add_connection(&mut roadmap, &d, &a.id, "ghost", ConnectionKind::Solid),
            Err(StoreError::ElementNotFound("ghost".into()))
        );
        assert!(roadmap.diagram(&d).unwrap().connections.is_empty());
    }

    #[test]
    fn test_stale_ids_report_not_found() {
        let (mut roadmap, d) = make_test_roadmap();
        assert_eq!(
            move_element(&mut roadmap, &d, "ghost", 1.0, 1.0),
            Err(StoreError::ElementNotFound("ghost".into()))
        );
        assert_eq!(
            delete_connection(&mut roadmap, &d, "ghost"),
            Err(StoreError::ConnectionNotFound("ghost".into()))
        );
        assert_eq!(
            add_element(&mut roadmap, "nope", NewElement::default()),
            Err(StoreError::DiagramNotFound("nope".into()))
        );
        assert!(delete_diagram(&mut roadmap, "nope").is_err());
    }

    #[test]
    fn test_update_element_patch() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 0.0, 0.0)).unwrap();
        let updated = update_element(
            &mut roadmap,
            &d,
            &a.id,
            ElementPatch {
                status: Some(ElementStatus::Completed),
                kind: Some(ElementKind::Milestone),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "A");
        assert_eq!(updated.kind, ElementKind::Milestone);
        assert_eq!(updated.status, ElementStatus::Completed);
    }

    #[test]
    fn test_connection_kind_and_delete() {
        let (mut roadmap, d) = make_test_roadmap();
        let a = add_element(&mut roadmap, &d, new_element("A", 0.0, 0.0)).unwrap();
        let b = add_element(&mut roadmap, &d, new_element("B", 300.0, 0.0)).unwrap();
        let c = add_connection(&mut roadmap, &d, &a.id, &b.id, ConnectionKind::Solid).unwrap();
        set_connection_kind(&mut roadmap, &d, &c.id, ConnectionKind::Dashed).unwrap();
        assert_eq!(roadmap.diagram(&d).unwrap().connections[0].kind, ConnectionKind::Dashed);

        delete_connection(&mut roadmap, &d, &c.id).unwrap();
        assert!(roadmap.diagram(&d).unwrap().connections.is_empty());
        assert_eq!(roadmap.diagram(&d).unwrap().elements.len(), 2);
    }

    #[test]
    fn test_diagram_management() {
        let (mut roadmap, d) = make_test_roadmap();
        let second = add_diagram(&mut roadmap, "Q4");
        rename_diagram(&mut roadmap, &d, "Q3 plan").unwrap();
        assert_eq!(roadmap.diagram(&d).unwrap().name, "Q3 plan");

        let removed = delete_diagram(&mut roadmap, &d).unwrap();
        assert_eq!(removed.name, "Q3 plan");
        assert_eq!(roadmap.diagrams.len(), 1);
        assert_eq!(roadmap.diagrams[0].id, second.id);
    }

    #[test]
    fn test_new_element_submittable() {
        assert!(!NewElement::default().is_submittable());
        assert!(!new_element("   ", 0.0, 0.0).is_submittable());
        assert!(new_element("x", 0.0, 0.0).is_submittable());
    }
}
