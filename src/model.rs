use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of an element's box in diagram coordinates.
pub const NODE_WIDTH: f64 = 200.0;
/// Height of an element's box in diagram coordinates.
pub const NODE_HEIGHT: f64 = 100.0;
/// Anchor offset used when a connection does not carry its own.
pub const DEFAULT_ANCHOR: Point = Point { x: 100.0, y: 50.0 };

// ────────────────────────────────────────────────────────────────────────────
// Point
// ────────────────────────────────────────────────────────────────────────────

/// A position or offset in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Enumerations
// ────────────────────────────────────────────────────────────────────────────

/// Shape of an element. Only affects how a front end draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Start,
    End,
    #[default]
    Task,
    Milestone,
    Decision,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Start,
        ElementKind::End,
        ElementKind::Task,
        ElementKind::Milestone,
        ElementKind::Decision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Start => "start",
            ElementKind::End => "end",
            ElementKind::Task => "task",
            ElementKind::Milestone => "milestone",
            ElementKind::Decision => "decision",
        }
    }
}

/// Progress of an element. Only affects how a front end colors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl ElementStatus {
    pub const ALL: [ElementStatus; 3] = [
        ElementStatus::Todo,
        ElementStatus::InProgress,
        ElementStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementStatus::Todo => "todo",
            ElementStatus::InProgress => "in-progress",
            ElementStatus::Completed => "completed",
        }
    }

    /// The status that follows this one, wrapping back to `Todo`.
    pub fn next(self) -> Self {
        match self {
            ElementStatus::Todo => ElementStatus::InProgress,
            ElementStatus::InProgress => ElementStatus::Completed,
            ElementStatus::Completed => ElementStatus::Todo,
        }
    }
}

/// Line style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    #[default]
    Solid,
    Dashed,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 2] = [ConnectionKind::Solid, ConnectionKind::Dashed];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::Solid => "solid",
            ConnectionKind::Dashed => "dashed",
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        let known: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown {} `{}` (expected one of: {})", $what, s, known.join(", "))
                    })
            }
        }
    };
}

impl_text_enum!(ElementKind, "element type");
impl_text_enum!(ElementStatus, "status");
impl_text_enum!(ConnectionKind, "connection type");

// ────────────────────────────────────────────────────────────────────────────
// Element / Connection
// ────────────────────────────────────────────────────────────────────────────

/// A node of the roadmap graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub name: String,
    #[serde(default)]
    pub status: ElementStatus,
    pub x: f64,
    pub y: f64,
}

impl Element {
    /// Top-left corner of the element's box.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns true if `p` lies inside the element's box (edges included).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + NODE_WIDTH && p.y >= self.y && p.y <= self.y + NODE_HEIGHT
    }
}

/// A directed edge between two elements of the same diagram.
///
/// Anchors are offsets from the endpoint element's top-left corner; `None`
/// means [`DEFAULT_ANCHOR`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "type", default)]
    pub kind: ConnectionKind,
    #[serde(rename = "sourceAnchor", default)]
    pub source_anchor: Option<Point>,
    #[serde(rename = "targetAnchor", default)]
    pub target_anchor: Option<Point>,
}

impl Connection {
    /// Returns true if either endpoint is the given element.
    pub fn touches(&self, element_id: &str) -> bool {
        self.source_id == element_id || self.target_id == element_id
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram / Roadmap
// ────────────────────────────────────────────────────────────────────────────

/// A named roadmap: a set of elements and the connections between them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagram {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Diagram {
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn connection_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.id == id)
    }

    /// Connections with an endpoint that no longer resolves to an element.
    pub fn dangling_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| self.element(&c.source_id).is_none() || self.element(&c.target_id).is_none())
    }
}

/// The whole diagram collection. Serializes as a bare JSON array of diagrams.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roadmap {
    pub diagrams: Vec<Diagram>,
}

impl Roadmap {
    pub fn diagram(&self, id: &str) -> Option<&Diagram> {
        self.diagrams.iter().find(|d| d.id == id)
    }

    pub fn diagram_mut(&mut self, id: &str) -> Option<&mut Diagram> {
        self.diagrams.iter_mut().find(|d| d.id == id)
    }

    /// Look a diagram up by id first, then by exact name.
    pub fn find_diagram(&self, id_or_name: &str) -> Option<&Diagram> {
        self.diagram(id_or_name)
            .or_else(|| self.diagrams.iter().find(|d| d.name == id_or_name))
    }

    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty()
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode the collection into the compact binary form used for history snapshots.
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Decode a collection produced by [`Roadmap::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let (roadmap, read): (Roadmap, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if read != bytes.len() {
            anyhow::bail!("trailing bytes after roadmap snapshot ({} of {} read)", read, bytes.len());
        }
        Ok(roadmap)
    }
}
