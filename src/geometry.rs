//! Connection geometry and hit testing.
//!
//! A connection is drawn as a cubic Bezier curve from the source anchor to
//! the target anchor. The control points share the y coordinate of the
//! nearer endpoint, so both ends leave and enter horizontally whatever the
//! relative placement of the two elements. An arrowhead sits on the target
//! anchor, aligned with the curve's tangent there.

use std::f64::consts::PI;

use indexmap::IndexMap;

use crate::model::{Connection, ConnectionKind, DEFAULT_ANCHOR, Diagram, Element, Point};

/// Length of the arrowhead's sides.
pub const ARROW_SIZE: f64 = 10.0;
/// Angle between the arrowhead's bisector and each of its sides.
pub const ARROW_SPREAD: f64 = PI / 6.0;
/// Dash pattern for dashed connections, in SVG `stroke-dasharray` syntax.
pub const DASH_PATTERN: &str = "5,5";

const HIT_SAMPLES: usize = 32;

/// Render geometry of one connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionPath {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
    /// Tip followed by the two base vertices.
    pub arrow: [Point; 3],
    pub kind: ConnectionKind,
}

impl ConnectionPath {
    /// SVG path data: `M sx sy C c1x c1y, c2x c2y, tx ty`.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            num(self.start.x),
            num(self.start.y),
            num(self.control1.x),
            num(self.control1.y),
            num(self.control2.x),
            num(self.control2.y),
            num(self.end.x),
            num(self.end.y),
        )
    }

    /// The arrowhead as an SVG `points` attribute.
    pub fn arrow_points(&self) -> String {
        self.arrow
            .iter()
            .map(|p| format!("{},{}", num(p.x), num(p.y)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn dash_array(&self) -> Option<&'static str> {
        match self.kind {
            ConnectionKind::Solid => None,
            ConnectionKind::Dashed => Some(DASH_PATTERN),
        }
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    /// Approximate distance from `p` to the curve.
    pub fn distance_to(&self, p: Point) -> f64 {
        let mut best = f64::INFINITY;
        let mut prev = self.start;
        for i in 1..=HIT_SAMPLES {
            let next = self.point_at(i as f64 / HIT_SAMPLES as f64);
            best = best.min(segment_distance(p, prev, next));
            prev = next;
        }
        best
    }
}

/// Absolute position of an anchor on `element`.
pub fn anchor_point(element: &Element, anchor: Option<Point>) -> Point {
    let offset = anchor.unwrap_or(DEFAULT_ANCHOR);
    element.position().offset(offset.x, offset.y)
}

/// Control points of the horizontal-tangent S-curve from `start` to `end`.
pub fn bezier_controls(start: Point, end: Point) -> (Point, Point) {
    let dx = end.x - start.x;
    (
        Point::new(start.x + dx / 3.0, start.y),
        Point::new(start.x + 2.0 * dx / 3.0, end.y),
    )
}

/// Arrowhead triangle with its tip on `tip`, pointing away from `control`.
pub fn arrowhead(tip: Point, control: Point) -> [Point; 3] {
    let angle = (tip.y - control.y).atan2(tip.x - control.x);
    let side = |a: f64| Point::new(tip.x - ARROW_SIZE * a.cos(), tip.y - ARROW_SIZE * a.sin());
    [tip, side(angle - ARROW_SPREAD), side(angle + ARROW_SPREAD)]
}

/// Geometry of `connection`, or `None` if either endpoint is missing from `elements`.
pub fn connection_path(connection: &Connection, elements: &[Element]) -> Option<ConnectionPath> {
    let find = |id: &str| elements.iter().find(|e| e.id == id);
    let source = find(&connection.source_id)?;
    let target = find(&connection.target_id)?;

    let start = anchor_point(source, connection.source_anchor);
    let end = anchor_point(target, connection.target_anchor);
    let (control1, control2) = bezier_controls(start, end);
    Some(ConnectionPath {
        start,
        control1,
        control2,
        end,
        arrow: arrowhead(end, control2),
        kind: connection.kind,
    })
}

/// Paths of every renderable connection in draw order, keyed by connection id.
pub fn render_scene(diagram: &Diagram) -> IndexMap<String, ConnectionPath> {
    diagram
        .connections
        .iter()
        .filter_map(|c| connection_path(c, &diagram.elements).map(|p| (c.id.clone(), p)))
        .collect()
}

/// Topmost element whose box contains `p`. Later elements are drawn on top.
pub fn element_at(diagram: &Diagram, p: Point) -> Option<&Element> {
    diagram.elements.iter().rev().find(|e| e.contains(p))
}

/// Connection nearest to `p`, if it lies within `tolerance`.
pub fn connection_at(diagram: &Diagram, p: Point, tolerance: f64) -> Option<&Connection> {
    diagram
        .connections
        .iter()
        .filter_map(|c| {
            let path = connection_path(c, &diagram.elements)?;
            let d = path.distance_to(p);
            (d <= tolerance).then_some((c, d))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Format a coordinate with at most two decimals.
fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { "0".to_string() } else { format!("{}", r) }
}
