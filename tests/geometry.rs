use roadmap_editor::geometry::{ARROW_SIZE, connection_path, render_scene};
use roadmap_editor::model::{Connection, ConnectionKind, Diagram, Element, ElementKind, Point};

fn element(id: &str, x: f64, y: f64) -> Element {
    Element {
        id: id.into(),
        kind: ElementKind::Task,
        name: id.into(),
        x,
        y,
        ..Default::default()
    }
}

fn connect(id: &str, source: &str, target: &str) -> Connection {
    Connection {
        id: id.into(),
        source_id: source.into(),
        target_id: target.into(),
        kind: ConnectionKind::Solid,
        source_anchor: None,
        target_anchor: None,
    }
}

#[test]
fn control_points_for_side_by_side_nodes() {
    let elements = vec![element("s", 0.0, 0.0), element("t", 200.0, 0.0)];
    let path = connection_path(&connect("c", "s", "t"), &elements).unwrap();
    let (sx, tx) = (path.start.x, path.end.x);
    assert!((path.control1.x - (sx + (tx - sx) / 3.0)).abs() < 1e-9);
    assert!((path.control2.x - (sx + 2.0 * (tx - sx) / 3.0)).abs() < 1e-9);
    assert_eq!(path.control1.y, path.start.y);
    assert_eq!(path.control2.y, path.end.y);
}

#[test]
fn horizontal_tangents_for_any_placement() {
    let mut elements = Vec::new();
    for i in 0..6 {
        let f = i as f64;
        elements.push(element(&format!("n{i}"), (f * 137.0) % 500.0, (f * 71.0) % 400.0 - 150.0));
    }
    for s in &elements {
        for t in &elements {
            if s.id == t.id {
                continue;
            }
            let path = connection_path(&connect("c", &s.id, &t.id), &elements).unwrap();
            assert_eq!(path.control1.y, path.start.y);
            assert_eq!(path.control2.y, path.end.y);
            assert_eq!(path.arrow[0], path.end);
            for base in &path.arrow[1..] {
                assert!((base.distance(path.end) - ARROW_SIZE).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn custom_anchors_override_default() {
    let elements = vec![element("s", 0.0, 0.0), element("t", 400.0, 0.0)];
    let mut c = connect("c", "s", "t");
    c.source_anchor = Some(Point::new(200.0, 50.0));
    c.target_anchor = Some(Point::new(0.0, 50.0));
    let path = connection_path(&c, &elements).unwrap();
    assert_eq!(path.start, Point::new(200.0, 50.0));
    assert_eq!(path.end, Point::new(400.0, 50.0));
}

#[test]
fn dangling_connections_are_not_rendered() {
    let diagram = Diagram {
        id: "d".into(),
        name: "Plan".into(),
        elements: vec![element("a", 0.0, 0.0)],
        connections: vec![connect("c", "a", "missing")],
    };
    assert!(render_scene(&diagram).is_empty());
}
