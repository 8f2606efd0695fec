use anyhow::Result;
use roadmap_editor::cli::{Command, execute};
use roadmap_editor::config::EditorConfig;
use roadmap_editor::editor::EditorState;
use roadmap_editor::model::{ElementKind, ElementStatus};
use roadmap_editor::storage::MemoryStore;

fn make_editor() -> EditorState {
    EditorState::with_store(Box::new(MemoryStore::new()), EditorConfig::default()).unwrap()
}

fn run(editor: &mut EditorState, command: Command) -> Result<String> {
    let mut out = Vec::new();
    execute(editor, command, &mut out)?;
    Ok(String::from_utf8(out)?.trim().to_string())
}

fn add(editor: &mut EditorState, name: &str, x: f64) -> String {
    run(
        editor,
        Command::Add {
            diagram: "Plan".into(),
            name: name.into(),
            kind: ElementKind::Task,
            status: ElementStatus::Todo,
            x,
            y: 0.0,
        },
    )
    .unwrap()
}

#[test]
fn build_a_plan_from_commands() {
    let mut editor = make_editor();
    let diagram_id = run(&mut editor, Command::New { name: "Plan".into() }).unwrap();
    let a = add(&mut editor, "Design", 0.0);
    let b = add(&mut editor, "Build", 300.0);

    let connection = run(
        &mut editor,
        Command::Connect {
            diagram: "Plan".into(),
            source: "Design".into(),
            target: b.clone(),
            dashed: true,
        },
    )
    .unwrap();

    let listing = run(&mut editor, Command::List).unwrap();
    assert!(listing.contains(&diagram_id));
    assert!(listing.contains("2 element(s)"));

    let shown = run(&mut editor, Command::Show { diagram: diagram_id.clone() }).unwrap();
    assert!(shown.contains(&format!("{} -> {}", a, b)));

    let rendered = run(&mut editor, Command::Render { diagram: "Plan".into() }).unwrap();
    assert!(rendered.starts_with(&connection));
    assert!(rendered.contains("M 100 50 C 200 50, 300 50, 400 50"));
    assert!(rendered.ends_with("5,5"));
}

#[test]
fn move_accepts_negative_offsets_and_delete_cascades() {
    let mut editor = make_editor();
    run(&mut editor, Command::New { name: "Plan".into() }).unwrap();
    let a = add(&mut editor, "A", 100.0);
    let b = add(&mut editor, "B", 400.0);
    run(
        &mut editor,
        Command::Connect { diagram: "Plan".into(), source: a.clone(), target: b.clone(), dashed: false },
    )
    .unwrap();

    run(
        &mut editor,
        Command::Move { diagram: "Plan".into(), element: "A".into(), dx: -50.0, dy: 5.0 },
    )
    .unwrap();
    let moved = editor.active_diagram().unwrap().element(&a).unwrap().position();
    assert_eq!((moved.x, moved.y), (50.0, 5.0));

    run(&mut editor, Command::Delete { diagram: "Plan".into(), element: a }).unwrap();
    assert!(editor.active_diagram().unwrap().connections.is_empty());
}

#[test]
fn errors_are_reported() {
    let mut editor = make_editor();
    run(&mut editor, Command::New { name: "Plan".into() }).unwrap();
    let a = add(&mut editor, "A", 0.0);

    assert!(run(&mut editor, Command::Show { diagram: "Nope".into() }).is_err());
    assert!(
        run(
            &mut editor,
            Command::Connect { diagram: "Plan".into(), source: a.clone(), target: a.clone(), dashed: false },
        )
        .is_err()
    );
    assert!(
        run(&mut editor, Command::Delete { diagram: "Plan".into(), element: "ghost".into() }).is_err()
    );
    assert!(
        run(
            &mut editor,
            Command::Move { diagram: "Plan".into(), element: "A".into(), dx: f64::NAN, dy: 0.0 },
        )
        .is_err()
    );
    let unmoved = editor.active_diagram().unwrap().element(&a).unwrap().position();
    assert_eq!((unmoved.x, unmoved.y), (0.0, 0.0));
}

#[test]
fn read_only_rejects_mutations() {
    let config = EditorConfig { read_only: true, ..Default::default() };
    let mut editor = EditorState::with_store(Box::new(MemoryStore::new()), config).unwrap();
    assert!(run(&mut editor, Command::New { name: "Plan".into() }).is_err());
    assert!(run(&mut editor, Command::List).is_ok());
}
