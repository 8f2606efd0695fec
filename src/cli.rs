use crate::config::EditorConfig;
use crate::editor::{EditorState, NewElement};
use crate::model::{ConnectionKind, Diagram, ElementKind, ElementStatus};
use crate::storage::FileStore;
use anyhow::{Context, Result, bail, ensure};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(name = "roadmap", version, about = "Edit roadmap diagrams kept in a local store")]
pub struct Args {
    /// Directory holding the persisted diagram collection
    #[arg(short = 's', long = "store", default_value = ".roadmap")]
    pub store: Utf8PathBuf,

    /// Editor config JSON file
    #[arg(short = 'c', long = "config")]
    pub config: Option<Utf8PathBuf>,

    /// Refuse every command that would change the collection
    #[arg(long = "read-only")]
    pub read_only: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List all diagrams
    List,
    /// Print the elements and connections of a diagram
    Show { diagram: String },
    /// Create a new diagram
    New { name: String },
    /// Rename a diagram
    Rename { diagram: String, name: String },
    /// Delete a diagram and everything in it
    Remove { diagram: String },
    /// Add an element to a diagram
    Add {
        diagram: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = ElementKind::Task)]
        kind: ElementKind,
        #[arg(long, default_value_t = ElementStatus::Todo)]
        status: ElementStatus,
        #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
        y: f64,
    },
    /// Move an element by an offset
    Move {
        diagram: String,
        element: String,
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Delete an element and its connections
    Delete { diagram: String, element: String },
    /// Connect two elements
    Connect {
        diagram: String,
        source: String,
        target: String,
        #[arg(long)]
        dashed: bool,
    },
    /// Delete a connection
    Disconnect { diagram: String, connection: String },
    /// Print the curve and arrowhead of every connection as SVG data
    Render { diagram: String },
}

impl Command {
    fn is_mutating(&self) -> bool {
        !matches!(self, Command::List | Command::Show { .. } | Command::Render { .. })
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = EditorConfig::load_or_default(args.config.as_deref())?;
    if args.read_only {
        config.read_only = true;
    }
    let store = FileStore::new(args.store.clone());
    let mut editor = EditorState::with_store(Box::new(store), config)
        .with_context(|| format!("Open roadmap store {}", args.store))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&mut editor, args.command, &mut out)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}

/// Run one command against an open editor, writing any report to `out`.
pub fn execute(editor: &mut EditorState, command: Command, out: &mut impl Write) -> Result<()> {
    if command.is_mutating() && editor.is_read_only() {
        bail!("The roadmap is open read-only");
    }

    match command {
        Command::List => {
            for d in &editor.roadmap().diagrams {
                writeln!(
                    out,
                    "{}\t{}\t{} element(s)\t{} connection(s)",
                    d.id,
                    d.name,
                    d.elements.len(),
                    d.connections.len()
                )?;
            }
        }
        Command::Show { diagram } => {
            open(editor, &diagram)?;
            let d = active(editor)?;
            writeln!(out, "{} ({})", d.name, d.id)?;
            for e in &d.elements {
                writeln!(out, "  {}\t{}\t{}\t({}, {})\t{}", e.id, e.kind, e.status, e.x, e.y, e.name)?;
            }
            for c in &d.connections {
                writeln!(out, "  {}\t{} -> {}\t{}", c.id, c.source_id, c.target_id, c.kind)?;
            }
        }
        Command::New { name } => {
            let id = editor
                .add_diagram(&name)
                .with_context(|| format!("Could not create diagram `{}`", name))?;
            writeln!(out, "{}", id)?;
        }
        Command::Rename { diagram, name } => {
            let id = open(editor, &diagram)?;
            ensure!(editor.rename_diagram(&id, &name), "Could not rename diagram `{}`", diagram);
        }
        Command::Remove { diagram } => {
            let id = open(editor, &diagram)?;
            ensure!(editor.delete_diagram(&id), "Could not delete diagram `{}`", diagram);
        }
        Command::Add {
            diagram,
            name,
            kind,
            status,
            x,
            y,
        } => {
            open(editor, &diagram)?;
            let element = editor
                .add_element(NewElement {
                    kind,
                    name: name.clone(),
                    status,
                    x,
                    y,
                })
                .with_context(|| format!("Could not add element `{}`", name))?;
            writeln!(out, "{}", element.id)?;
        }
        Command::Move {
            diagram,
            element,
            dx,
            dy,
        } => {
            open(editor, &diagram)?;
            let id = element_id(active(editor)?, &element)?;
            ensure!(editor.move_element(&id, dx, dy), "Could not move element `{}`", element);
        }
        Command::Delete { diagram, element } => {
            open(editor, &diagram)?;
            let id = element_id(active(editor)?, &element)?;
            ensure!(editor.delete_element(&id), "Could not delete element `{}`", element);
        }
        Command::Connect {
            diagram,
            source,
            target,
            dashed,
        } => {
            open(editor, &diagram)?;
            let d = active(editor)?;
            let (source_id, target_id) = (element_id(d, &source)?, element_id(d, &target)?);
            ensure!(source_id != target_id, "An element cannot be connected to itself");
            let kind = if dashed { ConnectionKind::Dashed } else { ConnectionKind::Solid };

            let before = active(editor)?.connections.len();
            editor.click_element(&source_id);
            ensure!(editor.start_connecting(kind), "Could not start a connection from `{}`", source);
            editor.click_element(&target_id);
            let d = active(editor)?;
            ensure!(d.connections.len() > before, "Could not connect `{}` to `{}`", source, target);
            if let Some(c) = d.connections.last() {
                writeln!(out, "{}", c.id)?;
            }
        }
        Command::Disconnect { diagram, connection } => {
            open(editor, &diagram)?;
            ensure!(
                editor.delete_connection(&connection),
                "Could not delete connection `{}`",
                connection
            );
        }
        Command::Render { diagram } => {
            open(editor, &diagram)?;
            for (id, path) in editor.scene() {
                let dash = path.dash_array().unwrap_or("-");
                writeln!(out, "{}\t{}\t{}\t{}", id, path.svg_path(), path.arrow_points(), dash)?;
            }
        }
    }

    ensure!(!editor.is_dirty(), "Changes could not be saved; see the log for details");
    Ok(())
}

fn open(editor: &mut EditorState, diagram: &str) -> Result<String> {
    ensure!(editor.switch_diagram(diagram), "No diagram named `{}`", diagram);
    Ok(editor.active_diagram_id().to_string())
}

fn active(editor: &EditorState) -> Result<&Diagram> {
    editor.active_diagram().context("No active diagram")
}

/// Resolve an element by id, or by name when exactly one element carries it.
fn element_id(diagram: &Diagram, key: &str) -> Result<String> {
    if let Some(e) = diagram.element(key) {
        return Ok(e.id.clone());
    }
    let mut named = diagram.elements.iter().filter(|e| e.name == key);
    match (named.next(), named.next()) {
        (Some(e), None) => Ok(e.id.clone()),
        (Some(_), Some(_)) => bail!("Several elements are named `{}`; use an id", key),
        (None, _) => bail!("No element `{}` in diagram `{}`", key, diagram.name),
    }
}
