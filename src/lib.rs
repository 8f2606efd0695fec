//! Roadmap diagram editor core.
//!
//! This crate models roadmap diagrams (elements connected by curved arrows)
//! and provides everything an editor front end needs around them:
//!
//! - [`model`]: diagrams, elements, connections and their persisted layout
//! - [`geometry`]: anchor points, Bezier control points, arrowheads, hit testing
//! - [`editor`]: graph store operations, selection, undo/redo history and the
//!   interaction controller ([`editor::EditorState`])
//! - [`storage`]: key-value persistence of the whole diagram collection
//!
//! The binary `roadmap` drives the same controller from the command line.

pub mod cli;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod ids;
pub mod model;
pub mod storage;

pub use cli::run;
