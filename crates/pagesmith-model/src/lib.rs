//! App, page and component-tree model.
//!
//! This crate defines the snapshot handed to the export pipeline: an app,
//! its pages (each holding a recursive component tree), custom components
//! and functions. It also loads snapshots from JSON/YAML files and project
//! directories.

pub mod app;
pub mod loader;
pub mod node;

pub use app::{App, AppSnapshot, CustomComponent, FunctionRecord, Page, PageContent, Seo, Theme};
pub use loader::{load_snapshot, parse_document, snapshot_sources, Format, ModelError};
pub use node::{ComponentKind, ComponentNode, Props, StyleMap};
