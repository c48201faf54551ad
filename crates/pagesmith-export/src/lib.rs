//! Application assembler for pagesmith exports.
//!
//! Builds the complete file set of an exported Vue app from an app snapshot:
//! one view per page, one file per custom component, and the shared shell
//! (entry document, router, root component, theme stylesheet, manifest).

pub mod assembler;
pub mod assets;
pub mod templates;
pub mod writer;

pub use assembler::{
    assemble_app, AppAssembler, AssembleConfig, AssembleError, ExportSummary, ExportedApp, FileMap,
};
pub use writer::{write_file_map, WriteError};
