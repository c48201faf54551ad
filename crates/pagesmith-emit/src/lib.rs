//! Template emitter for pagesmith pages.
//!
//! Turns a page's component tree into the source of a Vue single-file
//! component. Emission is pure and deterministic: the same page always yields
//! byte-identical output, and unknown component types degrade to inert
//! placeholders instead of failing.

pub mod emitter;
pub mod escape;
pub mod naming;
pub mod style;

pub use emitter::{emit_page, emit_page_as, AppMeta, EmitError, EmitOptions, EMPTY_PAGE_MARKER};
pub use naming::{identifier, normalize_route_path, scope_class, slugify, IdentifierAllocator};
pub use style::{inline_styles, serialize_styles, to_kebab_case};
