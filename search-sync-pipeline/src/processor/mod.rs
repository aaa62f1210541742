//! Processor module for the search sync pipeline.
//!
//! Projects records into documents: mapping resolution, dot-path and
//! template sources, extra fields and field callbacks.

mod document_projector;
mod source_path;

pub use document_projector::DocumentProjector;
pub use source_path::{render_template, resolve_path, resolve_source, MappingSource};
