//! Core data types: binding declarations and registry records.

pub mod binding;
pub mod resource;

pub use binding::{block_spans, parse_bindings, BindingDeclaration, BlockSpan, BLOCK_MARKER};
pub use resource::{find_record, ResourceRecord};
