//! The compiler request: assembly, alias remapping and pruning

mod assembler;
mod document;
mod remap;

pub use assembler::RequestAssembler;
pub use document::{RequestDocument, RequestSettings, SourceEntry};
pub use remap::RemapTable;
