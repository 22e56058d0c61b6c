//! Compiler output processing: filtered artifacts and flattened sources

mod filter;
mod flatten;
mod processor;

pub use filter::{filter_output, selected_fields};
pub use flatten::{flatten, FlattenOptions};
pub use processor::{CompileStamp, OutputProcessor, ProcessReport};
