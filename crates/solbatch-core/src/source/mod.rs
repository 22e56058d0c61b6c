//! In-memory file store and the loader that fills it

mod loader;
mod store;

pub use loader::{
    LiteralSubstitutions, LoadMode, LoadRequest, NoSubstitutions, SourceLoader, Substitutions,
};
pub use store::{FileStore, Pool, SourceFile};
