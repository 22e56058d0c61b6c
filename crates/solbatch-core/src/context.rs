use crate::request::RemapTable;
use crate::resolve::{DependencyCache, LibraryRegistry};
use crate::source::FileStore;

/// All mutable state of one build run
///
/// A fresh context is created per run and passed explicitly to every
/// component; components themselves hold configuration and collaborators
/// only. Nothing here survives between runs.
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Current content of every known file
    pub store: FileStore,

    /// Memoized dependency lists and the in-progress resolution chain
    pub dependencies: DependencyCache,

    /// Aliases discovered while assembling the compiler request
    pub remaps: RemapTable,

    /// Built on the first import that no other search step can find
    pub libraries: Option<LibraryRegistry>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }
}
