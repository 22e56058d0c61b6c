//! Import discovery: where an import lives and what a file transitively needs

mod library;
mod locator;
mod paths;
mod resolver;

pub use library::LibraryRegistry;
pub use locator::{ExternalLookup, LocateError, Locator, SearchPathLookup};
pub use paths::{find_project_root, is_relative, join_import, output_relative};
pub use resolver::{Closures, DependencyCache, DependencyResolver};
