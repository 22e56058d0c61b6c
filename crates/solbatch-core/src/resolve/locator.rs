use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::context::BuildContext;
use crate::fs::FileSystem;
use crate::source::{Pool, SourceFile, SourceLoader};

use super::LibraryRegistry;

/// Lookup of package-style specifiers outside the project tree
pub trait ExternalLookup: Send + Sync {
    /// The file a specifier names, or every location that was tried
    fn lookup(&self, specifier: &str) -> Result<PathBuf, Vec<String>>;
}

/// [`ExternalLookup`] over a list of search directories (e.g. `node_modules`)
pub struct SearchPathLookup {
    file_system: Arc<dyn FileSystem>,
    search_dirs: Vec<PathBuf>,
}

impl SearchPathLookup {
    pub fn new(file_system: Arc<dyn FileSystem>, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            file_system,
            search_dirs,
        }
    }
}

impl ExternalLookup for SearchPathLookup {
    fn lookup(&self, specifier: &str) -> Result<PathBuf, Vec<String>> {
        let mut tried = Vec::new();
        for dir in &self.search_dirs {
            let candidate = dir.join(specifier);
            if self.file_system.is_file(&candidate) {
                return Ok(candidate);
            }
            tried.push(candidate.display().to_string());
        }
        Err(tried)
    }
}

/// An import no search step could find
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocateError {
    pub import: String,
    /// Every location attempted, in search order
    pub attempted: Vec<String>,
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" not found; tried:", self.import)?;
        for location in &self.attempted {
            write!(f, "\n  - {}", location)?;
        }
        Ok(())
    }
}

impl std::error::Error for LocateError {}

/// Finds and loads the file behind an import string
///
/// Search order: `base/<import>`, `base/contracts/<import>`,
/// `base/src/<import>`, the external lookup, then the library registry.
/// Content is stored under the import string itself, never under the
/// disk path it was found at.
pub struct Locator {
    loader: Arc<SourceLoader>,
    external: Arc<dyn ExternalLookup>,
    base_dir: PathBuf,
    extension: String,
}

impl Locator {
    pub fn new(
        loader: Arc<SourceLoader>,
        external: Arc<dyn ExternalLookup>,
        base_dir: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            external,
            base_dir: base_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Make `import` available in the store and return it
    ///
    /// Files already loaded in either pool are returned as they are. New
    /// files are read in blocking mode and land in the dependency pool.
    pub fn locate<'c>(
        &self,
        ctx: &'c mut BuildContext,
        import: &str,
    ) -> Result<&'c SourceFile, LocateError> {
        if !ctx.store.contains(import) {
            let file = self.find(ctx, import)?;
            ctx.store.insert(file, Pool::Dependency);
        }
        ctx.store.get(import).ok_or_else(|| LocateError {
            import: import.to_string(),
            attempted: Vec::new(),
        })
    }

    fn find(&self, ctx: &mut BuildContext, import: &str) -> Result<SourceFile, LocateError> {
        let mut attempted = Vec::new();

        let local = [
            self.base_dir.join(import),
            self.base_dir.join("contracts").join(import),
            self.base_dir.join("src").join(import),
        ];
        for candidate in &local {
            if let Some(file) = self.try_load(import, candidate, &mut attempted) {
                return Ok(file);
            }
        }

        match self.external.lookup(import) {
            Ok(path) => {
                if let Some(file) = self.try_load(import, &path, &mut attempted) {
                    return Ok(file);
                }
            }
            Err(tried) => attempted.extend(tried),
        }

        let fs = self.loader.file_system();
        let registry = ctx
            .libraries
            .get_or_insert_with(|| LibraryRegistry::scan(fs.as_ref(), &self.base_dir, &self.extension));
        match registry.get(import).map(Path::to_path_buf) {
            Some(path) => {
                if let Some(file) = self.try_load(import, &path, &mut attempted) {
                    return Ok(file);
                }
            }
            None => attempted.push(format!("library registry entry \"{}\"", import)),
        }

        Err(LocateError {
            import: import.to_string(),
            attempted,
        })
    }

    fn try_load(&self, import: &str, path: &Path, attempted: &mut Vec<String>) -> Option<SourceFile> {
        if !self.loader.file_system().is_file(path) {
            attempted.push(path.display().to_string());
            return None;
        }
        match self.loader.load_one(import, path) {
            Ok(file) => {
                debug!("Located {} at {:?}", import, path);
                Some(file)
            }
            Err(e) => {
                attempted.push(format!("{} ({})", path.display(), e));
                None
            }
        }
    }
}
