use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Short library-style import names mapped to files on disk
///
/// Built by scanning `lib/<library>/src/*.<ext>` at any depth below the
/// base directory. `lib/<library>/src/index.<ext>` answers to `<library>`,
/// every other file to `<library>/<file name>`. Vendored copies of the same
/// library at several depths collapse onto the shortest path.
#[derive(Debug, Default, Clone)]
pub struct LibraryRegistry {
    entries: FxHashMap<String, PathBuf>,
}

impl LibraryRegistry {
    /// Scan `base_dir` for library sources
    pub fn scan(file_system: &dyn FileSystem, base_dir: &Path, extension: &str) -> Self {
        let pattern = format!("**/lib/*/src/*.{}", extension);
        let files = match file_system.find_files(base_dir, &pattern) {
            Ok(files) => files,
            Err(e) => {
                warn!("Library scan under {:?} failed: {}", base_dir, e);
                Vec::new()
            }
        };

        let mut registry = Self::default();
        for file in files {
            if let Some(name) = logical_name(&file) {
                registry.offer(name, file);
            }
        }

        debug!("Library registry holds {} entries", registry.entries.len());
        registry
    }

    fn offer(&mut self, name: String, path: PathBuf) {
        let replace = match self.entries.get(&name) {
            Some(existing) => is_shorter(&path, existing),
            None => true,
        };
        if replace {
            self.entries.insert(name, path);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_shorter(candidate: &Path, existing: &Path) -> bool {
    let (a, b) = (candidate.as_os_str().len(), existing.as_os_str().len());
    a < b || (a == b && candidate < existing)
}

/// `.../lib/<library>/src/<file>` -> `<library>` or `<library>/<file>`
fn logical_name(file: &Path) -> Option<String> {
    let src_dir = file.parent()?;
    let library = src_dir.parent()?.file_name()?.to_str()?;
    let file_name = file.file_name()?.to_str()?;
    let stem = file.file_stem()?.to_str()?;

    if stem == "index" {
        Some(library.to_string())
    } else {
        Some(format!("{}/{}", library, file_name))
    }
}
