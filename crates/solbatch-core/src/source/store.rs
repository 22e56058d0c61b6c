use indexmap::IndexMap;
use std::path::PathBuf;

use crate::artifacts::fingerprint;

/// Pool a loaded file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Directly requested build target
    Primary,
    /// Pulled in through imports, or a target proven unchanged
    Dependency,
}

/// A loaded source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Key the file is known under (import spelling or target path)
    pub path: String,

    /// Text after substitutions
    pub content: String,

    /// Keccak-256 of `content`
    pub fingerprint: String,

    /// Where the content was read from
    pub origin: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>, origin: impl Into<PathBuf>) -> Self {
        let content = content.into();
        let fingerprint = fingerprint(&content);
        Self {
            path: path.into(),
            content,
            fingerprint,
            origin: origin.into(),
        }
    }
}

/// Current content of every file the run knows about
///
/// The two pools are disjoint: inserting a path into one pool removes it
/// from the other.
#[derive(Debug, Default)]
pub struct FileStore {
    primary: IndexMap<String, SourceFile>,
    dependency: IndexMap<String, SourceFile>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: SourceFile, pool: Pool) {
        let key = file.path.clone();
        match pool {
            Pool::Primary => {
                self.dependency.shift_remove(&key);
                self.primary.insert(key, file);
            }
            Pool::Dependency => {
                self.primary.shift_remove(&key);
                self.dependency.insert(key, file);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&SourceFile> {
        self.primary.get(path).or_else(|| self.dependency.get(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.primary.contains_key(path) || self.dependency.contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<&str> {
        self.get(path).map(|f| f.content.as_str())
    }

    pub fn fingerprint(&self, path: &str) -> Option<&str> {
        self.get(path).map(|f| f.fingerprint.as_str())
    }

    pub fn pool_of(&self, path: &str) -> Option<Pool> {
        if self.primary.contains_key(path) {
            Some(Pool::Primary)
        } else if self.dependency.contains_key(path) {
            Some(Pool::Dependency)
        } else {
            None
        }
    }

    /// Move a primary file into the dependency pool
    ///
    /// Returns `false` when the path is not a primary file.
    pub fn demote(&mut self, path: &str) -> bool {
        match self.primary.shift_remove(path) {
            Some(file) => {
                self.dependency.insert(path.to_string(), file);
                true
            }
            None => false,
        }
    }

    /// Primary paths in load order
    pub fn primary_paths(&self) -> Vec<String> {
        self.primary.keys().cloned().collect()
    }

    pub fn is_primary(&self, path: &str) -> bool {
        self.primary.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.dependency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
