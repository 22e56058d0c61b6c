//! File system abstraction
//!
//! Every disk access of the engine goes through [`FileSystem`] so that the
//! resolver, the change detector and the output processor can be exercised
//! against an in-memory [`MockFileSystem`] in tests.

use glob::{MatchOptions, Pattern};
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

/// Trait for file system operations
pub trait FileSystem: Send + Sync {
    /// Read a file as UTF-8 text
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Write a file, creating missing parent directories
    fn write_file(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Whether a regular file exists at `path`
    fn is_file(&self, path: &Path) -> bool;

    /// Find files under `root` whose root-relative path matches `pattern`.
    ///
    /// `*` never crosses a path separator, `**` spans any number of
    /// directories (including none).
    fn find_files(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;
}

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn invalid_pattern(err: glob::PatternError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
}

/// File system backed by the real disk
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn find_files(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let full = root.join(pattern);
        let entries = glob::glob_with(&full.to_string_lossy(), match_options())
            .map_err(invalid_pattern)?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| e.into_error())?;
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}

/// In-memory file system for tests
///
/// Paths are normalized lexically (`.` dropped, `..` folded) so that
/// `/project/contracts/../lib/A.sol` and `/project/lib/A.sol` name the
/// same entry.
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(normalize(path.as_ref()), content.into());
    }

    /// Remove a file if present
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(&normalize(path.as_ref()));
    }

    /// Current content of a file, if any
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(&normalize(path.as_ref())).cloned()
    }

    /// Every stored path, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.keys().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.contents(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.add_file(path, content);
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        self.contents(path).is_some()
    }

    fn find_files(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern = Pattern::new(pattern).map_err(invalid_pattern)?;
        let root = normalize(root);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());

        Ok(files
            .keys()
            .filter(|path| {
                path.strip_prefix(&root)
                    .map(|rel| pattern.matches_path_with(rel, match_options()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

/// Lexically normalize a path without touching the disk
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
