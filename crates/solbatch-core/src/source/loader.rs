use indexmap::IndexMap;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::fs::FileSystem;

use super::SourceFile;

/// How a batch of files is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Independent reads on the rayon pool, joined before returning
    Concurrent,
    /// Sequential reads on the calling thread; never hands work off.
    /// Import discovery uses this so the store is populated before hashing.
    Blocking,
}

/// Text substitution applied to every file as it is loaded
pub trait Substitutions: Send + Sync {
    fn apply(&self, path: &str, content: String) -> String;
}

/// Leaves content untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSubstitutions;

impl Substitutions for NoSubstitutions {
    fn apply(&self, _path: &str, content: String) -> String {
        content
    }
}

/// Ordered literal `pattern -> replacement` pairs
#[derive(Debug, Default, Clone)]
pub struct LiteralSubstitutions {
    pairs: IndexMap<String, String>,
}

impl LiteralSubstitutions {
    pub fn new(pairs: IndexMap<String, String>) -> Self {
        Self { pairs }
    }
}

impl Substitutions for LiteralSubstitutions {
    fn apply(&self, _path: &str, content: String) -> String {
        self.pairs
            .iter()
            .filter(|(pattern, _)| !pattern.is_empty())
            .fold(content, |text, (pattern, replacement)| {
                text.replace(pattern.as_str(), replacement)
            })
    }
}

/// A file to load: the key it will be stored under and where it lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: String,
    pub disk_path: PathBuf,
}

impl LoadRequest {
    pub fn new(key: impl Into<String>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            disk_path: disk_path.into(),
        }
    }
}

/// The single entry point for reading sources into memory
pub struct SourceLoader {
    file_system: Arc<dyn FileSystem>,
    substitutions: Arc<dyn Substitutions>,
}

impl SourceLoader {
    pub fn new(file_system: Arc<dyn FileSystem>, substitutions: Arc<dyn Substitutions>) -> Self {
        Self {
            file_system,
            substitutions,
        }
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Read one file and apply substitutions
    pub fn load_one(&self, key: &str, disk_path: &Path) -> io::Result<SourceFile> {
        debug!("Loading {} from {:?}", key, disk_path);
        let raw = self.file_system.read_file(disk_path)?;
        let content = self.substitutions.apply(key, raw);
        Ok(SourceFile::new(key, content, disk_path))
    }

    /// Read a batch of files; results keep the order of `requests`
    pub fn load(
        &self,
        requests: &[LoadRequest],
        mode: LoadMode,
    ) -> Vec<(LoadRequest, io::Result<SourceFile>)> {
        let load = |request: &LoadRequest| {
            (
                request.clone(),
                self.load_one(&request.key, &request.disk_path),
            )
        };

        match mode {
            LoadMode::Concurrent => requests.par_iter().map(load).collect(),
            LoadMode::Blocking => requests.iter().map(load).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn loader_with(fs: MockFileSystem, substitutions: Arc<dyn Substitutions>) -> SourceLoader {
        SourceLoader::new(Arc::new(fs), substitutions)
    }

    #[test]
    fn test_load_modes_agree() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/A.sol", "contract A {}");
        fs.add_file("/p/B.sol", "contract B {}");
        let loader = loader_with(fs, Arc::new(NoSubstitutions));

        let requests = vec![
            LoadRequest::new("A.sol", "/p/A.sol"),
            LoadRequest::new("B.sol", "/p/B.sol"),
            LoadRequest::new("C.sol", "/p/C.sol"),
        ];

        let concurrent = loader.load(&requests, LoadMode::Concurrent);
        let blocking = loader.load(&requests, LoadMode::Blocking);

        for (a, b) in concurrent.iter().zip(blocking.iter()) {
            assert_eq!(a.0, b.0);
            assert_eq!(a.1.as_ref().ok(), b.1.as_ref().ok());
        }
        assert_eq!(concurrent[1].1.as_ref().unwrap().content, "contract B {}");
        assert!(concurrent[2].1.is_err());
    }

    #[test]
    fn test_literal_substitutions_apply_in_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/A.sol", "address owner = __OWNER__;");
        let mut pairs = IndexMap::new();
        pairs.insert("__OWNER__".to_string(), "__ADMIN__".to_string());
        pairs.insert("__ADMIN__".to_string(), "0x01".to_string());
        let loader = loader_with(fs, Arc::new(LiteralSubstitutions::new(pairs)));

        let file = loader.load_one("A.sol", Path::new("/p/A.sol")).unwrap();

        assert_eq!(file.content, "address owner = 0x01;");
        assert_eq!(file.fingerprint, crate::artifacts::fingerprint("address owner = 0x01;"));
    }
}
