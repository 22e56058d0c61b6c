use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fs::FileSystem;

use super::{ArtifactError, BuildArtifact, Result, ARTIFACT_EXTENSION};

/// Reads and writes per-construct artifacts under one directory
pub struct ArtifactStore {
    file_system: Arc<dyn FileSystem>,

    /// Directory holding `<Construct>.json` files
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `artifacts_dir`
    pub fn new(file_system: Arc<dyn FileSystem>, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            file_system,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Artifact file for a construct name
    pub fn path_for(&self, contract_name: &str) -> PathBuf {
        self.artifacts_dir
            .join(format!("{}.{}", contract_name, ARTIFACT_EXTENSION))
    }

    /// Load the artifact recorded for a construct
    ///
    /// A missing artifact is `None`. An unreadable or corrupted one is
    /// logged and also reported as a miss, so the construct gets rebuilt.
    pub fn load(&self, contract_name: &str) -> Option<BuildArtifact> {
        let path = self.path_for(contract_name);
        if !self.file_system.is_file(&path) {
            debug!("No artifact for {}", contract_name);
            return None;
        }

        match self.load_strict(contract_name) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Write an artifact, replacing any previous one for the same construct
    pub fn save(&self, artifact: &BuildArtifact) -> Result<PathBuf> {
        let path = self.path_for(&artifact.contract_name);
        let json = artifact.to_json()?;
        self.file_system
            .write_file(&path, &json)
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Wrote artifact {:?}", path);
        Ok(path)
    }

    /// Load an artifact that must exist and parse
    pub fn load_strict(&self, contract_name: &str) -> Result<BuildArtifact> {
        let path = self.path_for(contract_name);
        let json = self
            .file_system
            .read_file(&path)
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        BuildArtifact::from_json(&json).map_err(|e| ArtifactError::Corrupted {
            path,
            reason: e.to_string(),
        })
    }
}
