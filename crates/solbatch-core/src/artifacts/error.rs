use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted artifact file {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
