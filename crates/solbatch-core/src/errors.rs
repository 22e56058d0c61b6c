use crate::artifacts::ArtifactError;
use crate::compiler::InvocationError;
use crate::diagnostics::Diagnostic;
use crate::resolve::LocateError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of a build run
///
/// "Nothing to do" is not an error: it is reported as
/// [`crate::engine::BuildOutcome::NothingToDo`].
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Target not found: {path}: {source}")]
    TargetNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not resolve import \"{import}\" from {importer}: {source}")]
    UnresolvedImport {
        import: String,
        importer: String,
        #[source]
        source: LocateError,
    },

    #[error("Dependency cycle detected: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<String> },

    #[error("No usable compiler{}: {reason}", .version.as_deref().map(|v| format!(" for version {v}")).unwrap_or_default())]
    CompilerUnavailable {
        version: Option<String>,
        reason: String,
    },

    #[error("Compiler invocation failed: {0}")]
    CompilerInvocation(#[from] InvocationError),

    #[error("Compilation failed with {} error(s)", .diagnostics.iter().filter(|d| d.is_error()).count())]
    Compilation { diagnostics: Vec<Diagnostic> },

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    /// Diagnostics carried by the error, if any
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            BuildError::Compilation { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
