//! Compiler protocol and backends
//!
//! The engine talks to a compiler through [`Compiler`] only. Two backends
//! exist: [`ProcessCompiler`] runs an executable speaking standard JSON on
//! stdin/stdout, [`EmbeddedCompiler`] wraps an in-process
//! [`EmbeddedBackend`]. [`select_compiler`] picks one per configuration.

mod embedded;
mod imports;
mod process;
mod response;
mod select;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::request::RequestDocument;

pub use embedded::{EmbeddedBackend, EmbeddedCompiler, EmbeddedLoader};
pub use imports::ContextImports;
pub use process::ProcessCompiler;
pub use response::{CompilerResponse, ResponseError, SourceOutput};
pub use select::select_compiler;

/// Name and full version string of a compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerIdentity {
    pub name: String,
    pub version: String,
}

impl CompilerIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Whether this version satisfies a requested version prefix
    pub fn matches(&self, requested: Option<&str>) -> bool {
        match requested {
            None => true,
            Some(prefix) => self
                .version
                .trim_start_matches('v')
                .starts_with(prefix.trim_start_matches('v')),
        }
    }
}

impl fmt::Display for CompilerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Answers the compiler's requests for sources missing from the request
pub trait ImportCallback {
    /// Content of `path`, or a message saying why it is unavailable
    fn find_import(&mut self, path: &str) -> Result<String, String>;
}

/// A compiler speaking the standard JSON protocol
pub trait Compiler: Send + Sync {
    fn identity(&self) -> &CompilerIdentity;

    /// Compile one request; diagnostics come back inside the response
    fn compile(
        &self,
        request: &RequestDocument,
        imports: &mut dyn ImportCallback,
    ) -> Result<CompilerResponse, InvocationError>;
}

/// The compiler could not be run or its output could not be read
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Failed to start {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler exited with {status}: {stderr}")]
    Exited { status: String, stderr: String },

    #[error("Malformed compiler output: {0}")]
    Protocol(String),

    #[error("Compiler backend failed: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_matches_prefix() {
        let identity = CompilerIdentity::new("solc", "0.8.19+commit.7dd6d404");
        assert!(identity.matches(None));
        assert!(identity.matches(Some("0.8")));
        assert!(identity.matches(Some("v0.8.19")));
        assert!(!identity.matches(Some("0.8.2")));
        assert!(!identity.matches(Some("0.7")));
    }
}
