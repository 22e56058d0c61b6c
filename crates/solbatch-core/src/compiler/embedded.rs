use std::sync::Arc;
use tracing::debug;

use crate::request::RequestDocument;

use super::{Compiler, CompilerIdentity, CompilerResponse, ImportCallback, InvocationError};

/// An in-process compiler taking and returning standard JSON text
pub trait EmbeddedBackend: Send + Sync {
    fn version(&self) -> &str;

    /// Compile a standard JSON input document into an output document
    ///
    /// `imports` answers for sources the input does not carry.
    fn compile_json(&self, input: &str, imports: &mut dyn ImportCallback) -> Result<String, String>;
}

/// Loads an embedded backend on demand
pub trait EmbeddedLoader: Send + Sync {
    /// A backend for `version` (any version when `None`)
    fn load(&self, version: Option<&str>) -> Result<Arc<dyn EmbeddedBackend>, String>;
}

/// [`Compiler`] over an [`EmbeddedBackend`]
pub struct EmbeddedCompiler {
    backend: Arc<dyn EmbeddedBackend>,
    identity: CompilerIdentity,
}

impl EmbeddedCompiler {
    pub fn new(backend: Arc<dyn EmbeddedBackend>) -> Self {
        let identity = CompilerIdentity::new("solc-embedded", backend.version());
        Self { backend, identity }
    }
}

impl Compiler for EmbeddedCompiler {
    fn identity(&self) -> &CompilerIdentity {
        &self.identity
    }

    fn compile(
        &self,
        request: &RequestDocument,
        imports: &mut dyn ImportCallback,
    ) -> Result<CompilerResponse, InvocationError> {
        let input = serde_json::to_string(request).map_err(|e| InvocationError::Protocol(e.to_string()))?;
        debug!("Embedded compile of {} sources", request.sources.len());

        let output = self
            .backend
            .compile_json(&input, imports)
            .map_err(InvocationError::Backend)?;

        CompilerResponse::from_json(&output).map_err(|e| InvocationError::Protocol(e.to_string()))
    }
}
