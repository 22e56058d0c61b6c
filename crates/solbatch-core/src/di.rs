use crate::compiler::{Compiler, EmbeddedLoader};
use crate::config::BuildConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, DiagnosticHandler};
use crate::engine::BuildEngine;
use crate::fs::{FileSystem, RealFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Dependency injection container
/// Manages all shared dependencies and creates engines with proper wiring
pub struct Container {
    config: Arc<BuildConfig>,
    base_dir: PathBuf,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    file_system: Arc<dyn FileSystem>,
    embedded_loader: Option<Arc<dyn EmbeddedLoader>>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: BuildConfig, base_dir: impl Into<PathBuf>, pretty: bool) -> Self {
        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(pretty));
        let file_system = Arc::new(RealFileSystem::new());

        Container {
            config: Arc::new(config),
            base_dir: base_dir.into(),
            diagnostic_handler,
            file_system,
            embedded_loader: None,
        }
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: BuildConfig,
        base_dir: impl Into<PathBuf>,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            base_dir: base_dir.into(),
            diagnostic_handler,
            file_system,
            embedded_loader: None,
        }
    }

    /// Offer an embedded compiler to engines built from here on
    pub fn with_embedded_loader(mut self, loader: Arc<dyn EmbeddedLoader>) -> Self {
        self.embedded_loader = Some(loader);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<BuildConfig> {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the diagnostic handler
    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Get the file system
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Engine that selects its compiler from the configuration on every run
    pub fn build_engine(&self) -> BuildEngine {
        let engine = BuildEngine::new(
            self.config.clone(),
            self.base_dir.clone(),
            self.file_system.clone(),
            self.diagnostic_handler.clone(),
        );
        match &self.embedded_loader {
            Some(loader) => engine.with_embedded_loader(loader.clone()),
            None => engine,
        }
    }

    /// Engine bound to a specific compiler
    pub fn build_engine_with(&self, compiler: Arc<dyn Compiler>) -> BuildEngine {
        self.build_engine().with_compiler(compiler)
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }

    /// Get the warning count
    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }
}
