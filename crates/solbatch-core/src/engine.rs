//! The build pipeline
//!
//! One [`BuildEngine::run`] loads the requested targets, resolves their
//! import closures, decides what changed since the recorded artifacts,
//! compiles the dirty part in a single compiler invocation and writes the
//! results. All per-run state lives in a fresh [`BuildContext`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifacts::{hash_settings, ArtifactStore, ChangeDetector, Classification};
use crate::compiler::{
    select_compiler, Compiler, CompilerIdentity, CompilerResponse, ContextImports, EmbeddedLoader,
};
use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
use crate::errors::{BuildError, Result};
use crate::fs::{normalize, FileSystem};
use crate::output::{CompileStamp, FlattenOptions, OutputProcessor};
use crate::request::{RequestAssembler, RequestDocument};
use crate::resolve::{Closures, DependencyResolver, Locator, SearchPathLookup};
use crate::scan::{RegexScanner, SourceScanner};
use crate::source::{LiteralSubstitutions, LoadMode, LoadRequest, Pool, SourceLoader};

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Compiled(BuildReport),
    /// Every target matched its recorded artifacts; the compiler was not run
    NothingToDo { unchanged: Vec<String> },
}

impl BuildOutcome {
    pub fn is_nothing_to_do(&self) -> bool {
        matches!(self, BuildOutcome::NothingToDo { .. })
    }
}

/// What a compiling run did
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub compiler: CompilerIdentity,
    /// Targets recompiled, in request order
    pub compiled: Vec<String>,
    /// Targets skipped because they matched their artifacts
    pub unchanged: Vec<String>,
    /// Paths sent to the compiler after pruning
    pub request_sources: Vec<String>,
    pub artifacts: Vec<PathBuf>,
    pub flattened: Vec<PathBuf>,
    /// Non-fatal compiler diagnostics
    pub warnings: Vec<Diagnostic>,
}

pub struct BuildEngine {
    config: Arc<BuildConfig>,
    base_dir: PathBuf,
    file_system: Arc<dyn FileSystem>,
    diagnostics: Arc<dyn DiagnosticHandler>,
    loader: Arc<SourceLoader>,
    locator: Arc<Locator>,
    resolver: DependencyResolver,
    detector: ChangeDetector,
    assembler: RequestAssembler,
    processor: OutputProcessor,
    compiler: Option<Arc<dyn Compiler>>,
    embedded: Option<Arc<dyn EmbeddedLoader>>,
}

impl BuildEngine {
    /// Wire an engine for the project rooted at `base_dir`
    ///
    /// Relative directories in `config` are taken relative to `base_dir`.
    pub fn new(
        config: Arc<BuildConfig>,
        base_dir: impl Into<PathBuf>,
        file_system: Arc<dyn FileSystem>,
        diagnostics: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        let base_dir = base_dir.into();
        let scanner: Arc<dyn SourceScanner> = Arc::new(RegexScanner::new());

        let substitutions = Arc::new(LiteralSubstitutions::new(config.substitutions.clone()));
        let loader = Arc::new(SourceLoader::new(file_system.clone(), substitutions));
        let search_dirs = config
            .search_paths
            .iter()
            .map(|dir| base_dir.join(dir))
            .collect();
        let external = Arc::new(SearchPathLookup::new(file_system.clone(), search_dirs));
        let locator = Arc::new(Locator::new(
            loader.clone(),
            external,
            base_dir.clone(),
            config.source_extension.clone(),
        ));

        let artifacts = Arc::new(ArtifactStore::new(
            file_system.clone(),
            base_dir.join(&config.artifacts_dir),
        ));
        let processor = OutputProcessor::new(
            artifacts.clone(),
            file_system.clone(),
            scanner.clone(),
            base_dir.join(&config.flat_dir),
            config.settings.output_selection.clone(),
            FlattenOptions {
                boundary_marker: config.file_boundary_marker.clone(),
                always_annotate: config.always_annotate,
            },
        );

        Self {
            resolver: DependencyResolver::new(scanner.clone(), locator.clone()),
            detector: ChangeDetector::new(artifacts, scanner),
            assembler: RequestAssembler::new(
                config.compiler.language.clone(),
                config.settings.clone(),
            ),
            processor,
            loader,
            locator,
            config,
            base_dir,
            file_system,
            diagnostics,
            compiler: None,
            embedded: None,
        }
    }

    /// Use `compiler` for every run instead of selecting one per run
    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Make an embedded backend available to compiler selection
    pub fn with_embedded_loader(mut self, loader: Arc<dyn EmbeddedLoader>) -> Self {
        self.embedded = Some(loader);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build `targets`, given relative to the base directory or absolute
    pub fn run(&self, targets: &[String]) -> Result<BuildOutcome> {
        let mut ctx = BuildContext::new();
        let requested = self.target_keys(targets);
        info!("Building {} target(s) in {:?}", requested.len(), self.base_dir);

        self.load_targets(&mut ctx, &requested)?;

        let mut closures = Closures::new();
        for target in &requested {
            let dependencies = self.resolver.resolve(&mut ctx, target)?;
            closures.insert(target.clone(), dependencies);
        }
        info!("Resolved imports: {} file(s) known", ctx.store.len());

        let compiler = self.compiler()?;
        let settings_hash = hash_settings(&self.config.settings, &self.config.compiler.language);

        let mut request = self.assembler.assemble(&mut ctx, &requested, &closures);

        let classification = if self.config.force {
            info!("Forced build, skipping change detection");
            Classification::all_dirty(requested.iter().cloned())
        } else {
            let classification =
                self.detector
                    .classify(&ctx, &closures, compiler.identity(), &settings_hash);
            self.detector.demote(&mut ctx, &classification);
            classification
        };

        if !classification.has_dirty() {
            info!("Nothing to compile");
            return Ok(BuildOutcome::NothingToDo {
                unchanged: classification.unchanged,
            });
        }

        self.assembler
            .prune(&mut request, &ctx, &classification.dirty, &closures);
        self.write_debug_request(&request)?;

        info!(
            "Compiling {} target(s) with {} ({} source(s))",
            classification.dirty.len(),
            compiler.identity(),
            request.sources.len()
        );
        let response = {
            let mut imports = ContextImports::new(&mut ctx, &self.locator);
            compiler.compile(&request, &mut imports)?
        };
        let warnings = self.report_diagnostics(&response)?;

        let stamp = CompileStamp {
            compiler: compiler.identity().clone(),
            settings: serde_json::to_value(&request.settings)?,
            settings_hash,
        };
        let processed = self.processor.process(&ctx, &response, &closures, &stamp)?;

        Ok(BuildOutcome::Compiled(BuildReport {
            compiler: stamp.compiler,
            compiled: processed.compiled,
            unchanged: classification.unchanged,
            request_sources: request.sources.keys().cloned().collect(),
            artifacts: processed.artifacts,
            flattened: processed.flattened,
            warnings,
        }))
    }

    /// Store keys for the requested targets, without duplicates
    fn target_keys(&self, targets: &[String]) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(targets.len());
        for target in targets {
            let path = Path::new(target);
            let key = if path.is_absolute() {
                match normalize(path).strip_prefix(&self.base_dir) {
                    Ok(relative) => path_key(relative),
                    Err(_) => target.clone(),
                }
            } else {
                path_key(path)
            };
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn load_targets(&self, ctx: &mut BuildContext, targets: &[String]) -> Result<()> {
        let requests: Vec<LoadRequest> = targets
            .iter()
            .map(|key| LoadRequest::new(key.clone(), self.base_dir.join(key)))
            .collect();

        for (request, loaded) in self.loader.load(&requests, LoadMode::Concurrent) {
            let file = loaded.map_err(|source| BuildError::TargetNotFound {
                path: request.key.clone(),
                source,
            })?;
            ctx.store.insert(file, Pool::Primary);
        }
        debug!("Loaded {} target(s)", targets.len());
        Ok(())
    }

    fn compiler(&self) -> Result<Arc<dyn Compiler>> {
        match &self.compiler {
            Some(compiler) => Ok(compiler.clone()),
            None => select_compiler(&self.config.compiler, self.embedded.as_deref()),
        }
    }

    fn write_debug_request(&self, request: &RequestDocument) -> Result<()> {
        if let Some(path) = &self.config.debug_request {
            let path = self.base_dir.join(path);
            self.file_system
                .write_file(&path, &request.to_json_pretty()?)?;
            debug!("Wrote compiler request to {:?}", path);
        }
        Ok(())
    }

    /// Forward every compiler diagnostic; fail when any is an error
    fn report_diagnostics(&self, response: &CompilerResponse) -> Result<Vec<Diagnostic>> {
        let diagnostics: Vec<Diagnostic> = response.errors.iter().map(|e| e.to_diagnostic()).collect();

        for diagnostic in &diagnostics {
            if diagnostic.level == DiagnosticLevel::Warning {
                warn!("{}", diagnostic);
            }
            self.diagnostics.report(diagnostic.clone());
        }

        if response.has_errors() {
            return Err(BuildError::Compilation { diagnostics });
        }
        Ok(diagnostics)
    }
}

/// `/`-separated store key for a relative path
fn path_key(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
