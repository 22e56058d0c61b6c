use indexmap::IndexMap;
use serde_json::Value;
use std::iter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactSource, ArtifactStore, BuildArtifact, CompilerRecord};
use crate::compiler::{CompilerIdentity, CompilerResponse};
use crate::config::OutputSelection;
use crate::context::BuildContext;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::resolve::{output_relative, Closures};
use crate::scan::SourceScanner;

use super::{filter_output, flatten, selected_fields, FlattenOptions};

/// What a processing pass wrote
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessReport {
    /// Targets whose output was written
    pub compiled: Vec<String>,
    pub artifacts: Vec<PathBuf>,
    pub flattened: Vec<PathBuf>,
}

/// Settings and compiler a response was produced with
#[derive(Debug, Clone)]
pub struct CompileStamp {
    pub compiler: CompilerIdentity,
    /// Request settings, recorded verbatim in every artifact
    pub settings: Value,
    pub settings_hash: String,
}

/// Turns a compiler response into artifacts and flattened files
pub struct OutputProcessor {
    artifacts: Arc<ArtifactStore>,
    file_system: Arc<dyn FileSystem>,
    scanner: Arc<dyn SourceScanner>,
    flat_dir: PathBuf,
    selection: OutputSelection,
    flatten: FlattenOptions,
}

impl OutputProcessor {
    pub fn new(
        artifacts: Arc<ArtifactStore>,
        file_system: Arc<dyn FileSystem>,
        scanner: Arc<dyn SourceScanner>,
        flat_dir: impl Into<PathBuf>,
        selection: OutputSelection,
        flatten: FlattenOptions,
    ) -> Self {
        Self {
            artifacts,
            file_system,
            scanner,
            flat_dir: flat_dir.into(),
            selection,
            flatten,
        }
    }

    /// Write artifacts and a flattened file for every target still primary
    pub fn process(
        &self,
        ctx: &BuildContext,
        response: &CompilerResponse,
        closures: &Closures,
        stamp: &CompileStamp,
    ) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();

        for (target, closure) in closures {
            if !ctx.store.is_primary(target) {
                continue;
            }
            let canonical = ctx.remaps.resolve(target);
            let sources = self.sources_manifest(ctx, response, target, closure);

            match response
                .contracts
                .get(target.as_str())
                .or_else(|| response.contracts.get(canonical))
            {
                Some(constructs) => {
                    for (name, output) in constructs {
                        let fields = selected_fields(&self.selection, canonical, name);
                        let artifact = BuildArtifact {
                            contract_name: name.clone(),
                            source: target.clone(),
                            compiler_output: filter_output(output, &fields),
                            sources: sources.clone(),
                            compiler: CompilerRecord {
                                name: stamp.compiler.name.clone(),
                                version: stamp.compiler.version.clone(),
                                keccak256: ctx.store.fingerprint(target).unwrap_or_default().to_string(),
                                settings: stamp.settings.clone(),
                                settings_hash: Some(stamp.settings_hash.clone()),
                            },
                        };
                        report.artifacts.push(self.artifacts.save(&artifact)?);
                    }
                }
                None => warn!("Compiler returned no constructs for {}", target),
            }

            let bundle = flatten(
                ctx,
                self.scanner.as_ref(),
                target,
                closure,
                |path| response.source_id(path),
                &self.flatten,
            );
            let flat_path = self.flat_dir.join(output_relative(target));
            self.file_system.write_file(&flat_path, &bundle)?;
            debug!("Wrote flattened {:?}", flat_path);
            report.flattened.push(flat_path);
            report.compiled.push(target.clone());
        }

        info!(
            "Wrote {} artifact(s) and {} flattened file(s)",
            report.artifacts.len(),
            report.flattened.len()
        );
        Ok(report)
    }

    /// Closure + target with fingerprints, ordered by compiler id
    fn sources_manifest(
        &self,
        ctx: &BuildContext,
        response: &CompilerResponse,
        target: &str,
        closure: &[String],
    ) -> IndexMap<String, ArtifactSource> {
        let mut entries: Vec<(String, ArtifactSource)> = closure
            .iter()
            .map(String::as_str)
            .chain(iter::once(target))
            .map(|path| {
                let file = if response.sources.contains_key(path) {
                    path
                } else {
                    ctx.remaps.resolve(path)
                };
                let source = ArtifactSource {
                    keccak256: ctx.store.fingerprint(path).unwrap_or_default().to_string(),
                    file: file.to_string(),
                    id: response.source_id(file),
                };
                (path.to_string(), source)
            })
            .collect();
        entries.sort_by_key(|(_, source)| source.id.unwrap_or(u32::MAX));
        entries.into_iter().collect()
    }
}
