use std::iter;
use std::sync::Arc;
use tracing::{debug, info};

use crate::compiler::CompilerIdentity;
use crate::context::BuildContext;
use crate::resolve::Closures;
use crate::scan::SourceScanner;

use super::{ArtifactStore, BuildArtifact};

/// Primary targets split by whether they need recompiling
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub dirty: Vec<String>,
    pub unchanged: Vec<String>,
}

impl Classification {
    /// Every target dirty, e.g. for a forced build
    pub fn all_dirty(targets: impl IntoIterator<Item = String>) -> Self {
        Self {
            dirty: targets.into_iter().collect(),
            unchanged: Vec::new(),
        }
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

/// Compares fresh fingerprints with the ones recorded in artifacts
///
/// Only the artifact of a target's first declared construct is inspected;
/// constructs of one file are assumed to share closure, compiler version
/// and file fingerprint.
pub struct ChangeDetector {
    artifacts: Arc<ArtifactStore>,
    scanner: Arc<dyn SourceScanner>,
}

impl ChangeDetector {
    pub fn new(artifacts: Arc<ArtifactStore>, scanner: Arc<dyn SourceScanner>) -> Self {
        Self { artifacts, scanner }
    }

    /// Classify every primary target of `closures`
    pub fn classify(
        &self,
        ctx: &BuildContext,
        closures: &Closures,
        compiler: &CompilerIdentity,
        settings_hash: &str,
    ) -> Classification {
        let mut classification = Classification::default();

        for (target, closure) in closures {
            if !ctx.store.is_primary(target) {
                continue;
            }
            match self.check(ctx, target, closure, compiler, settings_hash) {
                Ok(()) => {
                    debug!("{} is unchanged", target);
                    classification.unchanged.push(target.clone());
                }
                Err(reason) => {
                    debug!("{} is dirty: {}", target, reason);
                    classification.dirty.push(target.clone());
                }
            }
        }

        info!(
            "{} target(s) dirty, {} unchanged",
            classification.dirty.len(),
            classification.unchanged.len()
        );
        classification
    }

    /// Move unchanged targets out of the primary pool
    pub fn demote(&self, ctx: &mut BuildContext, classification: &Classification) {
        for target in &classification.unchanged {
            ctx.store.demote(target);
        }
    }

    /// `Ok` when the recorded artifact still matches, else why not
    fn check(
        &self,
        ctx: &BuildContext,
        target: &str,
        closure: &[String],
        compiler: &CompilerIdentity,
        settings_hash: &str,
    ) -> Result<(), String> {
        let content = ctx.store.content(target).ok_or("not loaded")?;
        let declarations = self.scanner.declarations(content);
        let first = declarations.first().ok_or("declares no construct")?;
        let artifact = self
            .artifacts
            .load(first)
            .ok_or_else(|| format!("no artifact for {}", first))?;

        if artifact.compiler.version != compiler.version {
            return Err(format!(
                "compiled with {}, now {}",
                artifact.compiler.version, compiler.version
            ));
        }
        if let Some(recorded) = &artifact.compiler.settings_hash {
            if recorded != settings_hash {
                return Err("compilation settings changed".to_string());
            }
        }
        if artifact.sources.len() != closure.len() + 1 {
            return Err(format!(
                "closure has {} files, artifact records {}",
                closure.len() + 1,
                artifact.sources.len()
            ));
        }

        for path in closure.iter().map(String::as_str).chain(iter::once(target)) {
            check_fingerprint(ctx, &artifact, path)?;
        }
        Ok(())
    }
}

fn check_fingerprint(ctx: &BuildContext, artifact: &BuildArtifact, path: &str) -> Result<(), String> {
    let fresh = ctx
        .store
        .fingerprint(path)
        .ok_or_else(|| format!("{} is not loaded", path))?;
    let recorded = artifact
        .recorded_fingerprint(path, ctx.remaps.canonical_of(path))
        .ok_or_else(|| format!("{} is not recorded", path))?;
    if fresh == recorded {
        Ok(())
    } else {
        Err(format!("{} changed", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{fingerprint, ArtifactSource, CompilerRecord};
    use crate::fs::MockFileSystem;
    use crate::scan::RegexScanner;
    use crate::source::{Pool, SourceFile};
    use indexmap::IndexMap;
    use serde_json::json;

    const ROOT: &str = "import \"./Lib.sol\";\ncontract Root {}\n";
    const LIB: &str = "library Lib {}\n";

    fn detector(fs: Arc<MockFileSystem>) -> (ChangeDetector, Arc<ArtifactStore>) {
        let store = Arc::new(ArtifactStore::new(fs, "/p/build/contracts"));
        (
            ChangeDetector::new(store.clone(), Arc::new(RegexScanner::new())),
            store,
        )
    }

    fn context(root: &str, lib: &str) -> BuildContext {
        let mut ctx = BuildContext::new();
        ctx.store.insert(
            SourceFile::new("contracts/Root.sol", root, "/p/contracts/Root.sol"),
            Pool::Primary,
        );
        ctx.store.insert(
            SourceFile::new("contracts/Lib.sol", lib, "/p/contracts/Lib.sol"),
            Pool::Dependency,
        );
        ctx
    }

    fn closures() -> Closures {
        let mut closures = IndexMap::new();
        closures.insert(
            "contracts/Root.sol".to_string(),
            vec!["contracts/Lib.sol".to_string()],
        );
        closures
    }

    fn record(store: &ArtifactStore, version: &str, settings_hash: Option<&str>) {
        let mut sources = IndexMap::new();
        for (id, (path, content)) in [("contracts/Lib.sol", LIB), ("contracts/Root.sol", ROOT)]
            .into_iter()
            .enumerate()
        {
            sources.insert(
                path.to_string(),
                ArtifactSource {
                    keccak256: fingerprint(content),
                    file: path.to_string(),
                    id: Some(id as u32),
                },
            );
        }
        store
            .save(&BuildArtifact {
                contract_name: "Root".to_string(),
                source: "contracts/Root.sol".to_string(),
                compiler_output: json!({"abi": []}),
                sources,
                compiler: CompilerRecord {
                    name: "solc".to_string(),
                    version: version.to_string(),
                    keccak256: fingerprint(ROOT),
                    settings: json!({}),
                    settings_hash: settings_hash.map(str::to_string),
                },
            })
            .unwrap();
    }

    fn solc() -> CompilerIdentity {
        CompilerIdentity::new("solc", "0.8.19")
    }

    #[test]
    fn test_missing_artifact_is_dirty() {
        let (detector, _) = detector(Arc::new(MockFileSystem::new()));
        let ctx = context(ROOT, LIB);

        let result = detector.classify(&ctx, &closures(), &solc(), "h");
        assert_eq!(result.dirty, vec!["contracts/Root.sol"]);
    }

    #[test]
    fn test_matching_artifact_is_unchanged_and_demoted() {
        let (detector, store) = detector(Arc::new(MockFileSystem::new()));
        record(&store, "0.8.19", Some("h"));
        let mut ctx = context(ROOT, LIB);

        let result = detector.classify(&ctx, &closures(), &solc(), "h");
        assert_eq!(result.unchanged, vec!["contracts/Root.sol"]);
        assert!(!result.has_dirty());

        detector.demote(&mut ctx, &result);
        assert_eq!(ctx.store.pool_of("contracts/Root.sol"), Some(Pool::Dependency));
    }

    #[test]
    fn test_dependency_change_dirties_target() {
        let (detector, store) = detector(Arc::new(MockFileSystem::new()));
        record(&store, "0.8.19", Some("h"));
        let ctx = context(ROOT, "library Lib { }\n");

        let result = detector.classify(&ctx, &closures(), &solc(), "h");
        assert_eq!(result.dirty, vec!["contracts/Root.sol"]);
    }

    #[test]
    fn test_version_and_settings_mismatch() {
        let (detector, store) = detector(Arc::new(MockFileSystem::new()));
        record(&store, "0.8.18", Some("h"));
        let ctx = context(ROOT, LIB);
        assert!(detector.classify(&ctx, &closures(), &solc(), "h").has_dirty());

        record(&store, "0.8.19", Some("old"));
        assert!(detector.classify(&ctx, &closures(), &solc(), "h").has_dirty());

        record(&store, "0.8.19", None);
        assert!(!detector.classify(&ctx, &closures(), &solc(), "h").has_dirty());
    }

    #[test]
    fn test_closure_size_mismatch() {
        let (detector, store) = detector(Arc::new(MockFileSystem::new()));
        record(&store, "0.8.19", Some("h"));
        let ctx = context(ROOT, LIB);
        let mut closures = closures();
        closures["contracts/Root.sol"].clear();

        assert!(detector.classify(&ctx, &closures, &solc(), "h").has_dirty());
    }

    #[test]
    fn test_aliased_path_uses_canonical_record() {
        let (detector, store) = detector(Arc::new(MockFileSystem::new()));
        record(&store, "0.8.19", Some("h"));
        let mut ctx = context(ROOT, LIB);
        ctx.store.insert(
            SourceFile::new("pkg/Lib.sol", LIB, "/p/node_modules/pkg/Lib.sol"),
            Pool::Dependency,
        );
        ctx.remaps.insert("pkg/Lib.sol", "contracts/Lib.sol");
        let mut closures = closures();
        closures["contracts/Root.sol"] = vec!["pkg/Lib.sol".to_string()];

        let result = detector.classify(&ctx, &closures, &solc(), "h");
        assert_eq!(result.unchanged, vec!["contracts/Root.sol"]);
    }

    #[test]
    fn test_file_without_constructs_is_always_dirty() {
        let (detector, _) = detector(Arc::new(MockFileSystem::new()));
        let mut ctx = BuildContext::new();
        ctx.store.insert(
            SourceFile::new("contracts/Consts.sol", "uint constant X = 1;", "/p/contracts/Consts.sol"),
            Pool::Primary,
        );
        let mut closures = IndexMap::new();
        closures.insert("contracts/Consts.sol".to_string(), Vec::new());

        let result = detector.classify(&ctx, &closures, &solc(), "h");
        assert_eq!(result.dirty, vec!["contracts/Consts.sol"]);
    }

    #[test]
    fn test_corrupt_artifact_is_dirty() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/build/contracts/Root.json", "{ truncated");
        let (detector, _) = detector(fs);
        let ctx = context(ROOT, LIB);

        assert!(detector.classify(&ctx, &closures(), &solc(), "h").has_dirty());
    }
}
