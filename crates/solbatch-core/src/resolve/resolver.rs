use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::debug;

use crate::context::BuildContext;
use crate::errors::{BuildError, Result};
use crate::scan::SourceScanner;

use super::paths::{is_relative, join_import};
use super::Locator;

/// Target path -> its dependency list, in target order
pub type Closures = IndexMap<String, Vec<String>>;

/// Per-run memo of resolved dependency lists
#[derive(Debug, Default)]
pub struct DependencyCache {
    resolved: FxHashMap<String, Vec<String>>,
    /// Resolution chain currently on the stack, outermost first
    visiting: Vec<String>,
}

impl DependencyCache {
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.resolved.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Push `path` on the chain, or return the cycle it would close
    fn enter(&mut self, path: &str) -> std::result::Result<(), Vec<String>> {
        if let Some(start) = self.visiting.iter().position(|p| p == path) {
            let mut cycle = self.visiting[start..].to_vec();
            cycle.push(path.to_string());
            return Err(cycle);
        }
        self.visiting.push(path.to_string());
        Ok(())
    }

    fn leave(&mut self) {
        self.visiting.pop();
    }
}

/// Walks import graphs and memoizes each file's transitive dependencies
pub struct DependencyResolver {
    scanner: Arc<dyn SourceScanner>,
    locator: Arc<Locator>,
}

impl DependencyResolver {
    pub fn new(scanner: Arc<dyn SourceScanner>, locator: Arc<Locator>) -> Self {
        Self { scanner, locator }
    }

    /// Every file `path` transitively imports, excluding itself
    ///
    /// Dependencies come before the files importing them; each path
    /// appears once, at its first discovery. The list is computed once per
    /// run and the caller always receives its own copy.
    pub fn resolve(&self, ctx: &mut BuildContext, path: &str) -> Result<Vec<String>> {
        if let Some(cached) = ctx.dependencies.get(path) {
            return Ok(cached.to_vec());
        }

        ctx.dependencies
            .enter(path)
            .map_err(|cycle| BuildError::DependencyCycle { cycle })?;
        let result = self.resolve_imports(ctx, path);
        ctx.dependencies.leave();

        let dependencies = result?;
        debug!("{} has {} dependencies", path, dependencies.len());
        ctx.dependencies
            .resolved
            .insert(path.to_string(), dependencies.clone());
        Ok(dependencies)
    }

    fn resolve_imports(&self, ctx: &mut BuildContext, path: &str) -> Result<Vec<String>> {
        let imports = match ctx.store.content(path) {
            Some(content) => self.scanner.imports(content),
            None => Vec::new(),
        };

        let mut collected = Vec::new();
        for import in imports {
            let key = if is_relative(&import) {
                join_import(path, &import)
            } else {
                import.clone()
            };

            self.locator
                .locate(ctx, &key)
                .map_err(|source| BuildError::UnresolvedImport {
                    import: import.clone(),
                    importer: path.to_string(),
                    source,
                })?;

            collected.extend(self.resolve(ctx, &key)?);
            collected.push(key);
        }

        let mut seen = FxHashSet::default();
        collected.retain(|p| seen.insert(p.clone()));
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::resolve::SearchPathLookup;
    use crate::scan::RegexScanner;
    use crate::source::{NoSubstitutions, Pool, SourceFile, SourceLoader};
    use std::path::PathBuf;

    fn resolver(fs: Arc<MockFileSystem>) -> DependencyResolver {
        let loader = Arc::new(SourceLoader::new(fs.clone(), Arc::new(NoSubstitutions)));
        let external = Arc::new(SearchPathLookup::new(fs, vec![PathBuf::from("/p/node_modules")]));
        let locator = Arc::new(Locator::new(loader, external, "/p", "sol"));
        DependencyResolver::new(Arc::new(RegexScanner::new()), locator)
    }

    fn primary(ctx: &mut BuildContext, fs: &MockFileSystem, path: &str) {
        let content = fs.contents(format!("/p/{}", path)).unwrap();
        ctx.store
            .insert(SourceFile::new(path, content, format!("/p/{}", path)), Pool::Primary);
    }

    #[test]
    fn test_dependencies_before_dependents() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/contracts/Root.sol", "import \"./Mid.sol\";\ncontract Root {}");
        fs.add_file("/p/contracts/Mid.sol", "import \"./Leaf.sol\";\ncontract Mid {}");
        fs.add_file("/p/contracts/Leaf.sol", "contract Leaf {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "contracts/Root.sol");

        let deps = resolver(fs).resolve(&mut ctx, "contracts/Root.sol").unwrap();

        assert_eq!(deps, vec!["contracts/Leaf.sol", "contracts/Mid.sol"]);
        assert_eq!(ctx.store.pool_of("contracts/Mid.sol"), Some(Pool::Dependency));
    }

    #[test]
    fn test_diamond_is_deduplicated() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file(
            "/p/contracts/Root.sol",
            "import \"./Left.sol\";\nimport \"./Right.sol\";\ncontract Root {}",
        );
        fs.add_file("/p/contracts/Left.sol", "import \"./Base.sol\";\ncontract Left {}");
        fs.add_file("/p/contracts/Right.sol", "import \"./Base.sol\";\ncontract Right {}");
        fs.add_file("/p/contracts/Base.sol", "contract Base {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "contracts/Root.sol");

        let deps = resolver(fs).resolve(&mut ctx, "contracts/Root.sol").unwrap();

        assert_eq!(
            deps,
            vec!["contracts/Base.sol", "contracts/Left.sol", "contracts/Right.sol"]
        );
    }

    #[test]
    fn test_resolution_is_idempotent_and_copies() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "import \"./B.sol\";\ncontract A {}");
        fs.add_file("/p/B.sol", "contract B {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");
        let resolver = resolver(fs);

        let mut first = resolver.resolve(&mut ctx, "A.sol").unwrap();
        first.push("mutated.sol".to_string());
        let second = resolver.resolve(&mut ctx, "A.sol").unwrap();

        assert_eq!(second, vec!["B.sol"]);
        assert_eq!(ctx.dependencies.get("A.sol"), Some(&["B.sol".to_string()][..]));
    }

    #[test]
    fn test_memoized_list_survives_content_change() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "import \"./B.sol\";\ncontract A {}");
        fs.add_file("/p/B.sol", "contract B {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");
        let resolver = resolver(fs);

        resolver.resolve(&mut ctx, "A.sol").unwrap();
        ctx.store
            .insert(SourceFile::new("A.sol", "contract A {}", "/p/A.sol"), Pool::Primary);

        assert_eq!(resolver.resolve(&mut ctx, "A.sol").unwrap(), vec!["B.sol"]);
    }

    #[test]
    fn test_two_file_cycle_is_an_error() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "import \"./B.sol\";\ncontract A {}");
        fs.add_file("/p/B.sol", "import \"./A.sol\";\ncontract B {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");

        let err = resolver(fs).resolve(&mut ctx, "A.sol").unwrap_err();

        match err {
            BuildError::DependencyCycle { cycle } => {
                assert_eq!(cycle, vec!["A.sol", "B.sol", "A.sol"]);
            }
            other => panic!("expected a cycle, got {other}"),
        }
    }

    #[test]
    fn test_self_import_is_a_cycle() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "import \"./A.sol\";\ncontract A {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");

        let err = resolver(fs).resolve(&mut ctx, "A.sol").unwrap_err();
        assert!(matches!(err, BuildError::DependencyCycle { .. }));
    }

    #[test]
    fn test_unresolved_import_names_import_and_importer() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "import \"pkg/Missing.sol\";\ncontract A {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");

        let err = resolver(fs).resolve(&mut ctx, "A.sol").unwrap_err();

        match &err {
            BuildError::UnresolvedImport {
                import,
                importer,
                source,
            } => {
                assert_eq!(import, "pkg/Missing.sol");
                assert_eq!(importer, "A.sol");
                assert!(source
                    .attempted
                    .contains(&"/p/node_modules/pkg/Missing.sol".to_string()));
            }
            other => panic!("expected unresolved import, got {other}"),
        }
        assert!(err.to_string().contains("pkg/Missing.sol"));
    }

    #[test]
    fn test_comment_import_is_followed() {
        // Known limitation of pattern-based extraction.
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/A.sol", "/*\nimport \"./Ghost.sol\";\n*/\ncontract A {}");
        let mut ctx = BuildContext::new();
        primary(&mut ctx, &fs, "A.sol");

        let err = resolver(fs).resolve(&mut ctx, "A.sol").unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedImport { .. }));
    }
}
