use tracing::debug;

use crate::context::BuildContext;
use crate::resolve::Locator;

use super::ImportCallback;

/// [`ImportCallback`] backed by the run's file store and locator
///
/// Files found this way join the dependency pool like any other import.
pub struct ContextImports<'a> {
    ctx: &'a mut BuildContext,
    locator: &'a Locator,
}

impl<'a> ContextImports<'a> {
    pub fn new(ctx: &'a mut BuildContext, locator: &'a Locator) -> Self {
        Self { ctx, locator }
    }
}

impl ImportCallback for ContextImports<'_> {
    fn find_import(&mut self, path: &str) -> Result<String, String> {
        let canonical = self.ctx.remaps.resolve(path).to_string();
        debug!("Compiler requested {}", canonical);
        self.locator
            .locate(self.ctx, &canonical)
            .map(|file| file.content.clone())
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::resolve::SearchPathLookup;
    use crate::source::{NoSubstitutions, Pool, SourceLoader};
    use std::sync::Arc;

    #[test]
    fn test_find_import_loads_through_locator() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/p/contracts/Late.sol", "contract Late {}");
        let loader = Arc::new(SourceLoader::new(fs.clone(), Arc::new(NoSubstitutions)));
        let external = Arc::new(SearchPathLookup::new(fs, Vec::new()));
        let locator = Locator::new(loader, external, "/p", "sol");
        let mut ctx = BuildContext::new();

        {
            let mut imports = ContextImports::new(&mut ctx, &locator);
            assert_eq!(imports.find_import("Late.sol").unwrap(), "contract Late {}");
            assert!(imports.find_import("Missing.sol").unwrap_err().contains("Missing.sol"));
        }
        assert_eq!(ctx.store.pool_of("Late.sol"), Some(Pool::Dependency));
    }
}
