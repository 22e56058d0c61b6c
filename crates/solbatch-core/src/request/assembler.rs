use rustc_hash::{FxHashMap, FxHashSet};
use std::iter;
use tracing::debug;

use crate::config::CompilationSettings;
use crate::context::BuildContext;
use crate::resolve::{is_relative, Closures};

use super::{RequestDocument, SourceEntry};

/// Builds the deduplicated compiler request and prunes it to the dirty set
pub struct RequestAssembler {
    language: String,
    settings: CompilationSettings,
}

impl RequestAssembler {
    pub fn new(language: impl Into<String>, settings: CompilationSettings) -> Self {
        Self {
            language: language.into(),
            settings,
        }
    }

    /// Register every target and its closure, one entry per distinct content
    ///
    /// A path whose content is already registered under another path becomes
    /// an alias in `ctx.remaps`. The canonical spelling prefers paths listed
    /// in `requested`, then non-relative spellings; when a later path wins,
    /// the entry moves to it in place and existing aliases are rewritten.
    pub fn assemble(
        &self,
        ctx: &mut BuildContext,
        requested: &[String],
        closures: &Closures,
    ) -> RequestDocument {
        let mut doc = RequestDocument::new(self.language.clone(), &self.settings);
        let requested: FxHashSet<&str> = requested.iter().map(String::as_str).collect();
        // fingerprint -> canonical path
        let mut identities: FxHashMap<String, String> = FxHashMap::default();

        for (target, closure) in closures {
            for path in closure.iter().chain(iter::once(target)) {
                if doc.contains(path) || ctx.remaps.is_alias(path) {
                    continue;
                }
                let Some(file) = ctx.store.get(path) else {
                    continue;
                };

                match identities.get(&file.fingerprint) {
                    None => {
                        identities.insert(file.fingerprint.clone(), path.clone());
                        doc.sources.insert(
                            path.clone(),
                            SourceEntry {
                                keccak256: file.fingerprint.clone(),
                                content: file.content.clone(),
                                urls: Vec::new(),
                            },
                        );
                    }
                    Some(existing) if prefers(path, existing, &requested) => {
                        debug!("{} replaces {} as canonical", path, existing);
                        let existing = existing.clone();
                        if let Some((index, _, entry)) = doc.sources.shift_remove_full(&existing) {
                            doc.sources.shift_insert(index, path.clone(), entry);
                        }
                        ctx.remaps.redirect(&existing, path);
                        identities.insert(file.fingerprint.clone(), path.clone());
                    }
                    Some(existing) => {
                        debug!("{} is an alias of {}", path, existing);
                        ctx.remaps.insert(path.clone(), existing.clone());
                    }
                }
            }
        }

        doc.settings.remappings = ctx.remaps.remappings();
        debug!(
            "Assembled request with {} sources and {} remappings",
            doc.sources.len(),
            doc.settings.remappings.len()
        );
        doc
    }

    /// Drop everything no dirty target needs
    ///
    /// Kept: the canonical of every path in a dirty target's closure and of
    /// the target itself. Remappings are regenerated from the aliases that
    /// are still needed and whose canonical survived.
    pub fn prune(
        &self,
        doc: &mut RequestDocument,
        ctx: &BuildContext,
        dirty: &[String],
        closures: &Closures,
    ) {
        let needed: FxHashSet<&str> = dirty
            .iter()
            .flat_map(|target| {
                closures
                    .get(target)
                    .into_iter()
                    .flatten()
                    .chain(iter::once(target))
            })
            .map(String::as_str)
            .collect();

        let canonical: FxHashSet<&str> = needed.iter().map(|p| ctx.remaps.resolve(p)).collect();

        let before = doc.sources.len();
        doc.sources.retain(|path, _| canonical.contains(path.as_str()));

        let mut surviving = ctx.remaps.clone();
        surviving.retain(|alias, canonical| needed.contains(alias) && doc.contains(canonical));
        doc.settings.remappings = surviving.remappings();

        debug!(
            "Pruned request from {} to {} sources",
            before,
            doc.sources.len()
        );
    }
}

/// Whether `candidate` should replace `existing` as the canonical spelling
fn prefers(candidate: &str, existing: &str, requested: &FxHashSet<&str>) -> bool {
    match (requested.contains(candidate), requested.contains(existing)) {
        (true, false) => true,
        (false, true) => false,
        _ => is_relative(existing) && !is_relative(candidate),
    }
}
