use rustc_hash::FxHashSet;
use std::iter;

use crate::context::BuildContext;
use crate::scan::SourceScanner;

/// How flattened bundles are annotated
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Boundary comment; `{path}` is replaced by the file path
    pub boundary_marker: String,
    /// Annotate single-file bundles too
    pub always_annotate: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            boundary_marker: "// File: {path}".to_string(),
            always_annotate: false,
        }
    }
}

/// Concatenate a target's closure and the target into one source text
///
/// Files are taken closure first, deduplicated by canonical path, then
/// stable-sorted by compiler id (files without one keep their place at the
/// end). Import statements are stripped from every file.
pub fn flatten(
    ctx: &BuildContext,
    scanner: &dyn SourceScanner,
    target: &str,
    closure: &[String],
    source_id: impl Fn(&str) -> Option<u32>,
    options: &FlattenOptions,
) -> String {
    let mut seen = FxHashSet::default();
    let mut files: Vec<(&str, Option<u32>)> = closure
        .iter()
        .map(String::as_str)
        .chain(iter::once(target))
        .filter(|path| seen.insert(ctx.remaps.resolve(path).to_string()))
        .map(|path| (path, source_id(ctx.remaps.resolve(path))))
        .collect();
    files.sort_by_key(|(_, id)| id.unwrap_or(u32::MAX));

    let annotate = options.always_annotate || files.len() > 1;
    let mut bundle = String::new();
    for (path, _) in files {
        let Some(content) = ctx
            .store
            .content(path)
            .or_else(|| ctx.store.content(ctx.remaps.resolve(path)))
        else {
            continue;
        };
        let stripped = scanner.strip_imports(content);

        if !bundle.is_empty() {
            bundle.push('\n');
        }
        if annotate {
            bundle.push_str(&options.boundary_marker.replace("{path}", path));
            bundle.push_str("\n\n");
        }
        bundle.push_str(stripped.trim_end());
        bundle.push('\n');
    }
    bundle
}
