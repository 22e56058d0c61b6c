use std::path::{Component, Path, PathBuf};

use crate::fs::FileSystem;

/// Whether an import is spelled relative to the importing file
pub fn is_relative(import: &str) -> bool {
    import.starts_with("./") || import.starts_with("../")
}

/// Join a relative import against the importing file's directory
///
/// The result is the key the compiler's own import callback would ask for:
/// `.` segments vanish, `..` folds into the previous segment, and leading
/// `..` segments that cannot fold are kept. An importer spelled with a
/// leading `./` keeps that prefix, an absolute importer keeps its root.
pub fn join_import(importer: &str, import: &str) -> String {
    let dir = match importer.rfind('/') {
        Some(index) => &importer[..index],
        None => "",
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(import.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if importer.starts_with('/') {
        format!("/{}", joined)
    } else if importer.starts_with("./") && !joined.starts_with("../") {
        format!("./{}", joined)
    } else {
        joined
    }
}

/// Nearest ancestor of `start` (inclusive) holding `manifest`, else `start`
pub fn find_project_root(file_system: &dyn FileSystem, start: &Path, manifest: &str) -> PathBuf {
    start
        .ancestors()
        .find(|dir| file_system.is_file(&dir.join(manifest)))
        .unwrap_or(start)
        .to_path_buf()
}

/// Path of a key below an output directory, with root and traversal removed
///
/// `../lib/A.sol` and `/abs/A.sol` become `lib/A.sol` and `abs/A.sol`.
pub fn output_relative(key: &str) -> PathBuf {
    Path::new(key)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
