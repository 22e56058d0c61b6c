//! Output selection filtering
//!
//! Compilers return more than was asked for (assembly listings, opcodes,
//! syntax trees). Everything outside the requested selection is removed
//! before an artifact is written.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::config::OutputSelection;

const WILDCARD: &str = "*";

/// Requested fields for one construct
///
/// Fields listed under the file (or `"*"`) and under the construct name (or
/// `"*"`) are combined; duplicates are dropped.
pub fn selected_fields(selection: &OutputSelection, file: &str, construct: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for per_file in [selection.get(file), selection.get(WILDCARD)].into_iter().flatten() {
        for listed in [per_file.get(construct), per_file.get(WILDCARD)].into_iter().flatten() {
            for field in listed {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
    }
    fields
}

/// Dotted field paths as a tree; a terminal node selects everything below it
#[derive(Debug, Default)]
struct SelectionTree {
    everything: bool,
    children: IndexMap<String, SelectionTree>,
}

impl SelectionTree {
    fn build(fields: &[String]) -> Self {
        let mut root = Self::default();
        for field in fields {
            root.add(field.split('.').filter(|segment| !segment.is_empty()));
        }
        root
    }

    fn add<'a>(&mut self, mut segments: impl Iterator<Item = &'a str>) {
        if self.everything {
            return;
        }
        match segments.next() {
            None => {
                self.everything = true;
                self.children.clear();
            }
            Some(WILDCARD) => {
                self.everything = true;
                self.children.clear();
            }
            Some(segment) => self
                .children
                .entry(segment.to_string())
                .or_default()
                .add(segments),
        }
    }

    fn apply(&self, value: &Value) -> Value {
        if self.everything {
            return value.clone();
        }
        match value {
            Value::Object(object) => {
                let mut kept = Map::new();
                for (key, child) in &self.children {
                    if let Some(inner) = object.get(key) {
                        kept.insert(key.clone(), child.apply(inner));
                    }
                }
                Value::Object(kept)
            }
            // Selected through an ancestor prefix, nothing left to narrow
            other => other.clone(),
        }
    }
}

/// Keep only the parts of a construct's output named by `fields`
pub fn filter_output(output: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return Value::Object(Map::new());
    }
    SelectionTree::build(fields).apply(output)
}
