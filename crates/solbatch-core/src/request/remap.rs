use indexmap::IndexMap;

/// Alias path -> canonical path for content reachable under several spellings
///
/// Entries never chain: when a canonical path is replaced, every alias that
/// pointed at it is rewritten in place, so one lookup always lands on a
/// canonical path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RemapTable {
    entries: IndexMap<String, String>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `alias` as another spelling of `canonical`
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        let alias = alias.into();
        let canonical = self.resolve(&canonical.into()).to_string();
        if alias == canonical {
            return;
        }
        for target in self.entries.values_mut() {
            if *target == alias {
                *target = canonical.clone();
            }
        }
        self.entries.insert(alias, canonical);
    }

    /// Replace canonical `old` by `new`; `old` becomes an alias of `new`
    pub fn redirect(&mut self, old: &str, new: &str) {
        self.entries.shift_remove(new);
        for canonical in self.entries.values_mut() {
            if canonical == old {
                *canonical = new.to_string();
            }
        }
        if old != new {
            self.entries.insert(old.to_string(), new.to_string());
        }
    }

    /// Canonical path for `path` (itself when not aliased)
    pub fn resolve<'a>(&'a self, path: &'a str) -> &'a str {
        self.entries.get(path).map(String::as_str).unwrap_or(path)
    }

    /// Canonical target of an alias
    pub fn canonical_of(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn is_alias(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Keep only the entries for which `keep(alias, canonical)` holds
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|alias, canonical| keep(alias, canonical));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    /// `alias=canonical` strings for the compiler settings
    pub fn remappings(&self) -> Vec<String> {
        self.iter()
            .map(|(alias, canonical)| format!("{}={}", alias, canonical))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
