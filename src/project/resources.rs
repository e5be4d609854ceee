//! Optional resource-identifier to symbolic-name mapping.
//!
//! Supplied by the resource collaborator; when present, the renderer
//! substitutes literal numeric resource references with their symbolic names.
//! This is purely a rendering annotation - it has no effect on structuring or
//! typing.

use std::collections::HashMap;

/// Integer-id to symbolic-name mapping (`0x7f040001` → `R.string.app_name`).
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    entries: HashMap<i32, String>,
}

impl ResourceMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one resource entry.
    pub fn insert(&mut self, id: i32, name: impl Into<String>) {
        self.entries.insert(id, name.into());
    }

    /// Returns the symbolic name for an id, if mapped.
    #[must_use]
    pub fn lookup(&self, id: i32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i32, String)> for ResourceMap {
    fn from_iter<T: IntoIterator<Item = (i32, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut map = ResourceMap::new();
        map.insert(0x7f04_0001, "R.string.app_name");
        assert_eq!(map.lookup(0x7f04_0001), Some("R.string.app_name"));
        assert_eq!(map.lookup(42), None);
        assert_eq!(map.len(), 1);
    }
}
