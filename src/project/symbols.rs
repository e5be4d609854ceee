//! Read-mostly symbol table shared by all decompilation tasks.
//!
//! The symbol table is populated from ingestion output before parallel
//! decompilation begins and is immutable afterwards, so concurrent readers
//! need no locking. The only mutable state is the memoized common-supertype
//! cache, which uses a concurrent map.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::ir::{JavaType, TypeMerge, Unit, UnitName};

/// Hierarchy metadata for one known unit.
#[derive(Debug, Clone)]
pub struct UnitMeta {
    /// Qualified class name.
    pub name: UnitName,
    /// Superclass name; `None` only for `java.lang.Object`.
    pub superclass: Option<UnitName>,
    /// Implemented interface names.
    pub interfaces: Vec<UnitName>,
}

/// Resolved class/method/field metadata for the whole input.
///
/// # Concurrency
///
/// Populate through [`register`](Self::register) / [`add_units`](Self::add_units)
/// during ingestion, then share `&SymbolTable` across worker tasks. Lookups
/// never mutate the unit map; the supertype cache is safe for concurrent use.
#[derive(Debug, Default)]
pub struct SymbolTable {
    units: HashMap<UnitName, UnitMeta>,
    supertype_cache: DashMap<(UnitName, UnitName), UnitName>,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers hierarchy metadata for one unit.
    pub fn register(&mut self, meta: UnitMeta) {
        self.units.insert(meta.name.clone(), meta);
    }

    /// Registers hierarchy metadata for a batch of IR units.
    pub fn add_units(&mut self, units: &[Unit]) {
        for unit in units {
            self.register(UnitMeta {
                name: unit.name().clone(),
                superclass: unit.superclass().cloned(),
                interfaces: unit.interfaces().to_vec(),
            });
        }
    }

    /// Returns `true` if the unit is known.
    #[must_use]
    pub fn contains(&self, name: &UnitName) -> bool {
        self.units.contains_key(name)
    }

    /// Returns the metadata for a unit, if known.
    #[must_use]
    pub fn meta(&self, name: &UnitName) -> Option<&UnitMeta> {
        self.units.get(name)
    }

    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if no units are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Walks the superclass chain from `name` up to `java.lang.Object`.
    ///
    /// Unknown classes terminate the chain at `java.lang.Object`. The walk is
    /// depth-capped so cyclic hierarchy metadata (corrupt input) cannot hang.
    #[must_use]
    pub fn superclass_chain(&self, name: &UnitName) -> Vec<UnitName> {
        let object = UnitName::object();
        let mut chain = vec![name.clone()];
        let mut current = name.clone();
        for _ in 0..64 {
            if current == object {
                return chain;
            }
            match self.units.get(&current).and_then(|m| m.superclass.clone()) {
                Some(superclass) => {
                    chain.push(superclass.clone());
                    current = superclass;
                }
                None => break,
            }
        }
        if chain.last() != Some(&object) {
            chain.push(object);
        }
        chain
    }

    /// Returns `true` if `sup` is `sub` or one of its superclasses.
    #[must_use]
    pub fn is_assignable(&self, sup: &UnitName, sub: &UnitName) -> bool {
        self.superclass_chain(sub).contains(sup)
    }

    /// Computes the nearest common supertype of two classes.
    ///
    /// Results are memoized; unknown classes resolve to `java.lang.Object`.
    #[must_use]
    pub fn common_supertype(&self, a: &UnitName, b: &UnitName) -> UnitName {
        if a == b {
            return a.clone();
        }
        let key = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        if let Some(cached) = self.supertype_cache.get(&key) {
            return cached.clone();
        }

        let chain_a = self.superclass_chain(a);
        let chain_b = self.superclass_chain(b);
        let result = chain_a
            .iter()
            .find(|candidate| chain_b.contains(candidate))
            .cloned()
            .unwrap_or_else(UnitName::object);

        self.supertype_cache.insert(key, result.clone());
        result
    }

    /// Merges two types, resolving object/object conflicts through the
    /// hierarchy.
    ///
    /// A subtype relationship merges cleanly to the subtype's most specific
    /// common ancestor; unrelated classes report a conflict carrying their
    /// common supertype so the caller attaches a warning and degrades.
    #[must_use]
    pub fn merge_types(&self, a: &JavaType, b: &JavaType) -> TypeMerge {
        match a.merge(b) {
            TypeMerge::Conflict(_) => {
                if let (JavaType::Object(na), JavaType::Object(nb)) = (a, b) {
                    let common = self.common_supertype(na, nb);
                    if common == *na || common == *nb {
                        // One side is a supertype of the other
                        TypeMerge::Merged(JavaType::Object(common))
                    } else {
                        TypeMerge::Conflict(JavaType::Object(common))
                    }
                } else {
                    a.merge(b)
                }
            }
            merged => merged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let mut symbols = SymbolTable::new();
        for (name, superclass) in [
            ("java.lang.Exception", Some("java.lang.Throwable")),
            ("java.lang.Throwable", Some("java.lang.Object")),
            ("a.Base", Some("java.lang.Object")),
            ("a.Mid", Some("a.Base")),
            ("a.Leaf", Some("a.Mid")),
            ("b.Other", Some("java.lang.Object")),
        ] {
            symbols.register(UnitMeta {
                name: UnitName::new(name),
                superclass: superclass.map(UnitName::new),
                interfaces: Vec::new(),
            });
        }
        symbols
    }

    #[test]
    fn test_superclass_chain() {
        let symbols = table();
        let chain = symbols.superclass_chain(&UnitName::new("a.Leaf"));
        assert_eq!(
            chain,
            vec![
                UnitName::new("a.Leaf"),
                UnitName::new("a.Mid"),
                UnitName::new("a.Base"),
                UnitName::object()
            ]
        );
    }

    #[test]
    fn test_unknown_class_chain_ends_at_object() {
        let symbols = table();
        let chain = symbols.superclass_chain(&UnitName::new("missing.Class"));
        assert_eq!(chain.last(), Some(&UnitName::object()));
    }

    #[test]
    fn test_common_supertype_related() {
        let symbols = table();
        let common =
            symbols.common_supertype(&UnitName::new("a.Leaf"), &UnitName::new("a.Base"));
        assert_eq!(common, UnitName::new("a.Base"));
    }

    #[test]
    fn test_common_supertype_siblings() {
        let symbols = table();
        let common =
            symbols.common_supertype(&UnitName::new("a.Leaf"), &UnitName::new("b.Other"));
        assert_eq!(common, UnitName::object());
        // Second lookup hits the cache and agrees
        let again =
            symbols.common_supertype(&UnitName::new("b.Other"), &UnitName::new("a.Leaf"));
        assert_eq!(again, common);
    }

    #[test]
    fn test_merge_types_subtype_is_clean() {
        let symbols = table();
        let merged = symbols.merge_types(
            &JavaType::object("a.Leaf"),
            &JavaType::object("a.Mid"),
        );
        assert_eq!(merged, TypeMerge::Merged(JavaType::object("a.Mid")));
    }

    #[test]
    fn test_merge_types_unrelated_conflicts() {
        let symbols = table();
        let merged = symbols.merge_types(
            &JavaType::object("a.Leaf"),
            &JavaType::object("b.Other"),
        );
        assert!(merged.is_conflict());
        assert_eq!(merged.into_type(), JavaType::Object(UnitName::object()));
    }

    #[test]
    fn test_is_assignable() {
        let symbols = table();
        assert!(symbols.is_assignable(&UnitName::new("a.Base"), &UnitName::new("a.Leaf")));
        assert!(!symbols.is_assignable(&UnitName::new("a.Leaf"), &UnitName::new("a.Base")));
    }
}
