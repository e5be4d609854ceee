//! Source-level Java type representation used throughout the pipeline.
//!
//! This module provides a type lattice for registers and variables that captures
//! the information type inference needs without requiring full class-file
//! resolution.
//!
//! # Design Rationale
//!
//! The `JavaType` enum is designed to be:
//! - **Fast to compare**: enum variants instead of name resolution for primitives
//! - **Self-contained**: no symbol table needed for basic operations
//! - **Analysis-friendly**: includes the analysis-only `Unknown` and `Null` values
//!
//! # Lattice Structure
//!
//! `Unknown` is the bottom element and merges with anything. `Null` merges into
//! any reference type. Two distinct reference types merge to their nearest common
//! supertype (resolved through [`crate::project::SymbolTable`]); primitive
//! conflicts widen within the integer family and otherwise report a conflict so
//! the caller can fall back and attach a warning attribute.

use std::fmt;
use std::sync::Arc;

/// A qualified class name such as `java.lang.String`.
///
/// Names are interned behind an [`Arc`] so they are cheap to clone while
/// building per-method side tables. Ordering and hashing follow the textual
/// name, which keeps all name-keyed iteration deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitName(Arc<str>);

impl UnitName {
    /// Creates a unit name from a qualified dotted string.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// The root of the reference type hierarchy, `java.lang.Object`.
    #[must_use]
    pub fn object() -> Self {
        Self::new("java.lang.Object")
    }

    /// Returns the qualified name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the package portion of the name, or an empty string for
    /// unpackaged classes.
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    /// Returns the simple (unqualified) class name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(&self.0, |(_, simple)| simple)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Source-level type of a register, variable, field or method signature slot.
///
/// # Examples
///
/// ```rust,ignore
/// use dexlift::ir::JavaType;
///
/// let int_type = JavaType::Int;
/// let string_type = JavaType::object("java.lang.String");
/// let array_type = JavaType::array(JavaType::Int);
///
/// assert!(int_type.is_primitive());
/// assert!(string_type.is_reference());
/// assert!(array_type.is_reference());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum JavaType {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    Char,
    /// `int`
    Int,
    /// `long` (wide: occupies a register pair)
    Long,
    /// `float`
    Float,
    /// `double` (wide: occupies a register pair)
    Double,
    /// A class reference.
    Object(UnitName),
    /// An array with the given element type.
    Array(Box<JavaType>),
    /// The type of the `null` literal; merges into any reference type.
    Null,
    /// Not yet inferred. Bottom of the lattice.
    #[default]
    Unknown,
}

/// Outcome of merging two types during inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMerge {
    /// The types are compatible; the merged type is carried.
    Merged(JavaType),
    /// The types are incompatible; the carried type is the most general
    /// fallback the caller should degrade to (with a warning attribute).
    Conflict(JavaType),
}

impl TypeMerge {
    /// Unwraps the carried type, regardless of conflict state.
    #[must_use]
    pub fn into_type(self) -> JavaType {
        match self {
            TypeMerge::Merged(ty) | TypeMerge::Conflict(ty) => ty,
        }
    }

    /// Returns `true` if the merge reported a conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, TypeMerge::Conflict(_))
    }
}

impl JavaType {
    /// Creates an object type from a qualified class name.
    #[must_use]
    pub fn object(name: impl Into<Arc<str>>) -> Self {
        JavaType::Object(UnitName::new(name))
    }

    /// Creates an array type with the given element type.
    #[must_use]
    pub fn array(elem: JavaType) -> Self {
        JavaType::Array(Box::new(elem))
    }

    /// Returns `true` for the eight primitive types.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            JavaType::Boolean
                | JavaType::Byte
                | JavaType::Short
                | JavaType::Char
                | JavaType::Int
                | JavaType::Long
                | JavaType::Float
                | JavaType::Double
        )
    }

    /// Returns `true` for object, array and null types.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            JavaType::Object(_) | JavaType::Array(_) | JavaType::Null
        )
    }

    /// Returns `true` if the type occupies a register pair (`long`/`double`).
    #[must_use]
    pub fn is_wide(&self) -> bool {
        matches!(self, JavaType::Long | JavaType::Double)
    }

    /// Returns `true` for members of the 32-bit integer family, which Dalvik
    /// stores interchangeably in a single register.
    #[must_use]
    pub fn is_int_family(&self) -> bool {
        matches!(
            self,
            JavaType::Boolean
                | JavaType::Byte
                | JavaType::Short
                | JavaType::Char
                | JavaType::Int
        )
    }

    /// Returns `true` if the type has been resolved (not [`JavaType::Unknown`]).
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, JavaType::Unknown)
    }

    /// Renders the type as Java source text (`int`, `java.lang.String`, `int[]`).
    #[must_use]
    pub fn source_name(&self) -> String {
        match self {
            JavaType::Boolean => "boolean".to_string(),
            JavaType::Byte => "byte".to_string(),
            JavaType::Short => "short".to_string(),
            JavaType::Char => "char".to_string(),
            JavaType::Int => "int".to_string(),
            JavaType::Long => "long".to_string(),
            JavaType::Float => "float".to_string(),
            JavaType::Double => "double".to_string(),
            JavaType::Object(name) => name.as_str().to_string(),
            JavaType::Array(elem) => format!("{}[]", elem.source_name()),
            // Null and Unknown should not survive to rendering; Object is the
            // safe spelling if they do.
            JavaType::Null | JavaType::Unknown => "java.lang.Object".to_string(),
        }
    }

    /// Merges two types without symbol table access.
    ///
    /// Object/object merges that need hierarchy walks return the pair
    /// unmodified as a [`TypeMerge::Conflict`] carrying `java.lang.Object`;
    /// the inference engine retries those through
    /// [`crate::project::SymbolTable::common_supertype`] before degrading.
    ///
    /// # Merge Rules
    ///
    /// | Left | Right | Result |
    /// |------|-------|--------|
    /// | `Unknown` | T | T |
    /// | `Null` | reference T | T |
    /// | T | T | T |
    /// | int family | int family | wider member |
    /// | anything else | anything else | conflict |
    #[must_use]
    pub fn merge(&self, other: &JavaType) -> TypeMerge {
        use JavaType::{Array, Int, Null, Object, Unknown};

        if self == other {
            return TypeMerge::Merged(self.clone());
        }

        match (self, other) {
            (Unknown, t) | (t, Unknown) => TypeMerge::Merged(t.clone()),
            (Null, t) | (t, Null) if t.is_reference() => TypeMerge::Merged(t.clone()),
            (a, b) if a.is_int_family() && b.is_int_family() => {
                TypeMerge::Merged(wider_int(a, b).clone())
            }
            (Array(a), Array(b)) => match a.merge(b) {
                TypeMerge::Merged(elem) => TypeMerge::Merged(JavaType::array(elem)),
                // Covariant arrays still merge to Object[] at worst.
                TypeMerge::Conflict(_) => {
                    TypeMerge::Conflict(JavaType::array(JavaType::Object(UnitName::object())))
                }
            },
            (Object(_) | Array(_), Object(_) | Array(_)) => {
                TypeMerge::Conflict(JavaType::Object(UnitName::object()))
            }
            (a, b) if a.is_primitive() && b.is_reference() || a.is_reference() && b.is_primitive() => {
                TypeMerge::Conflict(JavaType::Object(UnitName::object()))
            }
            // Remaining primitive mismatches (e.g. int vs float reuse of a
            // register) keep the 32-bit default.
            _ => TypeMerge::Conflict(Int),
        }
    }
}

/// Picks the wider member of the 32-bit integer family.
fn wider_int<'a>(a: &'a JavaType, b: &'a JavaType) -> &'a JavaType {
    fn rank(t: &JavaType) -> u8 {
        match t {
            JavaType::Boolean => 0,
            JavaType::Byte => 1,
            JavaType::Char => 2,
            JavaType::Short => 2,
            _ => 3,
        }
    }
    if rank(a) >= rank(b) {
        a
    } else {
        b
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_name_parts() {
        let name = UnitName::new("com.example.Foo");
        assert_eq!(name.package(), "com.example");
        assert_eq!(name.simple_name(), "Foo");
        assert_eq!(name.to_string(), "com.example.Foo");

        let bare = UnitName::new("Foo");
        assert_eq!(bare.package(), "");
        assert_eq!(bare.simple_name(), "Foo");
    }

    #[test]
    fn test_predicates() {
        assert!(JavaType::Int.is_primitive());
        assert!(JavaType::Long.is_wide());
        assert!(JavaType::Double.is_wide());
        assert!(!JavaType::Int.is_wide());
        assert!(JavaType::object("java.lang.String").is_reference());
        assert!(JavaType::array(JavaType::Int).is_reference());
        assert!(JavaType::Null.is_reference());
        assert!(!JavaType::Unknown.is_known());
    }

    #[test]
    fn test_source_name() {
        assert_eq!(JavaType::Boolean.source_name(), "boolean");
        assert_eq!(
            JavaType::object("java.lang.String").source_name(),
            "java.lang.String"
        );
        assert_eq!(
            JavaType::array(JavaType::array(JavaType::Int)).source_name(),
            "int[][]"
        );
    }

    #[test]
    fn test_merge_unknown_is_bottom() {
        let merged = JavaType::Unknown.merge(&JavaType::Int);
        assert_eq!(merged, TypeMerge::Merged(JavaType::Int));

        let merged = JavaType::object("a.B").merge(&JavaType::Unknown);
        assert_eq!(merged, TypeMerge::Merged(JavaType::object("a.B")));
    }

    #[test]
    fn test_merge_null_into_reference() {
        let merged = JavaType::Null.merge(&JavaType::object("a.B"));
        assert_eq!(merged, TypeMerge::Merged(JavaType::object("a.B")));

        let merged = JavaType::array(JavaType::Int).merge(&JavaType::Null);
        assert_eq!(merged, TypeMerge::Merged(JavaType::array(JavaType::Int)));
    }

    #[test]
    fn test_merge_int_family_widens() {
        let merged = JavaType::Boolean.merge(&JavaType::Int);
        assert_eq!(merged, TypeMerge::Merged(JavaType::Int));

        let merged = JavaType::Byte.merge(&JavaType::Short);
        assert_eq!(merged, TypeMerge::Merged(JavaType::Short));
    }

    #[test]
    fn test_merge_object_conflict_falls_back() {
        let merged = JavaType::object("a.B").merge(&JavaType::object("c.D"));
        assert!(merged.is_conflict());
        assert_eq!(merged.into_type(), JavaType::Object(UnitName::object()));
    }

    #[test]
    fn test_merge_primitive_reference_conflict() {
        let merged = JavaType::Int.merge(&JavaType::object("a.B"));
        assert!(merged.is_conflict());
        assert_eq!(merged.into_type(), JavaType::Object(UnitName::object()));
    }

    #[test]
    fn test_merge_array_elements() {
        let merged = JavaType::array(JavaType::Unknown).merge(&JavaType::array(JavaType::Long));
        assert_eq!(merged, TypeMerge::Merged(JavaType::array(JavaType::Long)));
    }
}
