//! Order-independent attribute annotations for IR nodes and analysis results.
//!
//! Attributes are the pipeline's substitute for exception-based error
//! propagation: a pass that detects a local anomaly attaches a diagnostic
//! attribute and continues, rather than aborting the whole method. Readers use
//! presence-checked lookups; absence is a normal, checked outcome and never a
//! failure signal.
//!
//! # Attribute Kinds
//!
//! Three storage classes exist, selected by the attribute's kind:
//!
//! - **Flags** ([`AttrFlags`]) - presence-only markers, stored as a bitset
//! - **Single-value** - at most one per kind; re-attaching replaces
//! - **Accumulating lists** - diagnostics (errors/warnings/comments) append
//!
//! Attributes never affect identity or equality of the node they are attached
//! to.
//!
//! # Examples
//!
//! ```rust,ignore
//! use dexlift::attributes::{Attribute, AttributeSet, AttrFlags, AttrKind};
//!
//! let mut attrs = AttributeSet::new();
//! attrs.set_flag(AttrFlags::FALLBACK_MODE);
//! attrs.attach(Attribute::Warning("irreducible loop".to_string()));
//!
//! assert!(attrs.has_flag(AttrFlags::FALLBACK_MODE));
//! assert!(!attrs.is_failed());
//! assert_eq!(attrs.warnings().len(), 1);
//! ```

use std::collections::HashMap;

use bitflags::bitflags;

bitflags! {
    /// Presence-only attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AttrFlags: u32 {
        /// Structuring gave up and the method renders through the
        /// unstructured fallback path.
        const FALLBACK_MODE = 0x0001;
        /// The node should be omitted from rendered output.
        const DONT_GENERATE = 0x0002;
        /// The region tree contains synthetic shapes not present in the
        /// original control flow (e.g. loop rewrites).
        const SYNTHETIC_STRUCTURE = 0x0004;
        /// At least one exception handler in this method is unreachable.
        const DEAD_HANDLER = 0x0008;
    }
}

/// Identifies an attribute kind for keyed lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum AttrKind {
    /// Error-class diagnostic (accumulating). Presence means failure.
    Error,
    /// Warning-class diagnostic (accumulating).
    Warning,
    /// Free-form rendered comment (accumulating).
    Comment,
    /// Display-name override (single-value).
    RenamedTo,
    /// Structuring hit a resource ceiling (single-value, carries the limit).
    StructureCeiling,
}

/// A typed, keyed fact attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// Error-class diagnostic; any error marks the node as failed.
    Error(String),
    /// Warning-class diagnostic; surfaced in rendered output, never dropped.
    Warning(String),
    /// Free-form comment emitted alongside the node.
    Comment(String),
    /// Overridden display name for the node.
    RenamedTo(String),
    /// The resource ceiling that aborted structuring.
    StructureCeiling(usize),
}

impl Attribute {
    /// Returns the kind key for this attribute.
    #[must_use]
    pub fn kind(&self) -> AttrKind {
        match self {
            Attribute::Error(_) => AttrKind::Error,
            Attribute::Warning(_) => AttrKind::Warning,
            Attribute::Comment(_) => AttrKind::Comment,
            Attribute::RenamedTo(_) => AttrKind::RenamedTo,
            Attribute::StructureCeiling(_) => AttrKind::StructureCeiling,
        }
    }

    /// Returns `true` for accumulating-list kinds.
    #[must_use]
    pub fn is_accumulating(&self) -> bool {
        matches!(
            self,
            Attribute::Error(_) | Attribute::Warning(_) | Attribute::Comment(_)
        )
    }
}

/// The attribute store attached to a node.
///
/// All lookups are O(1) amortized; none of them can fail for an absent kind.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    flags: AttrFlags,
    values: HashMap<AttrKind, Attribute>,
    errors: Vec<String>,
    warnings: Vec<String>,
    comments: Vec<String>,
}

impl AttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a presence-only flag. Idempotent.
    pub fn set_flag(&mut self, flag: AttrFlags) {
        self.flags |= flag;
    }

    /// Checks a presence-only flag.
    #[must_use]
    pub fn has_flag(&self, flag: AttrFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Attaches an attribute.
    ///
    /// Accumulating kinds (diagnostics, comments) append; single-value kinds
    /// replace any previous attribute of the same kind, making re-attachment
    /// idempotent.
    pub fn attach(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Error(msg) => self.errors.push(msg),
            Attribute::Warning(msg) => self.warnings.push(msg),
            Attribute::Comment(msg) => self.comments.push(msg),
            other => {
                self.values.insert(other.kind(), other);
            }
        }
    }

    /// Returns `true` if an attribute of the given kind is present.
    #[must_use]
    pub fn has(&self, kind: AttrKind) -> bool {
        match kind {
            AttrKind::Error => !self.errors.is_empty(),
            AttrKind::Warning => !self.warnings.is_empty(),
            AttrKind::Comment => !self.comments.is_empty(),
            _ => self.values.contains_key(&kind),
        }
    }

    /// Returns the single-value attribute of the given kind, if present.
    ///
    /// Accumulating kinds are read through [`errors`](Self::errors),
    /// [`warnings`](Self::warnings) and [`comments`](Self::comments); for
    /// those this returns `None`.
    #[must_use]
    pub fn get(&self, kind: AttrKind) -> Option<&Attribute> {
        self.values.get(&kind)
    }

    /// Accumulated error-class diagnostics.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Accumulated warning-class diagnostics.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Accumulated rendered comments.
    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// The externally visible success indicator: failed means at least one
    /// error-class attribute is present.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the overridden display name, if one was attached.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self.values.get(&AttrKind::RenamedTo) {
            Some(Attribute::RenamedTo(name)) => Some(name.as_str()),
            _ => None,
        }
    }
}
