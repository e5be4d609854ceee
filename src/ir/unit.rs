//! Class-level IR nodes.
//!
//! A [`Unit`] is one decompilation unit: a class with its members and an
//! attribute set. Units are built once by the ingestion collaborator and are
//! read-only inputs to the pipeline; per-run state (CFGs, regions, variables)
//! lives in the per-method analysis context instead.

use bitflags::bitflags;

use crate::{
    attributes::AttributeSet,
    ir::{JavaType, Method, UnitName},
};

bitflags! {
    /// Class/member access and property flags, matching the Dalvik encoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        /// `public`
        const PUBLIC = 0x0001;
        /// `private`
        const PRIVATE = 0x0002;
        /// `protected`
        const PROTECTED = 0x0004;
        /// `static`
        const STATIC = 0x0008;
        /// `final`
        const FINAL = 0x0010;
        /// `synchronized` (methods)
        const SYNCHRONIZED = 0x0020;
        /// `volatile` (fields)
        const VOLATILE = 0x0040;
        /// `transient` (fields)
        const TRANSIENT = 0x0080;
        /// `native` (methods)
        const NATIVE = 0x0100;
        /// interface (classes)
        const INTERFACE = 0x0200;
        /// `abstract`
        const ABSTRACT = 0x0400;
        /// compiler-generated member
        const SYNTHETIC = 0x1000;
        /// constructor (methods)
        const CONSTRUCTOR = 0x10000;
    }
}

impl AccessFlags {
    /// Renders the flags as Java source modifiers in canonical order,
    /// including a trailing space when non-empty.
    #[must_use]
    pub fn source_modifiers(&self) -> String {
        let mut out = String::new();
        for (flag, word) in [
            (AccessFlags::PUBLIC, "public"),
            (AccessFlags::PROTECTED, "protected"),
            (AccessFlags::PRIVATE, "private"),
            (AccessFlags::ABSTRACT, "abstract"),
            (AccessFlags::STATIC, "static"),
            (AccessFlags::FINAL, "final"),
            (AccessFlags::SYNCHRONIZED, "synchronized"),
            (AccessFlags::VOLATILE, "volatile"),
            (AccessFlags::TRANSIENT, "transient"),
            (AccessFlags::NATIVE, "native"),
        ] {
            if self.contains(flag) {
                out.push_str(word);
                out.push(' ');
            }
        }
        out
    }
}

/// A field member of a [`Unit`].
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub ty: JavaType,
    /// Access flags.
    pub flags: AccessFlags,
}

/// One decompilation unit: a class with identity, hierarchy references,
/// members and an attribute set.
///
/// Superclass and interface references are held by name and resolved lazily
/// through the symbol table; the unit graph carries no ownership cycles.
#[derive(Debug)]
pub struct Unit {
    name: UnitName,
    superclass: Option<UnitName>,
    interfaces: Vec<UnitName>,
    flags: AccessFlags,
    fields: Vec<Field>,
    methods: Vec<Method>,
    attributes: AttributeSet,
}

impl Unit {
    /// Creates a unit with the given identity and hierarchy references.
    ///
    /// `superclass` is `None` only for `java.lang.Object` itself.
    #[must_use]
    pub fn new(name: UnitName, superclass: Option<UnitName>, flags: AccessFlags) -> Self {
        Self {
            name,
            superclass,
            interfaces: Vec::new(),
            flags,
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: AttributeSet::new(),
        }
    }

    /// Returns the qualified class name.
    #[must_use]
    pub fn name(&self) -> &UnitName {
        &self.name
    }

    /// Returns the superclass name, if any.
    #[must_use]
    pub fn superclass(&self) -> Option<&UnitName> {
        self.superclass.as_ref()
    }

    /// Returns the implemented interface names.
    #[must_use]
    pub fn interfaces(&self) -> &[UnitName] {
        &self.interfaces
    }

    /// Returns the class access flags.
    #[must_use]
    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the unit's attribute set.
    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Mutable access to the unit's attribute set (ingestion only).
    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    /// Adds an implemented interface (ingestion only).
    pub fn add_interface(&mut self, name: UnitName) {
        self.interfaces.push(name);
    }

    /// Adds a field (ingestion only).
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Adds a method (ingestion only).
    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }
}
