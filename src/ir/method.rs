//! Method-level IR node.
//!
//! A [`Method`] carries everything the pipeline needs to analyze one routine:
//! identity (name + signature), register count, the ordered instruction list
//! and the exception handler table. Dalvik convention places the declared
//! parameters (plus the implicit receiver for instance methods) in the highest
//! registers; [`Method::param_regs`] reconstructs that mapping for type
//! inference.

use crate::ir::{AccessFlags, ExceptionHandler, Instruction, JavaType, Reg, UnitName};

/// A method signature: declared parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    /// Declared parameter types, excluding the implicit receiver.
    pub params: Vec<JavaType>,
    /// Return type; `None` for `void`.
    pub ret: Option<JavaType>,
}

impl MethodSig {
    /// Creates a signature.
    #[must_use]
    pub fn new(params: Vec<JavaType>, ret: Option<JavaType>) -> Self {
        Self { params, ret }
    }

    /// Signature of a `()V` method.
    #[must_use]
    pub fn void() -> Self {
        Self {
            params: Vec::new(),
            ret: None,
        }
    }

    /// Total register width of the declared parameters (wide types take two).
    #[must_use]
    pub fn param_width(&self) -> usize {
        self.params
            .iter()
            .map(|t| if t.is_wide() { 2 } else { 1 })
            .sum()
    }
}

/// One routine: instructions, registers, handler table and identity.
///
/// Methods are read-only inputs; the analysis results (CFG, region tree,
/// variables, attributes) live in the per-run context and result types.
#[derive(Debug, Clone)]
pub struct Method {
    name: String,
    sig: MethodSig,
    flags: AccessFlags,
    registers: u16,
    instructions: Vec<Instruction>,
    handlers: Vec<ExceptionHandler>,
}

impl Method {
    /// Creates a method from decoded ingestion data.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sig: MethodSig,
        flags: AccessFlags,
        registers: u16,
        instructions: Vec<Instruction>,
        handlers: Vec<ExceptionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            sig,
            flags,
            registers,
            instructions,
            handlers,
        }
    }

    /// Returns the method name (`<init>` for constructors).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared signature.
    #[must_use]
    pub fn sig(&self) -> &MethodSig {
        &self.sig
    }

    /// Returns the access flags.
    #[must_use]
    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Returns the total register count.
    #[must_use]
    pub fn registers(&self) -> u16 {
        self.registers
    }

    /// Returns the ordered instruction list.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the exception handler table.
    #[must_use]
    pub fn handlers(&self) -> &[ExceptionHandler] {
        &self.handlers
    }

    /// Returns `true` for static methods (no implicit receiver).
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(AccessFlags::STATIC)
    }

    /// Returns `true` for constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Reconstructs the parameter register mapping.
    ///
    /// Returns `(register, type)` pairs, including the implicit receiver as
    /// the first entry for instance methods (typed as the owning class, which
    /// the caller supplies since methods hold no back-reference by value).
    /// Wide parameters occupy a register pair; only the low register is
    /// listed.
    #[must_use]
    pub fn param_regs(&self, owner: &UnitName) -> Vec<(Reg, JavaType)> {
        let width = self.sig.param_width() + usize::from(!self.is_static());
        let first = (self.registers as usize).saturating_sub(width);

        let mut out = Vec::with_capacity(self.sig.params.len() + 1);
        let mut reg = first;
        if !self.is_static() {
            out.push((Reg(reg as u16), JavaType::Object(owner.clone())));
            reg += 1;
        }
        for ty in &self.sig.params {
            out.push((Reg(reg as u16), ty.clone()));
            reg += if ty.is_wide() { 2 } else { 1 };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_width() {
        let sig = MethodSig::new(vec![JavaType::Int, JavaType::Long, JavaType::Int], None);
        assert_eq!(sig.param_width(), 4);
        assert_eq!(MethodSig::void().param_width(), 0);
    }

    #[test]
    fn test_param_regs_static() {
        let m = Method::new(
            "f",
            MethodSig::new(vec![JavaType::Int, JavaType::Int], Some(JavaType::Int)),
            AccessFlags::STATIC,
            5,
            Vec::new(),
            Vec::new(),
        );
        let regs = m.param_regs(&UnitName::new("a.B"));
        assert_eq!(regs, vec![(Reg(3), JavaType::Int), (Reg(4), JavaType::Int)]);
    }

    #[test]
    fn test_param_regs_instance_with_wide() {
        let m = Method::new(
            "f",
            MethodSig::new(vec![JavaType::Long], None),
            AccessFlags::PUBLIC,
            6,
            Vec::new(),
            Vec::new(),
        );
        let owner = UnitName::new("a.B");
        let regs = m.param_regs(&owner);
        // this in v3, the long pair in v4/v5
        assert_eq!(
            regs,
            vec![
                (Reg(3), JavaType::Object(owner.clone())),
                (Reg(4), JavaType::Long)
            ]
        );
    }
}
