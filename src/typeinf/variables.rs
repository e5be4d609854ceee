//! Stable, renamed variables merging register versions.
//!
//! A [`Variable`] merges the register definitions that type inference proved
//! to describe one value: definitions of the same register reaching a common
//! use are one variable, definitions with disjoint live ranges stay separate
//! even when they share a register (register splitting). Two variables
//! covering overlapping live ranges of the same register are never merged.

use std::collections::HashMap;
use std::fmt;

use crate::ir::{JavaType, Reg};
use crate::typeinf::{DefId, DefUseChains};

/// Identifier of one recovered variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Returns the raw index into the variable table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One source-level variable.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VarId,
    name: String,
    ty: JavaType,
    reg: Reg,
    is_param: bool,
    multi_def: bool,
    /// Inline declaration site (instruction index), when the single
    /// definition and all uses share one block; otherwise the variable
    /// declares at method top.
    decl_instr: Option<usize>,
    display_name: Option<String>,
}

impl Variable {
    pub(crate) fn new(
        id: VarId,
        name: String,
        ty: JavaType,
        reg: Reg,
        is_param: bool,
        multi_def: bool,
        decl_instr: Option<usize>,
    ) -> Self {
        Self {
            id,
            name,
            ty,
            reg,
            is_param,
            multi_def,
            decl_instr,
            display_name: None,
        }
    }

    /// Returns the variable identifier.
    #[must_use]
    pub fn id(&self) -> VarId {
        self.id
    }

    /// The generated name (`p0`, `v3`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// The inferred source type.
    #[must_use]
    pub fn ty(&self) -> &JavaType {
        &self.ty
    }

    /// The underlying register.
    #[must_use]
    pub fn reg(&self) -> Reg {
        self.reg
    }

    /// Returns `true` for declared parameters (never re-declared in the body).
    #[must_use]
    pub fn is_param(&self) -> bool {
        self.is_param
    }

    /// Returns `true` when the variable has more than one definition.
    #[must_use]
    pub fn is_multi_def(&self) -> bool {
        self.multi_def
    }

    /// Returns the inline declaration instruction, or `None` when the
    /// variable must be declared at method top.
    #[must_use]
    pub fn decl_instr(&self) -> Option<usize> {
        self.decl_instr
    }

    /// Overrides the display name (deobfuscation collaborators).
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = Some(name.into());
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty.source_name(), self.name())
    }
}

/// The inference result for one method: variables plus the side tables
/// binding every definition and use to its variable.
#[derive(Debug, Default)]
pub struct VariableMap {
    vars: Vec<Variable>,
    def_var: Vec<VarId>,
    use_var: HashMap<(usize, Reg), VarId>,
    chains: DefUseChains,
}

impl VariableMap {
    pub(crate) fn new(
        vars: Vec<Variable>,
        def_var: Vec<VarId>,
        use_var: HashMap<(usize, Reg), VarId>,
        chains: DefUseChains,
    ) -> Self {
        Self {
            vars,
            def_var,
            use_var,
            chains,
        }
    }

    /// All variables, parameters first, then locals in first-definition order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    /// Returns the variable with the given ID.
    #[must_use]
    pub fn variable(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }

    /// Mutable access to a variable (display-name overrides).
    pub fn variable_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[id.index()]
    }

    /// Returns the variable bound to a definition.
    #[must_use]
    pub fn var_of_def(&self, def: DefId) -> VarId {
        self.def_var[def.index()]
    }

    /// Returns the variable defined by the instruction at `index`, if any.
    #[must_use]
    pub fn var_of_def_instr(&self, index: usize) -> Option<VarId> {
        self.chains.def_at(index).map(|d| self.var_of_def(d))
    }

    /// Returns the variable read by the use of `reg` at `index`, if resolved.
    #[must_use]
    pub fn var_of_use(&self, index: usize, reg: Reg) -> Option<VarId> {
        self.use_var.get(&(index, reg)).copied()
    }

    /// The underlying def-use chains.
    #[must_use]
    pub fn chains(&self) -> &DefUseChains {
        &self.chains
    }
}
