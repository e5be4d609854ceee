//! Per-method analysis context threaded through the pass pipeline.

use crate::{
    attributes::AttributeSet,
    cfg::ControlFlowGraph,
    ir::{Method, Unit},
    project::SymbolTable,
    structure::{RegionTree, StructureLimits},
    typeinf::VariableMap,
};

/// Mutable analysis state for one method's decompilation run.
///
/// The context owns everything a single run produces - CFG, region tree,
/// variables, attributes - while borrowing the read-only IR and the shared
/// symbol table. One context belongs to exactly one pipeline task; contexts
/// are never shared between concurrently decompiled methods.
pub struct MethodContext<'a> {
    /// The owning unit (read-only input).
    pub unit: &'a Unit,
    /// The method under decompilation (read-only input).
    pub method: &'a Method,
    /// The shared, frozen symbol table.
    pub symbols: &'a SymbolTable,
    /// Structuring resource ceilings.
    pub limits: StructureLimits,
    /// Diagnostics and analysis metadata accumulated by passes.
    pub attributes: AttributeSet,
    /// Control flow graph, set by the CFG pass.
    pub cfg: Option<ControlFlowGraph>,
    /// Recovered region tree, set by the structuring pass.
    pub regions: Option<RegionTree>,
    /// Inferred variables, set by the inference pass.
    pub variables: Option<VariableMap>,
}

impl<'a> MethodContext<'a> {
    /// Creates a fresh context for one method.
    #[must_use]
    pub fn new(
        unit: &'a Unit,
        method: &'a Method,
        symbols: &'a SymbolTable,
        limits: StructureLimits,
    ) -> Self {
        Self {
            unit,
            method,
            symbols,
            limits,
            attributes: AttributeSet::new(),
            cfg: None,
            regions: None,
            variables: None,
        }
    }

    /// The externally visible success indicator: `true` when no error-class
    /// attribute has been recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.attributes.is_failed()
    }
}
