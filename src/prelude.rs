//! # dexlift Prelude
//!
//! Convenient re-exports of the most commonly used types for driving the
//! decompiler and inspecting its results.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexlift operations
pub use crate::Error;

/// The result type used throughout dexlift
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The decompilation engine and its options
pub use crate::project::{DecompileOptions, Decompiler};

/// Observable per-unit and per-method results
pub use crate::project::{MethodResult, UnitResult};

/// Shared metadata collaborator inputs
pub use crate::project::{ResourceMap, SymbolTable, UnitMeta};

// ================================================================================================
// IR Model
// ================================================================================================

/// Class, member and instruction nodes
pub use crate::ir::{
    AccessFlags, ExceptionHandler, Field, Instruction, Method, MethodSig, Opcode, Reg, Unit,
    UnitName,
};

/// The source-level type lattice
pub use crate::ir::JavaType;

// ================================================================================================
// Analysis Results
// ================================================================================================

/// Attribute system for diagnostics and analysis metadata
pub use crate::attributes::{AttrFlags, AttrKind, Attribute, AttributeSet};

/// Control flow graph types
pub use crate::cfg::{BasicBlock, BlockId, CfgBuilder, ControlFlowGraph};

/// Recovered control structure
pub use crate::structure::{RegionKind, RegionTree};

/// Inferred variables
pub use crate::typeinf::{VarId, Variable, VariableMap};

/// Pass pipeline extension points
pub use crate::passes::{DecompilePass, MethodContext, PassPipeline};
