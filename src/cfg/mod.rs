//! Control flow graph construction and analysis.
//!
//! This module turns one method's linear instruction stream plus its exception
//! handler ranges into a directed graph of basic blocks, and provides the
//! graph analyses the structural analyzer consumes: dominator trees, reverse
//! postorder and natural loops.
//!
//! # Architecture
//!
//! Blocks live in a per-method arena owned by [`ControlFlowGraph`]; all
//! cross-references are [`BlockId`] indices (never owned pointers), so the
//! graph has no reference cycles despite the CFG itself being cyclic.
//!
//! # Key Components
//!
//! - [`CfgBuilder`] - Decodes the instruction stream into blocks and edges
//! - [`ControlFlowGraph`] - The block arena with lazy dominators/RPO/loops
//! - [`BasicBlock`] / [`BlockId`] / [`EdgeKind`] - Arena nodes and typed edges
//! - [`DominatorTree`] - Lengauer-Tarjan dominator computation
//! - [`NaturalLoop`] / [`LoopKind`] - Loop detection and classification
//!
//! # Failure Semantics
//!
//! Malformed input (edge targets outside the instruction range) is recorded
//! through the attribute system and construction continues with the best
//! graph available; nothing in this module aborts a method.

mod block;
mod builder;
mod dominators;
mod graph;
mod loops;

pub use block::{BasicBlock, BlockId, EdgeKind};
pub use builder::CfgBuilder;
pub use dominators::DominatorTree;
pub use graph::ControlFlowGraph;
pub use loops::{detect_loops, LoopKind, NaturalLoop};
