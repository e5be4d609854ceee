//! CFG construction from a linear instruction stream.
//!
//! The builder scans one method's instruction list plus its exception handler
//! ranges and produces the block arena: a new block starts at every jump
//! target, immediately after every terminator, and at every handler entry and
//! try-range boundary. Handler edges are added from every covered block to the
//! handler's entry block so structuring treats exceptional flow uniformly.
//!
//! # Failure Semantics
//!
//! Structurally malformed input - a branch or handler target outside the
//! instruction range - is not a caller error. The builder records an error
//! attribute, drops the impossible edge, and still returns the best graph it
//! can construct, so downstream stages degrade instead of crashing.

use std::collections::BTreeSet;

use crate::{
    attributes::{Attribute, AttributeSet},
    cfg::{BasicBlock, BlockId, ControlFlowGraph, EdgeKind},
    ir::{Method, Opcode},
};

/// Builds the control flow graph for one method.
pub struct CfgBuilder;

impl CfgBuilder {
    /// Decodes the method's instruction stream into a [`ControlFlowGraph`].
    ///
    /// Anomalies (out-of-range targets, degenerate handler ranges) are
    /// recorded on `attrs` and never abort construction. A method with zero
    /// instructions produces a single empty block.
    #[must_use]
    pub fn build(method: &Method, attrs: &mut AttributeSet) -> ControlFlowGraph {
        let instructions = method.instructions();
        let count = instructions.len();

        if count == 0 {
            let block = BasicBlock::new(BlockId::new(0), 0..0);
            return ControlFlowGraph::from_parts(vec![block], BlockId::new(0));
        }

        // Leader scan
        let mut leaders: BTreeSet<usize> = BTreeSet::new();
        leaders.insert(0);
        for (index, instr) in instructions.iter().enumerate() {
            for target in instr.branch_targets() {
                if target < count {
                    leaders.insert(target);
                } else {
                    attrs.attach(Attribute::Error(format!(
                        "branch target {target} at instruction {index} is outside the method (len {count})"
                    )));
                }
            }
            if instr.is_terminator() && index + 1 < count {
                leaders.insert(index + 1);
            }
        }
        for handler in method.handlers() {
            if handler.handler < count {
                leaders.insert(handler.handler);
            } else {
                attrs.attach(Attribute::Error(format!(
                    "exception handler entry {} is outside the method (len {count})",
                    handler.handler
                )));
            }
            // Try-range boundaries become block boundaries so regions can
            // claim covered blocks exactly.
            if handler.start < count {
                leaders.insert(handler.start);
            }
            if handler.end < count {
                leaders.insert(handler.end);
            }
        }

        // Block construction in layout order
        let starts: Vec<usize> = leaders.iter().copied().collect();
        let mut blocks: Vec<BasicBlock> = Vec::with_capacity(starts.len());
        let mut block_of = vec![BlockId::new(0); count];
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(count);
            let id = BlockId::new(i);
            for slot in &mut block_of[start..end] {
                *slot = id;
            }
            blocks.push(BasicBlock::new(id, start..end));
        }

        // Normal edges
        let mut edges: Vec<(BlockId, BlockId, EdgeKind)> = Vec::new();
        for block in &blocks {
            let Some(last) = block.last_index() else {
                continue;
            };
            let instr = &instructions[last];
            match instr.opcode() {
                Opcode::Goto { target } => {
                    if *target < count {
                        edges.push((block.id(), block_of[*target], EdgeKind::Fall));
                    }
                }
                Opcode::IfCmp { target, .. } | Opcode::IfZero { target, .. } => {
                    if *target < count {
                        edges.push((block.id(), block_of[*target], EdgeKind::Taken));
                    }
                    if last + 1 < count {
                        edges.push((block.id(), block_of[last + 1], EdgeKind::Else));
                    } else {
                        attrs.attach(Attribute::Warning(format!(
                            "conditional branch at instruction {last} has no fall-through"
                        )));
                    }
                }
                Opcode::Switch { cases, .. } => {
                    for (value, target) in cases {
                        if *target < count {
                            edges.push((block.id(), block_of[*target], EdgeKind::Case(*value)));
                        }
                    }
                    if last + 1 < count {
                        edges.push((block.id(), block_of[last + 1], EdgeKind::Fall));
                    }
                }
                Opcode::Return { .. } | Opcode::ReturnVoid | Opcode::Throw { .. } => {}
                _ => {
                    // Block ends because the next instruction is a leader
                    if last + 1 < count {
                        edges.push((block.id(), block_of[last + 1], EdgeKind::Fall));
                    }
                }
            }
        }

        // Handler edges from every covered block
        for handler in method.handlers() {
            if handler.handler >= count {
                continue;
            }
            let handler_block = block_of[handler.handler];
            let end = handler.end.min(count);
            if handler.start >= end {
                attrs.attach(Attribute::Warning(format!(
                    "exception handler covers empty range {}..{}",
                    handler.start, handler.end
                )));
                continue;
            }
            let mut covered: BTreeSet<BlockId> = BTreeSet::new();
            for index in handler.start..end {
                covered.insert(block_of[index]);
            }
            for source in covered {
                if source != handler_block {
                    edges.push((source, handler_block, EdgeKind::Handler));
                }
            }
        }

        for (from, to, kind) in edges {
            blocks[from.index()].add_successor(to, kind);
            blocks[to.index()].add_predecessor(from);
        }

        ControlFlowGraph::from_parts(blocks, BlockId::new(0))
    }
}
