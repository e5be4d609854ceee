//! Basic block arena node and identifier.
//!
//! This module provides the [`BlockId`] type, a strongly-typed index into the
//! per-method block arena, and the [`BasicBlock`] node itself. Cross-references
//! between blocks (successors, predecessors, dominator parents) are arena
//! indices, never owned pointers, so the CFG carries no reference cycles.

use std::fmt;
use std::ops::Range;

use crate::ir::{Instruction, Method};

/// A strongly-typed identifier for basic blocks within one method's CFG.
///
/// `BlockId` wraps a `usize` index into the CFG's block arena. Block IDs are
/// assigned sequentially in instruction order when the CFG is built, so
/// iterating blocks by ID visits them in layout order - a property the
/// structuring and rendering stages rely on for determinism.
///
/// # Thread Safety
///
/// `BlockId` is [`Copy`], [`Send`], and [`Sync`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Creates a new `BlockId` from a raw index value.
    ///
    /// Primarily intended for internal use and testing; normal usage obtains
    /// IDs from [`crate::cfg::ControlFlowGraph`] accessors.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        BlockId(index)
    }

    /// Returns the raw index value of this block identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({})", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Classification of control flow edges.
///
/// The kind is carried on each successor entry so downstream stages can tell
/// branch polarity and exceptional flow apart without re-decoding the
/// terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Unconditional flow: layout fall-through or a `goto`.
    Fall,
    /// Conditional branch taken.
    Taken,
    /// Conditional branch not taken (fall-through arm of an `if`).
    Else,
    /// Switch case edge with its case value.
    Case(i32),
    /// Exceptional edge to a handler entry.
    Handler,
}

impl EdgeKind {
    /// Returns `true` for exceptional edges.
    #[must_use]
    pub fn is_exceptional(&self) -> bool {
        matches!(self, EdgeKind::Handler)
    }
}

/// An ordered, non-branching instruction run; a node in the CFG.
///
/// The block does not own instructions - it addresses a half-open range of
/// the method's instruction list. The CFG arena is the sole owner of blocks.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    id: BlockId,
    range: Range<usize>,
    successors: Vec<(BlockId, EdgeKind)>,
    predecessors: Vec<BlockId>,
}

impl BasicBlock {
    /// Creates a block covering the given instruction range.
    #[must_use]
    pub(crate) fn new(id: BlockId, range: Range<usize>) -> Self {
        Self {
            id,
            range,
            successors: Vec::new(),
            predecessors: Vec::new(),
        }
    }

    /// Returns the block's stable identifier.
    #[must_use]
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the covered instruction index range.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Returns the index of the first instruction, or `None` for an empty block.
    #[must_use]
    pub fn first_index(&self) -> Option<usize> {
        (!self.range.is_empty()).then_some(self.range.start)
    }

    /// Returns the index of the last instruction, or `None` for an empty block.
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        (!self.range.is_empty()).then(|| self.range.end - 1)
    }

    /// Returns `true` if the block covers no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Number of instructions in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Slices the owning method's instruction list to this block's run.
    #[must_use]
    pub fn instructions<'m>(&self, method: &'m Method) -> &'m [Instruction] {
        &method.instructions()[self.range.clone()]
    }

    /// Returns the terminating instruction, if the block ends in one.
    #[must_use]
    pub fn terminator<'m>(&self, method: &'m Method) -> Option<&'m Instruction> {
        let last = self.last_index()?;
        let instr = &method.instructions()[last];
        instr.is_terminator().then_some(instr)
    }

    /// Successor edges in insertion order (normal edges first, handler edges
    /// appended by the builder).
    #[must_use]
    pub fn successors(&self) -> &[(BlockId, EdgeKind)] {
        &self.successors
    }

    /// Predecessor block IDs.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Successors reached by normal (non-exceptional) control flow.
    pub fn normal_successors(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.successors
            .iter()
            .filter(|(_, kind)| !kind.is_exceptional())
            .map(|(id, _)| *id)
    }

    pub(crate) fn add_successor(&mut self, target: BlockId, kind: EdgeKind) {
        if !self.successors.iter().any(|(t, k)| *t == target && *k == kind) {
            self.successors.push((target, kind));
        }
    }

    pub(crate) fn add_predecessor(&mut self, source: BlockId) {
        if !self.predecessors.contains(&source) {
            self.predecessors.push(source);
        }
    }
}
