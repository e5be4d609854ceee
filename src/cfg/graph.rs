//! Control flow graph arena.
//!
//! [`ControlFlowGraph`] owns the basic blocks of one method and provides
//! access to the dominator tree, reverse postorder and natural loops.
//! Expensive analyses are computed lazily on first access and cached with
//! [`OnceLock`], so a CFG that is only rendered through the fallback path
//! never pays for dominators.
//!
//! # Thread Safety
//!
//! `ControlFlowGraph` is [`Send`] and [`Sync`]; lazily-initialized fields use
//! [`OnceLock`] for thread-safe initialization. In practice one CFG is owned
//! by one method's pipeline task and never shared.

use std::sync::OnceLock;

use crate::cfg::{detect_loops, BasicBlock, BlockId, DominatorTree, NaturalLoop};

/// A control flow graph built from one method's instruction stream.
///
/// The arena is the sole owner of blocks; every cross-reference (successor,
/// predecessor, dominator parent) is a [`BlockId`] index into the same arena.
#[derive(Debug)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
    entry: BlockId,
    dominators: OnceLock<DominatorTree>,
    rpo: OnceLock<Vec<BlockId>>,
    loops: OnceLock<Vec<NaturalLoop>>,
}

impl ControlFlowGraph {
    /// Assembles a CFG from builder output.
    pub(crate) fn from_parts(blocks: Vec<BasicBlock>, entry: BlockId) -> Self {
        Self {
            blocks,
            entry,
            dominators: OnceLock::new(),
            rpo: OnceLock::new(),
            loops: OnceLock::new(),
        }
    }

    /// Returns the entry block ID (the block containing instruction 0).
    #[must_use]
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Returns the block with the given ID, or `None` if out of range.
    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Returns the number of blocks in the arena.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates all blocks in ID (layout) order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.iter()
    }

    /// Returns the block IDs in ID (layout) order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::new)
    }

    /// Returns the dominator tree, computing it on first access.
    ///
    /// Handler edges participate in dominance, so exceptional flow is treated
    /// uniformly with normal flow during structuring.
    pub fn dominators(&self) -> &DominatorTree {
        self.dominators.get_or_init(|| {
            let (succs, preds) = self.adjacency();
            DominatorTree::compute(self.entry, &succs, &preds)
        })
    }

    /// Returns blocks in reverse postorder, computing it on first access.
    ///
    /// Unreachable blocks are appended after the reachable ones in ID order,
    /// so every arena block appears exactly once - analyses that iterate RPO
    /// still cover orphaned blocks left by malformed input.
    pub fn reverse_postorder(&self) -> &[BlockId] {
        self.rpo.get_or_init(|| {
            let mut postorder = Vec::with_capacity(self.blocks.len());
            let mut visited = vec![false; self.blocks.len()];
            // Iterative DFS with an explicit phase marker
            let mut stack = vec![(self.entry, false)];
            while let Some((node, expanded)) = stack.pop() {
                if expanded {
                    postorder.push(node);
                    continue;
                }
                if std::mem::replace(&mut visited[node.index()], true) {
                    continue;
                }
                stack.push((node, true));
                if let Some(block) = self.blocks.get(node.index()) {
                    // Reversed so the first successor is visited first
                    for (succ, _) in block.successors().iter().rev() {
                        if !visited[succ.index()] {
                            stack.push((*succ, false));
                        }
                    }
                }
            }
            postorder.reverse();
            for idx in 0..self.blocks.len() {
                if !visited[idx] {
                    postorder.push(BlockId::new(idx));
                }
            }
            postorder
        })
    }

    /// Returns the natural loops of this graph, computing them on first access.
    pub fn loops(&self) -> &[NaturalLoop] {
        self.loops.get_or_init(|| detect_loops(self))
    }

    /// Returns the block covering the given instruction index, if any.
    #[must_use]
    pub fn block_at(&self, instruction: usize) -> Option<BlockId> {
        self.blocks
            .iter()
            .find(|b| b.range().contains(&instruction))
            .map(BasicBlock::id)
    }

    /// Extracts plain adjacency lists for the dominator computation.
    fn adjacency(&self) -> (Vec<Vec<BlockId>>, Vec<Vec<BlockId>>) {
        let succs = self
            .blocks
            .iter()
            .map(|b| b.successors().iter().map(|(id, _)| *id).collect())
            .collect();
        let preds = self
            .blocks
            .iter()
            .map(|b| b.predecessors().to_vec())
            .collect();
        (succs, preds)
    }
}
