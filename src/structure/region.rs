//! Region tree: the recovered structured-control-flow representation.
//!
//! Regions live in a per-method arena owned by [`RegionTree`] and reference
//! each other (and basic blocks) exclusively by index, mirroring the CFG's
//! ownership discipline. The tree is acyclic even though the underlying CFG
//! may contain back edges: a loop is a tree node whose children are the
//! collapsed body, not a cycle.
//!
//! # Invariant
//!
//! Every basic block of the method appears in exactly one [`RegionKind::Leaf`]
//! of the final tree - no block is lost or duplicated.
//! [`RegionTree::collect_blocks`] exists so tests and the renderer can verify
//! and exploit this.

use std::fmt;

use crate::{
    cfg::{BlockId, LoopKind},
    ir::UnitName,
};

/// A strongly-typed identifier for regions within one method's region arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub(crate) usize);

impl RegionId {
    /// Creates a new `RegionId` from a raw index value.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        RegionId(index)
    }

    /// Returns the raw index value of this region identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// One `case` group of a switch region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    /// Case values sharing this body, in declaration order.
    pub keys: Vec<i32>,
    /// The case body region.
    pub body: RegionId,
    /// `true` if control falls through into the lexically next case; the
    /// renderer then omits the `break`.
    pub falls_to_next: bool,
}

/// One `catch` clause of a try/catch region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// Caught exception type; `None` renders as a catch-all.
    pub ty: Option<UnitName>,
    /// The handler body region.
    pub body: RegionId,
    /// `true` if the handler entry is unreachable (dead handler diagnostics).
    pub dead: bool,
}

/// The shape of one recovered region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionKind {
    /// A single basic block.
    Leaf {
        /// The covered block.
        block: BlockId,
    },
    /// Children execute in order.
    Sequence {
        /// Child regions in execution order.
        children: Vec<RegionId>,
    },
    /// A two-way branch with reconverging arms.
    If {
        /// Region holding the statements leading up to the condition.
        header: RegionId,
        /// The block whose terminator is the conditional branch.
        cond_block: BlockId,
        /// `true` if the source condition must be inverted so that the
        /// then-arm corresponds to the branch-taken successor.
        negate: bool,
        /// The then arm.
        then_r: RegionId,
        /// The else arm, if the branch had a non-empty one.
        else_r: Option<RegionId>,
    },
    /// A recovered loop.
    Loop {
        /// Shape classification (`While`, `DoWhile`, `Infinite`).
        kind: LoopKind,
        /// The block carrying the exit condition: the header for `While`,
        /// the latch for `DoWhile`, absent for `Infinite`.
        cond_block: Option<BlockId>,
        /// Loop members in execution order (header first for `While`).
        children: Vec<RegionId>,
    },
    /// A multi-way branch.
    Switch {
        /// Region holding the statements leading up to the selector.
        header: RegionId,
        /// The block whose terminator is the switch.
        selector_block: BlockId,
        /// Case groups in case-value order; fallthrough cases stay adjacent.
        cases: Vec<SwitchCase>,
        /// The default body, if the fall-through target was claimed.
        default: Option<RegionId>,
    },
    /// A try block with its handlers.
    TryCatch {
        /// The covered body.
        body: RegionId,
        /// Sibling catch clauses attached to the same try.
        catches: Vec<CatchClause>,
    },
    /// Unstructured fallback preserving raw control flow.
    ///
    /// Children are the partially structured remnants in layout order; the
    /// renderer labels them and spells remaining edges as comments.
    Block {
        /// Remnant regions in layout order.
        children: Vec<RegionId>,
    },
}

/// A node of the region tree.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    kind: RegionKind,
}

impl Region {
    /// Returns the region's identifier.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the region's shape.
    #[must_use]
    pub fn kind(&self) -> &RegionKind {
        &self.kind
    }
}

/// The per-method region arena plus the root of the recovered tree.
#[derive(Debug, Clone, Default)]
pub struct RegionTree {
    regions: Vec<Region>,
    root: Option<RegionId>,
}

impl RegionTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a region and returns its ID.
    pub fn alloc(&mut self, kind: RegionKind) -> RegionId {
        let id = RegionId::new(self.regions.len());
        self.regions.push(Region { id, kind });
        id
    }

    /// Returns the region with the given ID, or `None` if out of range.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    /// Returns the shape of the given region.
    ///
    /// # Panics
    ///
    /// Panics if the ID does not resolve; region IDs are only produced by
    /// [`alloc`](Self::alloc) on the same tree, so this indicates a bug.
    #[must_use]
    pub fn kind(&self, id: RegionId) -> &RegionKind {
        &self.regions[id.index()].kind
    }

    /// Mutable access to a region's shape (simplification passes).
    pub fn kind_mut(&mut self, id: RegionId) -> &mut RegionKind {
        &mut self.regions[id.index()].kind
    }

    /// Returns the number of allocated regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if no regions have been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns the root region, if structuring has completed.
    #[must_use]
    pub fn root(&self) -> Option<RegionId> {
        self.root
    }

    /// Sets the root region.
    pub fn set_root(&mut self, root: RegionId) {
        self.root = Some(root);
    }

    /// Returns the direct child regions of a region in deterministic order.
    #[must_use]
    pub fn children(&self, id: RegionId) -> Vec<RegionId> {
        match self.kind(id) {
            RegionKind::Leaf { .. } => Vec::new(),
            RegionKind::Sequence { children }
            | RegionKind::Loop { children, .. }
            | RegionKind::Block { children } => children.clone(),
            RegionKind::If {
                header,
                then_r,
                else_r,
                ..
            } => {
                let mut out = vec![*header, *then_r];
                out.extend(else_r.iter().copied());
                out
            }
            RegionKind::Switch {
                header,
                cases,
                default,
                ..
            } => {
                let mut out = vec![*header];
                out.extend(cases.iter().map(|c| c.body));
                out.extend(default.iter().copied());
                out
            }
            RegionKind::TryCatch { body, catches } => {
                let mut out = vec![*body];
                out.extend(catches.iter().map(|c| c.body));
                out
            }
        }
    }

    /// Collects every leaf block reachable from `id`, depth-first, in
    /// deterministic order. Used to check the coverage invariant.
    #[must_use]
    pub fn collect_blocks(&self, id: RegionId) -> Vec<BlockId> {
        let mut out = Vec::new();
        self.collect_into(id, &mut out);
        out
    }

    fn collect_into(&self, id: RegionId, out: &mut Vec<BlockId>) {
        if let RegionKind::Leaf { block } = self.kind(id) {
            out.push(*block);
            return;
        }
        for child in self.children(id) {
            self.collect_into(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_lookup() {
        let mut tree = RegionTree::new();
        let leaf = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(0),
        });
        assert_eq!(leaf.index(), 0);
        assert!(tree.region(leaf).is_some());
        assert!(tree.region(RegionId::new(7)).is_none());
        assert!(tree.root().is_none());
    }

    #[test]
    fn test_collect_blocks_nested() {
        let mut tree = RegionTree::new();
        let a = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(0),
        });
        let b = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(1),
        });
        let c = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(2),
        });
        let inner = tree.alloc(RegionKind::If {
            header: a,
            cond_block: BlockId::new(0),
            negate: false,
            then_r: b,
            else_r: None,
        });
        let root = tree.alloc(RegionKind::Sequence {
            children: vec![inner, c],
        });
        tree.set_root(root);

        assert_eq!(
            tree.collect_blocks(root),
            vec![BlockId::new(0), BlockId::new(1), BlockId::new(2)]
        );
    }

    #[test]
    fn test_children_switch_covers_all_parts() {
        let mut tree = RegionTree::new();
        let header = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(0),
        });
        let case0 = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(1),
        });
        let default = tree.alloc(RegionKind::Leaf {
            block: BlockId::new(2),
        });
        let switch = tree.alloc(RegionKind::Switch {
            header,
            selector_block: BlockId::new(0),
            cases: vec![SwitchCase {
                keys: vec![1],
                body: case0,
                falls_to_next: false,
            }],
            default: Some(default),
        });

        assert_eq!(tree.children(switch), vec![header, case0, default]);
        assert_eq!(tree.collect_blocks(switch).len(), 3);
    }
}
