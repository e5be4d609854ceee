//! Natural loop detection and classification.
//!
//! A natural loop is a strongly connected region with a single entry point
//! (the header, which dominates every member). Loops are found from back
//! edges: an edge `latch -> header` where the header dominates the latch. The
//! body is collected by reverse reachability from the latch without passing
//! through the header.
//!
//! # Loop Kinds
//!
//! - **While** (pre-tested): the exit condition sits at the header
//! - **DoWhile** (post-tested): the exit condition sits at a latch
//! - **Infinite**: no edge leaves the loop body
//! - **Irreducible**: multiple entries; reported so structuring can degrade
//!   with a diagnostic instead of failing the method

use std::collections::BTreeSet;

use crate::cfg::{BlockId, ControlFlowGraph};

/// Classification of a recovered loop shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum LoopKind {
    /// Pre-tested loop: `while (cond) { body }`.
    While,
    /// Post-tested loop: `do { body } while (cond)`.
    DoWhile,
    /// No exit edges: `while (true) { body }`.
    Infinite,
    /// Multiple-entry loop; rendered as-is with a diagnostic.
    Irreducible,
}

/// Information about one natural loop in the CFG.
///
/// The body is kept as an ordered set so iteration over loop members is
/// deterministic across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaturalLoop {
    /// The header block (single entry point, dominates all members).
    pub header: BlockId,
    /// All member blocks, including the header.
    pub body: BTreeSet<BlockId>,
    /// Back edge sources within the loop.
    pub latches: Vec<BlockId>,
    /// Exit edges `(from inside, to outside)`.
    pub exits: Vec<(BlockId, BlockId)>,
    /// Shape classification.
    pub kind: LoopKind,
}

impl NaturalLoop {
    /// Returns `true` if the loop contains the given block.
    #[must_use]
    pub fn contains(&self, block: BlockId) -> bool {
        self.body.contains(&block)
    }

    /// Number of member blocks including the header.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the header carries an exit edge (pre-tested shape).
    #[must_use]
    pub fn header_is_exiting(&self) -> bool {
        self.exits.iter().any(|(from, _)| *from == self.header)
    }
}

/// Detects all natural loops in the CFG.
///
/// Back edges whose target does not dominate their source indicate an
/// irreducible region; these produce a loop record with
/// [`LoopKind::Irreducible`] and a body approximated by the enclosing
/// strongly connected component, so the structural analyzer can report it.
///
/// Loops sharing a header are merged (multiple back edges into one header are
/// one source-level loop). Results are ordered by header ID.
#[must_use]
pub fn detect_loops(cfg: &ControlFlowGraph) -> Vec<NaturalLoop> {
    let dom = cfg.dominators();
    let mut loops: Vec<NaturalLoop> = Vec::new();

    for block in cfg.blocks() {
        for (succ, _) in block.successors() {
            let header = *succ;
            let latch = block.id();
            if dom.dominates(header, latch) {
                // Natural back edge
                let body = collect_body(cfg, header, latch);
                match loops.iter_mut().find(|l| l.header == header) {
                    Some(existing) => {
                        existing.latches.push(latch);
                        existing.body.extend(body);
                    }
                    None => loops.push(NaturalLoop {
                        header,
                        body,
                        latches: vec![latch],
                        exits: Vec::new(),
                        kind: LoopKind::Infinite,
                    }),
                }
            } else if header != latch
                && dom.is_reachable(header)
                && dom.is_reachable(latch)
                && in_same_scc(cfg, header, latch)
                && !loops.iter().any(|l| l.kind == LoopKind::Irreducible && l.contains(latch))
            {
                // Retreating edge into a region the target does not dominate:
                // irreducible entry.
                let mut body = BTreeSet::new();
                body.insert(header);
                body.insert(latch);
                loops.push(NaturalLoop {
                    header,
                    body,
                    latches: vec![latch],
                    exits: Vec::new(),
                    kind: LoopKind::Irreducible,
                });
            }
        }
    }

    // Classify and collect exits
    for natural in &mut loops {
        if natural.kind == LoopKind::Irreducible {
            continue;
        }
        for &member in &natural.body {
            if let Some(block) = cfg.block(member) {
                for (succ, _) in block.successors() {
                    if !natural.body.contains(succ) {
                        natural.exits.push((member, *succ));
                    }
                }
            }
        }
        natural.kind = classify(natural);
    }

    loops.sort_by_key(|l| l.header);
    loops
}

/// Collects the loop body by reverse reachability from the latch, stopping at
/// the header.
fn collect_body(cfg: &ControlFlowGraph, header: BlockId, latch: BlockId) -> BTreeSet<BlockId> {
    let mut body = BTreeSet::new();
    body.insert(header);
    body.insert(latch);

    let mut stack = vec![latch];
    while let Some(node) = stack.pop() {
        if node == header {
            continue;
        }
        if let Some(block) = cfg.block(node) {
            for &pred in block.predecessors() {
                if body.insert(pred) {
                    stack.push(pred);
                }
            }
        }
    }
    body
}

fn classify(natural: &NaturalLoop) -> LoopKind {
    if natural.exits.is_empty() {
        return LoopKind::Infinite;
    }
    if natural.header_is_exiting() {
        return LoopKind::While;
    }
    if natural
        .exits
        .iter()
        .any(|(from, _)| natural.latches.contains(from))
    {
        return LoopKind::DoWhile;
    }
    // Exit from the middle of the body: render as an infinite loop with a
    // break inside.
    LoopKind::Infinite
}

/// Cheap mutual-reachability test used only to confirm irreducible cycles.
fn in_same_scc(cfg: &ControlFlowGraph, a: BlockId, b: BlockId) -> bool {
    reaches(cfg, a, b) && reaches(cfg, b, a)
}

fn reaches(cfg: &ControlFlowGraph, from: BlockId, to: BlockId) -> bool {
    let mut seen = vec![false; cfg.block_count()];
    let mut stack = vec![from];
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if std::mem::replace(&mut seen[node.index()], true) {
            continue;
        }
        if let Some(block) = cfg.block(node) {
            for (succ, _) in block.successors() {
                if !seen[succ.index()] {
                    stack.push(*succ);
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::testing::graph_from_edges;

    #[test]
    fn test_no_loops_in_dag() {
        let cfg = graph_from_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert!(detect_loops(&cfg).is_empty());
    }

    #[test]
    fn test_while_loop_membership() {
        // 0 -> 1(header) -> 2 -> 1, 1 -> 3(exit)
        let cfg = graph_from_edges(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let loops = detect_loops(&cfg);
        assert_eq!(loops.len(), 1);

        let natural = &loops[0];
        assert_eq!(natural.header, BlockId::new(1));
        assert_eq!(natural.latches, vec![BlockId::new(2)]);
        assert_eq!(
            natural.body.iter().copied().collect::<Vec<_>>(),
            vec![BlockId::new(1), BlockId::new(2)]
        );
        assert_eq!(natural.kind, LoopKind::While);
    }

    #[test]
    fn test_do_while_loop() {
        // 0 -> 1 -> 2, 2 -> 1 (back), 2 -> 3 (exit at latch)
        let cfg = graph_from_edges(4, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        let loops = detect_loops(&cfg);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].kind, LoopKind::DoWhile);
        assert_eq!(loops[0].size(), 2);
    }

    #[test]
    fn test_infinite_loop() {
        // 0 -> 1 -> 2 -> 1, no exits
        let cfg = graph_from_edges(3, &[(0, 1), (1, 2), (2, 1)]);
        let loops = detect_loops(&cfg);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].kind, LoopKind::Infinite);
    }

    #[test]
    fn test_nested_loops_share_nothing() {
        // outer: 1 -> 2 -> 3 -> 1, inner: 2 -> 4 -> 2; exits 1 -> 5
        let cfg = graph_from_edges(6, &[(0, 1), (1, 2), (2, 4), (4, 2), (2, 3), (3, 1), (1, 5)]);
        let loops = detect_loops(&cfg);
        assert_eq!(loops.len(), 2);

        let outer = loops.iter().find(|l| l.header == BlockId::new(1)).unwrap();
        let inner = loops.iter().find(|l| l.header == BlockId::new(2)).unwrap();
        assert!(outer.body.contains(&BlockId::new(4)));
        assert_eq!(
            inner.body.iter().copied().collect::<Vec<_>>(),
            vec![BlockId::new(2), BlockId::new(4)]
        );
    }

    #[test]
    fn test_irreducible_two_entry_cycle() {
        // 0 branches to both 1 and 2, which form a cycle between them.
        let cfg = graph_from_edges(3, &[(0, 1), (0, 2), (1, 2), (2, 1)]);
        let loops = detect_loops(&cfg);
        assert!(loops.iter().any(|l| l.kind == LoopKind::Irreducible));
    }

    #[test]
    fn test_self_loop() {
        // 0 -> 1 -> 1, 1 -> 2
        let cfg = graph_from_edges(3, &[(0, 1), (1, 1), (1, 2)]);
        let loops = detect_loops(&cfg);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].header, BlockId::new(1));
        assert_eq!(loops[0].latches, vec![BlockId::new(1)]);
        assert_eq!(loops[0].kind, LoopKind::While);
    }
}
