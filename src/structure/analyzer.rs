//! Control-structure recovery from an arbitrary CFG.
//!
//! The analyzer converts the CFG plus its dominator tree into a [`RegionTree`]
//! by iterative graph reduction: an overlay of abstract nodes starts with one
//! node per basic block, and known shapes (loops, branches, switches,
//! sequences) repeatedly collapse matching subgraphs into single composite
//! nodes until one root remains. Exception ranges are claimed first, innermost
//! ranges before outer ones, so try/catch nesting mirrors the handler table.
//!
//! # Tie-Break Policy
//!
//! When a block could close more than one pending region (nested ifs sharing a
//! merge point), the innermost region claims it first. This falls out of the
//! pattern preconditions: a branch only collapses once its arms are single
//! overlay nodes, which forces inner shapes to fold before outer ones can
//! match.
//!
//! # Graceful Degradation
//!
//! Shapes the reducer cannot classify (irreducible graphs beyond simple
//! loops, unexpected gotos) are folded into a [`RegionKind::Block`] region
//! preserving raw edges, tagged with a warning attribute. The method still
//! renders, just with a visible marker instead of structured control flow.
//! The analyzer never fails a whole method for one badly shaped subgraph.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    attributes::{AttrFlags, Attribute, AttributeSet},
    cfg::{BlockId, ControlFlowGraph, EdgeKind, LoopKind},
    ir::{Method, Opcode},
    structure::{CatchClause, RegionId, RegionKind, RegionTree, SwitchCase},
};

/// Resource ceilings that bound structuring of pathological inputs.
///
/// Exceeding a ceiling aborts structuring for that method into the
/// unstructured fallback rendering rather than hanging.
#[derive(Debug, Clone)]
pub struct StructureLimits {
    /// Maximum instruction count per method.
    pub max_instructions: usize,
    /// Maximum basic block count per method.
    pub max_blocks: usize,
}

impl Default for StructureLimits {
    fn default() -> Self {
        Self {
            max_instructions: 65_536,
            max_blocks: 8_192,
        }
    }
}

/// One abstract node of the reduction overlay.
///
/// A node starts as a single block and grows into a composite as shapes
/// collapse; `region` always points at the structured representation of
/// everything the node has absorbed.
#[derive(Debug, Clone)]
struct OverlayNode {
    region: RegionId,
    /// Entry block of the collapsed subgraph (representative for dominance).
    head: BlockId,
    /// Block holding the terminator that currently ends this node.
    tail: BlockId,
    /// `true` while the tail's terminator has not been consumed by structure.
    cond_live: bool,
    succs: Vec<(usize, EdgeKind)>,
    preds: Vec<usize>,
    alive: bool,
}

/// Recovers nested control regions from the CFG using dominance analysis.
pub struct RegionAnalyzer<'a> {
    method: &'a Method,
    cfg: &'a ControlFlowGraph,
    tree: RegionTree,
    nodes: Vec<OverlayNode>,
}

impl<'a> RegionAnalyzer<'a> {
    /// Runs structural analysis for one method.
    ///
    /// Always returns a region tree covering every CFG block exactly once;
    /// anomalies are recorded on `attrs`.
    #[must_use]
    pub fn analyze(
        method: &'a Method,
        cfg: &'a ControlFlowGraph,
        limits: &StructureLimits,
        attrs: &mut AttributeSet,
    ) -> RegionTree {
        let mut analyzer = Self {
            method,
            cfg,
            tree: RegionTree::new(),
            nodes: Vec::with_capacity(cfg.block_count()),
        };

        if method.instructions().len() > limits.max_instructions
            || cfg.block_count() > limits.max_blocks
        {
            attrs.set_flag(AttrFlags::FALLBACK_MODE);
            attrs.attach(Attribute::StructureCeiling(limits.max_blocks));
            attrs.attach(Attribute::Warning(
                "method exceeds structuring limits; emitting raw blocks".to_string(),
            ));
            return analyzer.fallback_tree();
        }

        analyzer.init_overlay();
        analyzer.claim_try_regions(attrs);
        let orphans = analyzer.retire_unreachable();
        analyzer.reduce(None);
        analyzer.finish(orphans, attrs)
    }

    /// Whole-method fallback: one `Block` region holding every block leaf.
    fn fallback_tree(&mut self) -> RegionTree {
        let children: Vec<RegionId> = self
            .cfg
            .block_ids()
            .map(|block| self.tree.alloc(RegionKind::Leaf { block }))
            .collect();
        let root = self.tree.alloc(RegionKind::Block { children });
        self.tree.set_root(root);
        std::mem::take(&mut self.tree)
    }

    fn init_overlay(&mut self) {
        for block in self.cfg.blocks() {
            let region = self.tree.alloc(RegionKind::Leaf { block: block.id() });
            self.nodes.push(OverlayNode {
                region,
                head: block.id(),
                tail: block.id(),
                cond_live: true,
                succs: Vec::new(),
                preds: Vec::new(),
                alive: true,
            });
        }
        // Handler edges stay out of the overlay; exceptional flow is handled
        // by try-region claiming.
        for block in self.cfg.blocks() {
            let from = block.id().index();
            for (succ, kind) in block.successors() {
                if kind.is_exceptional() {
                    continue;
                }
                let to = succ.index();
                self.nodes[from].succs.push((to, *kind));
                if !self.nodes[to].preds.contains(&from) {
                    self.nodes[to].preds.push(from);
                }
            }
        }
    }

    // ---- try/catch claiming -------------------------------------------------

    fn claim_try_regions(&mut self, attrs: &mut AttributeSet) {
        let count = self.method.instructions().len();
        let mut groups: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for (idx, handler) in self.method.handlers().iter().enumerate() {
            if handler.handler >= count || handler.start >= handler.end.min(count) {
                continue; // already diagnosed by the builder
            }
            groups
                .entry((handler.start, handler.end.min(count)))
                .or_default()
                .push(idx);
        }

        // Innermost ranges first so nested tries fold before their enclosers.
        let mut ordered: Vec<((usize, usize), Vec<usize>)> = groups.into_iter().collect();
        ordered.sort_by_key(|((start, end), _)| (end - start, *start));

        for ((start, end), handler_indices) in ordered {
            self.claim_one_try(start, end, &handler_indices, attrs);
        }
    }

    fn claim_one_try(
        &mut self,
        start: usize,
        end: usize,
        handler_indices: &[usize],
        attrs: &mut AttributeSet,
    ) {
        // Nodes fully covered by the try range
        let mut try_nodes: Vec<usize> = Vec::new();
        let mut entry_node = None;
        for idx in 0..self.nodes.len() {
            if !self.nodes[idx].alive {
                continue;
            }
            let blocks = self.tree.collect_blocks(self.nodes[idx].region);
            let covered = blocks
                .iter()
                .filter_map(|b| self.cfg.block(*b))
                .filter(|b| !b.is_empty())
                .map(|b| b.range().start)
                .filter(|s| (start..end).contains(s))
                .count();
            let total = blocks
                .iter()
                .filter_map(|b| self.cfg.block(*b))
                .filter(|b| !b.is_empty())
                .count();
            if covered == 0 {
                continue;
            }
            if covered < total {
                attrs.attach(Attribute::Warning(format!(
                    "exception range {start}..{end} partially overlaps recovered structure; try/catch not reconstructed"
                )));
                return;
            }
            if blocks
                .iter()
                .any(|b| self.cfg.block(*b).is_some_and(|b| b.range().start == start))
            {
                entry_node = Some(idx);
            }
            try_nodes.push(idx);
        }
        let Some(entry_node) = entry_node else {
            attrs.attach(Attribute::Warning(format!(
                "exception range {start}..{end} has no entry block; try/catch not reconstructed"
            )));
            return;
        };

        // Handler node sets, dominance-claimed per handler in table order
        let dom = self.cfg.dominators();
        let mut claimed: BTreeSet<usize> = try_nodes.iter().copied().collect();
        let mut catches: Vec<CatchClause> = Vec::new();
        let mut all_members: Vec<usize> = try_nodes.clone();

        for &hidx in handler_indices {
            let handler = &self.method.handlers()[hidx];
            let Some(entry_block) = self.block_at(handler.handler) else {
                continue;
            };
            let mut members: Vec<usize> = Vec::new();
            for idx in 0..self.nodes.len() {
                if !self.nodes[idx].alive || claimed.contains(&idx) {
                    continue;
                }
                let blocks = self.tree.collect_blocks(self.nodes[idx].region);
                if !blocks.is_empty() && blocks.iter().all(|b| dom.dominates(entry_block, *b)) {
                    members.push(idx);
                }
            }
            let dead = !dom.is_reachable(entry_block);
            if dead {
                attrs.set_flag(AttrFlags::DEAD_HANDLER);
                attrs.attach(Attribute::Warning(format!(
                    "handler at instruction {} is unreachable",
                    handler.handler
                )));
                // Attach the handler entry anyway so the clause is visible.
                let entry_idx = entry_block.index();
                if self.nodes[entry_idx].alive && !claimed.contains(&entry_idx) {
                    members.push(entry_idx);
                }
            }
            if members.is_empty() {
                continue;
            }
            claimed.extend(members.iter().copied());
            all_members.extend(members.iter().copied());

            let entry_idx = members
                .iter()
                .copied()
                .find(|&m| self.nodes[m].head == entry_block)
                .unwrap_or(members[0]);
            let body = self.reduce_to_single(&members, entry_idx, attrs);
            catches.push(CatchClause {
                ty: handler.catch_type.clone(),
                body,
                dead,
            });
        }

        let body = self.reduce_to_single(&try_nodes, entry_node, attrs);
        let region = self.tree.alloc(RegionKind::TryCatch { body, catches });
        self.collapse(&all_members, entry_node, region, None);
    }

    /// Reduces a member set to one region, wrapping leftovers in a `Block`.
    fn reduce_to_single(
        &mut self,
        members: &[usize],
        entry: usize,
        attrs: &mut AttributeSet,
    ) -> RegionId {
        let set: BTreeSet<usize> = members.iter().copied().collect();
        self.reduce(Some(&set));

        let mut remaining: Vec<usize> = set
            .iter()
            .copied()
            .filter(|&idx| self.nodes[idx].alive)
            .collect();
        if remaining.len() == 1 {
            return self.nodes[remaining[0]].region;
        }

        // Put the entry first, the rest in layout order.
        remaining.sort_by_key(|&idx| (idx != entry, self.nodes[idx].head));
        attrs.attach(Attribute::Warning(
            "unable to recover structured control flow; emitting raw blocks".to_string(),
        ));
        let children: Vec<RegionId> = remaining.iter().map(|&idx| self.nodes[idx].region).collect();
        let region = self.tree.alloc(RegionKind::Block { children });
        // Collapse the stragglers into the entry slot so the caller sees one node.
        self.collapse(&remaining, entry, region, None);
        self.nodes[entry].region
    }

    // ---- unreachable code ---------------------------------------------------

    /// Removes unreachable nodes from the overlay so their dangling edges do
    /// not block pattern matching; returns them for the trailing orphan block.
    fn retire_unreachable(&mut self) -> Vec<RegionId> {
        let dom = self.cfg.dominators();
        let mut orphans = Vec::new();
        for idx in 0..self.nodes.len() {
            if !self.nodes[idx].alive {
                continue;
            }
            if !dom.is_reachable(self.nodes[idx].head) {
                orphans.push(self.nodes[idx].region);
                self.nodes[idx].alive = false;
                let succs = self.nodes[idx].succs.clone();
                for (succ, _) in succs {
                    self.nodes[succ].preds.retain(|&p| p != idx);
                }
                let preds = self.nodes[idx].preds.clone();
                for pred in preds {
                    self.nodes[pred].succs.retain(|(t, _)| *t != idx);
                }
            }
        }
        orphans
    }

    // ---- reduction ----------------------------------------------------------

    fn reduce(&mut self, members: Option<&BTreeSet<usize>>) {
        loop {
            if self.alive_in(members).count() <= 1 {
                return;
            }
            let step = self.try_self_loop(members)
                || self.try_binary_loop(members)
                || self.try_if_then(members)
                || self.try_if_then_else(members)
                || self.try_switch(members)
                || self.try_trivial_arm(members)
                || self.try_sequence(members);
            if !step {
                return;
            }
        }
    }

    fn alive_in<'s>(
        &'s self,
        members: Option<&'s BTreeSet<usize>>,
    ) -> impl Iterator<Item = usize> + 's {
        (0..self.nodes.len()).filter(move |&idx| {
            self.nodes[idx].alive && members.map_or(true, |set| set.contains(&idx))
        })
    }

    fn in_scope(&self, members: Option<&BTreeSet<usize>>, idx: usize) -> bool {
        self.nodes[idx].alive && members.map_or(true, |set| set.contains(&idx))
    }

    /// Distinct normal successors of a node, in edge order.
    fn distinct_succs(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for (target, _) in &self.nodes[idx].succs {
            if !out.contains(target) {
                out.push(*target);
            }
        }
        out
    }

    fn has_edge(&self, from: usize, to: usize) -> bool {
        self.nodes[from].succs.iter().any(|(t, _)| *t == to)
    }

    fn edge_kind(&self, from: usize, to: usize) -> Option<EdgeKind> {
        self.nodes[from]
            .succs
            .iter()
            .find(|(t, _)| *t == to)
            .map(|(_, k)| *k)
    }

    fn tail_is_conditional(&self, idx: usize) -> bool {
        let node = &self.nodes[idx];
        node.cond_live
            && self
                .cfg
                .block(node.tail)
                .and_then(|b| b.terminator(self.method))
                .is_some_and(crate::ir::Instruction::is_conditional_branch)
    }

    fn tail_is_switch(&self, idx: usize) -> bool {
        let node = &self.nodes[idx];
        node.cond_live
            && self
                .cfg
                .block(node.tail)
                .and_then(|b| b.terminator(self.method))
                .is_some_and(|i| matches!(i.opcode(), Opcode::Switch { .. }))
    }

    fn block_at(&self, instruction: usize) -> Option<BlockId> {
        self.cfg.block_at(instruction)
    }

    /// Collapses `members` into the `into` slot with the given region.
    ///
    /// `cond` carries the tail whose terminator remains live, or `None` when
    /// the pattern consumed it.
    fn collapse(&mut self, members: &[usize], into: usize, region: RegionId, cond: Option<BlockId>) {
        let member_set: BTreeSet<usize> = members.iter().copied().collect();

        let mut external_preds: Vec<usize> = Vec::new();
        let mut external_succs: Vec<(usize, EdgeKind)> = Vec::new();
        for &m in members {
            for &p in &self.nodes[m].preds {
                if !member_set.contains(&p) && !external_preds.contains(&p) {
                    external_preds.push(p);
                }
            }
            for &(t, kind) in &self.nodes[m].succs {
                if !member_set.contains(&t) && !external_succs.iter().any(|(et, _)| *et == t) {
                    external_succs.push((t, kind));
                }
            }
        }
        external_preds.sort_unstable();
        external_succs.sort_unstable_by_key(|(t, _)| *t);

        for &p in &external_preds {
            let mut seen = BTreeSet::new();
            let succs = std::mem::take(&mut self.nodes[p].succs);
            self.nodes[p].succs = succs
                .into_iter()
                .map(|(t, kind)| {
                    if member_set.contains(&t) {
                        (into, kind)
                    } else {
                        (t, kind)
                    }
                })
                .filter(|(t, _)| seen.insert(*t))
                .collect();
        }
        for &(t, _) in &external_succs {
            let mut seen = BTreeSet::new();
            let preds = std::mem::take(&mut self.nodes[t].preds);
            self.nodes[t].preds = preds
                .into_iter()
                .map(|p| if member_set.contains(&p) { into } else { p })
                .filter(|p| seen.insert(*p))
                .collect();
        }

        for &m in members {
            if m != into {
                self.nodes[m].alive = false;
                self.nodes[m].succs.clear();
                self.nodes[m].preds.clear();
            }
        }

        let node = &mut self.nodes[into];
        node.region = region;
        node.preds = external_preds;
        node.succs = external_succs;
        node.tail = cond.unwrap_or(node.head);
        node.cond_live = cond.is_some();
        node.alive = true;
    }

    fn try_self_loop(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for idx in candidates {
            if !self.has_edge(idx, idx) {
                continue;
            }
            let exits: Vec<usize> = self
                .distinct_succs(idx)
                .into_iter()
                .filter(|&t| t != idx)
                .collect();
            let node_region = self.nodes[idx].region;
            let tail = self.nodes[idx].tail;
            let region = if exits.is_empty() {
                self.tree.alloc(RegionKind::Loop {
                    kind: LoopKind::Infinite,
                    cond_block: None,
                    children: vec![node_region],
                })
            } else if self.tail_is_conditional(idx) {
                // Condition evaluated after the body: do/while shape.
                self.tree.alloc(RegionKind::Loop {
                    kind: LoopKind::DoWhile,
                    cond_block: Some(tail),
                    children: vec![node_region],
                })
            } else {
                continue;
            };
            self.collapse(&[idx], idx, region, None);
            return true;
        }
        false
    }

    fn try_binary_loop(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for u in candidates {
            for v in self.distinct_succs(u) {
                if v == u || !self.in_scope(members, v) {
                    continue;
                }
                if !self.has_edge(v, u) {
                    continue;
                }
                if self.nodes[v].preds != vec![u] {
                    continue;
                }
                let dom = self.cfg.dominators();
                if !dom.dominates(self.nodes[u].head, self.nodes[v].head) {
                    continue;
                }
                let u_exits: Vec<usize> = self
                    .distinct_succs(u)
                    .into_iter()
                    .filter(|&t| t != v && t != u)
                    .collect();
                let v_exits: Vec<usize> = self
                    .distinct_succs(v)
                    .into_iter()
                    .filter(|&t| t != u && t != v)
                    .collect();

                let (kind, cond_block) = if u_exits.is_empty() && v_exits.is_empty() {
                    (LoopKind::Infinite, None)
                } else if v_exits.is_empty() && self.tail_is_conditional(u) {
                    (LoopKind::While, Some(self.nodes[u].tail))
                } else if u_exits.is_empty() && self.tail_is_conditional(v) {
                    (LoopKind::DoWhile, Some(self.nodes[v].tail))
                } else {
                    continue;
                };

                let children = vec![self.nodes[u].region, self.nodes[v].region];
                let region = self.tree.alloc(RegionKind::Loop {
                    kind,
                    cond_block,
                    children,
                });
                self.collapse(&[u, v], u, region, None);
                return true;
            }
        }
        false
    }

    fn try_if_then(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for u in candidates {
            let succs = self.distinct_succs(u);
            if succs.len() != 2 || !self.tail_is_conditional(u) {
                continue;
            }
            for (then_idx, merge_idx) in [(succs[0], succs[1]), (succs[1], succs[0])] {
                if then_idx == u || merge_idx == u {
                    continue;
                }
                if !self.in_scope(members, then_idx) {
                    continue;
                }
                if self.nodes[then_idx].preds != vec![u] {
                    continue;
                }
                if self.has_edge(then_idx, then_idx) {
                    continue;
                }
                let arm_succs = self.distinct_succs(then_idx);
                if !arm_succs.iter().all(|&t| t == merge_idx) {
                    continue;
                }
                let negate = !matches!(self.edge_kind(u, then_idx), Some(EdgeKind::Taken));
                let region = self.tree.alloc(RegionKind::If {
                    header: self.nodes[u].region,
                    cond_block: self.nodes[u].tail,
                    negate,
                    then_r: self.nodes[then_idx].region,
                    else_r: None,
                });
                self.collapse(&[u, then_idx], u, region, None);
                return true;
            }
        }
        false
    }

    fn try_if_then_else(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for u in candidates {
            let succs = self.distinct_succs(u);
            if succs.len() != 2 || !self.tail_is_conditional(u) {
                continue;
            }
            let (a, b) = (succs[0], succs[1]);
            if a == u || b == u {
                continue;
            }
            if !self.in_scope(members, a) || !self.in_scope(members, b) {
                continue;
            }
            if self.nodes[a].preds != vec![u] || self.nodes[b].preds != vec![u] {
                continue;
            }
            if self.has_edge(a, a) || self.has_edge(b, b) {
                continue;
            }
            let mut merge: BTreeSet<usize> = self.distinct_succs(a).into_iter().collect();
            merge.extend(self.distinct_succs(b));
            if merge.len() > 1 || merge.contains(&u) {
                continue;
            }
            // Arms ordered so the then-arm is the branch-taken successor.
            let (then_idx, else_idx) = if matches!(self.edge_kind(u, a), Some(EdgeKind::Taken)) {
                (a, b)
            } else {
                (b, a)
            };
            let region = self.tree.alloc(RegionKind::If {
                header: self.nodes[u].region,
                cond_block: self.nodes[u].tail,
                negate: false,
                then_r: self.nodes[then_idx].region,
                else_r: Some(self.nodes[else_idx].region),
            });
            self.collapse(&[u, a, b], u, region, None);
            return true;
        }
        false
    }

    fn try_switch(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        'outer: for u in candidates {
            if !self.tail_is_switch(u) {
                continue;
            }

            // Case targets keyed by node, keys in declaration order
            let mut case_targets: Vec<usize> = Vec::new();
            let mut keys_of: BTreeMap<usize, Vec<i32>> = BTreeMap::new();
            let mut default_target: Option<usize> = None;
            for &(target, kind) in &self.nodes[u].succs {
                match kind {
                    EdgeKind::Case(value) => {
                        if !case_targets.contains(&target) {
                            case_targets.push(target);
                        }
                        keys_of.entry(target).or_default().push(value);
                    }
                    _ => default_target = Some(target),
                }
            }
            if case_targets.is_empty() {
                continue;
            }
            if case_targets.contains(&u) || default_target == Some(u) {
                continue;
            }
            if let Some(d) = default_target {
                if case_targets.contains(&d) {
                    // `case X:` sharing the default target; degrade
                    continue;
                }
            }

            let case_set: BTreeSet<usize> = case_targets.iter().copied().collect();
            let mut external: BTreeSet<usize> = BTreeSet::new();
            for &c in &case_targets {
                if !self.in_scope(members, c) || self.has_edge(c, c) {
                    continue 'outer;
                }
                for &p in &self.nodes[c].preds {
                    if p != u && !case_set.contains(&p) {
                        continue 'outer;
                    }
                }
                for t in self.distinct_succs(c) {
                    if !case_set.contains(&t) {
                        external.insert(t);
                    }
                }
            }
            if external.len() > 1 {
                continue;
            }
            let merge = external.into_iter().next();

            // Decide whether the fall-through target becomes a default clause
            let mut claimed_default: Option<usize> = None;
            if let Some(d) = default_target {
                if Some(d) != merge {
                    if !self.in_scope(members, d) || self.has_edge(d, d) {
                        continue;
                    }
                    let preds_ok = self.nodes[d].preds.iter().all(|&p| p == u);
                    let succs_ok = self
                        .distinct_succs(d)
                        .into_iter()
                        .all(|t| Some(t) == merge);
                    if !preds_ok || !succs_ok {
                        continue;
                    }
                    claimed_default = Some(d);
                }
            }

            // Emit cases ordered by smallest key; adjacency preserves fallthrough.
            let mut ordered: Vec<usize> = case_targets.clone();
            ordered.sort_by_key(|c| keys_of[c].iter().min().copied().unwrap_or(i32::MAX));
            let cases: Vec<SwitchCase> = ordered
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    let falls_to_next = ordered
                        .get(i + 1)
                        .is_some_and(|&next| self.has_edge(c, next));
                    SwitchCase {
                        keys: keys_of[&c].clone(),
                        body: self.nodes[c].region,
                        falls_to_next,
                    }
                })
                .collect();

            let region = self.tree.alloc(RegionKind::Switch {
                header: self.nodes[u].region,
                selector_block: self.nodes[u].tail,
                cases,
                default: claimed_default.map(|d| self.nodes[d].region),
            });
            let mut all = vec![u];
            all.extend(ordered);
            all.extend(claimed_default);
            self.collapse(&all, u, region, None);
            return true;
        }
        false
    }

    /// Folds the statement-free skip arm left behind by a collapsed
    /// try/catch: the composite exits either through the goto-over-handler
    /// block (normal completion) or straight to the merge (from a catch).
    /// Since the arm carries no statements, sequencing it is sound.
    fn try_trivial_arm(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for u in candidates {
            if self.nodes[u].cond_live {
                continue;
            }
            let succs = self.distinct_succs(u);
            if succs.len() != 2 {
                continue;
            }
            for (arm, merge) in [(succs[0], succs[1]), (succs[1], succs[0])] {
                if arm == u || merge == u || !self.in_scope(members, arm) {
                    continue;
                }
                if self.nodes[arm].preds != vec![u] || self.has_edge(arm, arm) {
                    continue;
                }
                if !self.distinct_succs(arm).iter().all(|&t| t == merge) {
                    continue;
                }
                if !self.region_is_trivial(self.nodes[arm].region) {
                    continue;
                }
                let region = self.merge_sequences(self.nodes[u].region, self.nodes[arm].region);
                self.collapse(&[u, arm], u, region, None);
                return true;
            }
        }
        false
    }

    /// `true` if the region's blocks contain no statements - only gotos/nops.
    fn region_is_trivial(&self, region: RegionId) -> bool {
        self.tree.collect_blocks(region).iter().all(|block| {
            self.cfg.block(*block).is_some_and(|b| {
                b.instructions(self.method)
                    .iter()
                    .all(|i| matches!(i.opcode(), Opcode::Goto { .. } | Opcode::Nop))
            })
        })
    }

    fn try_sequence(&mut self, members: Option<&BTreeSet<usize>>) -> bool {
        let candidates: Vec<usize> = self.alive_in(members).collect();
        for u in candidates {
            let succs = self.distinct_succs(u);
            if succs.len() != 1 {
                continue;
            }
            let v = succs[0];
            if v == u || !self.in_scope(members, v) {
                continue;
            }
            if self.nodes[v].preds != vec![u] {
                continue;
            }
            if self.has_edge(v, u) {
                continue;
            }

            let u_region = self.nodes[u].region;
            let v_region = self.nodes[v].region;
            let region = self.merge_sequences(u_region, v_region);
            let tail = self.nodes[v].tail;
            let cond = self.nodes[v].cond_live.then_some(tail);
            self.collapse(&[u, v], u, region, cond);
            return true;
        }
        false
    }

    /// Appends `next` to `prev`, flattening nested sequences as it goes.
    fn merge_sequences(&mut self, prev: RegionId, next: RegionId) -> RegionId {
        let mut tail_children = match self.tree.kind(next) {
            RegionKind::Sequence { children } => children.clone(),
            _ => vec![next],
        };
        if let RegionKind::Sequence { children } = self.tree.kind_mut(prev) {
            children.append(&mut tail_children);
            return prev;
        }
        let mut children = vec![prev];
        children.append(&mut tail_children);
        self.tree.alloc(RegionKind::Sequence { children })
    }

    // ---- finalization -------------------------------------------------------

    fn finish(mut self, orphans: Vec<RegionId>, attrs: &mut AttributeSet) -> RegionTree {
        let mut alive: Vec<usize> = self.alive_in(None).collect();
        alive.sort_by_key(|&idx| self.nodes[idx].head);

        let mut root = if alive.len() == 1 {
            self.nodes[alive[0]].region
        } else {
            attrs.attach(Attribute::Warning(
                "unable to recover structured control flow; emitting raw blocks".to_string(),
            ));
            let children: Vec<RegionId> =
                alive.iter().map(|&idx| self.nodes[idx].region).collect();
            self.tree.alloc(RegionKind::Block { children })
        };

        if !orphans.is_empty() {
            attrs.attach(Attribute::Warning(format!(
                "{} unreachable block(s) preserved after the method body",
                orphans.len()
            )));
            let orphan_block = self.tree.alloc(RegionKind::Block { children: orphans });
            root = self.tree.alloc(RegionKind::Sequence {
                children: vec![root, orphan_block],
            });
        }

        self.tree.set_root(root);
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cfg::CfgBuilder,
        ir::{
            AccessFlags, CmpKind, ConstValue, ExceptionHandler, Instruction, Method, MethodSig,
            Reg, UnitName,
        },
    };

    fn method(instrs: Vec<Opcode>, handlers: Vec<ExceptionHandler>) -> Method {
        Method::new(
            "test",
            MethodSig::void(),
            AccessFlags::STATIC,
            8,
            instrs.into_iter().map(Instruction::new).collect(),
            handlers,
        )
    }

    fn konst(dest: u16, value: i32) -> Opcode {
        Opcode::Const {
            dest: Reg(dest),
            value: ConstValue::Int(value),
        }
    }

    fn analyze(m: &Method) -> (RegionTree, AttributeSet, crate::cfg::ControlFlowGraph) {
        let mut attrs = AttributeSet::new();
        let cfg = CfgBuilder::build(m, &mut attrs);
        let tree = RegionAnalyzer::analyze(m, &cfg, &StructureLimits::default(), &mut attrs);
        (tree, attrs, cfg)
    }

    fn assert_coverage(tree: &RegionTree, cfg: &crate::cfg::ControlFlowGraph) {
        let mut blocks = tree.collect_blocks(tree.root().unwrap());
        blocks.sort_unstable();
        let expected: Vec<BlockId> = cfg.block_ids().collect();
        assert_eq!(blocks, expected, "region tree must cover every block once");
    }

    fn count_kinds(tree: &RegionTree, root: RegionId) -> (usize, usize, usize, usize) {
        // (ifs, loops, blocks, trycatches)
        let mut stack = vec![root];
        let (mut ifs, mut loops, mut blocks, mut tries) = (0, 0, 0, 0);
        while let Some(id) = stack.pop() {
            match tree.kind(id) {
                RegionKind::If { .. } => ifs += 1,
                RegionKind::Loop { .. } => loops += 1,
                RegionKind::Block { .. } => blocks += 1,
                RegionKind::TryCatch { .. } => tries += 1,
                _ => {}
            }
            stack.extend(tree.children(id));
        }
        (ifs, loops, blocks, tries)
    }

    #[test]
    fn test_straight_line_is_single_leaf() {
        let m = method(vec![konst(0, 1), Opcode::ReturnVoid], vec![]);
        let (tree, attrs, cfg) = analyze(&m);
        assert!(!attrs.is_failed());
        assert!(attrs.warnings().is_empty());
        assert!(matches!(
            tree.kind(tree.root().unwrap()),
            RegionKind::Leaf { .. }
        ));
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_if_then_else_recovery() {
        // if (v0 == 0) { v1 = 2 } else { v1 = 1 }; return
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 3,
                },
                konst(1, 1),
                Opcode::Goto { target: 4 },
                konst(1, 2),
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let (ifs, loops, blocks, _) = count_kinds(&tree, tree.root().unwrap());
        assert_eq!(ifs, 1);
        assert_eq!(loops, 0);
        assert_eq!(blocks, 0, "well-formed branch must not fall back");
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_if_then_without_else() {
        // if (v0 != 0) { v1 = 1 }; return
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 2,
                },
                konst(1, 1),
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let root = tree.root().unwrap();
        // Root is a sequence ending at the return, containing one If with a
        // negated condition (then-arm is the fall-through).
        let (ifs, _, blocks, _) = count_kinds(&tree, root);
        assert_eq!(ifs, 1);
        assert_eq!(blocks, 0);
        let mut found_negate = false;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let RegionKind::If { negate, else_r, .. } = tree.kind(id) {
                found_negate = *negate;
                assert!(else_r.is_none());
            }
            stack.extend(tree.children(id));
        }
        assert!(found_negate, "fall-through then-arm must invert the condition");
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_nested_if_shared_merge_innermost_wins() {
        // if (a) { if (b) { x } } ; return  - both ifs share the return merge
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 4,
                },
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(1),
                    target: 4,
                },
                konst(2, 1),
                konst(2, 2),
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let (ifs, _, blocks, _) = count_kinds(&tree, tree.root().unwrap());
        assert_eq!(ifs, 2, "both nested ifs must be recovered");
        assert_eq!(blocks, 0);
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_while_loop_recovery() {
        // 0: if (v0 == 0) goto 4   <- header/exit
        // 1: const v1, 1
        // 2: const v1, 2
        // 3: goto 0                <- latch
        // 4: return
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 4,
                },
                konst(1, 1),
                konst(1, 2),
                Opcode::Goto { target: 0 },
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let root = tree.root().unwrap();
        let mut loop_children_blocks = None;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let RegionKind::Loop { kind, children, .. } = tree.kind(id) {
                assert_eq!(*kind, LoopKind::While);
                let mut blocks: Vec<BlockId> = Vec::new();
                for &c in children {
                    blocks.extend(tree.collect_blocks(c));
                }
                loop_children_blocks = Some(blocks);
            }
            stack.extend(tree.children(id));
        }
        // Loop body set equals the CFG's natural loop member set exactly
        let natural = &cfg.loops()[0];
        let mut expected: Vec<BlockId> = natural.body.iter().copied().collect();
        let mut got = loop_children_blocks.expect("loop region not found");
        got.sort_unstable();
        expected.sort_unstable();
        assert_eq!(got, expected);
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_do_while_loop_recovery() {
        // 0: const v1, 1
        // 1: const v1, 2
        // 2: if (v0 != 0) goto 0   <- condition at the latch
        // 3: return
        let m = method(
            vec![
                konst(1, 1),
                konst(1, 2),
                Opcode::IfZero {
                    kind: CmpKind::Ne,
                    reg: Reg(0),
                    target: 0,
                },
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let mut kinds = Vec::new();
        let mut stack = vec![tree.root().unwrap()];
        while let Some(id) = stack.pop() {
            if let RegionKind::Loop { kind, .. } = tree.kind(id) {
                kinds.push(*kind);
            }
            stack.extend(tree.children(id));
        }
        assert_eq!(kinds, vec![LoopKind::DoWhile]);
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_switch_recovery_with_fallthrough() {
        // 0: switch v0 { 1 -> 3, 2 -> 5 }
        // 1: const v1, 0     <- default (fall-through)
        // 2: goto 7
        // 3: const v1, 1     <- case 1 ...
        // 4: goto 5          <- ... falls through to case 2
        // 5: const v1, 2     <- case 2
        // 6: goto 7
        // 7: return
        let m = method(
            vec![
                Opcode::Switch {
                    selector: Reg(0),
                    cases: vec![(1, 3), (2, 5)],
                },
                konst(1, 0),
                Opcode::Goto { target: 7 },
                konst(1, 1),
                Opcode::Goto { target: 5 },
                konst(1, 2),
                Opcode::Goto { target: 7 },
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.warnings().is_empty());
        let mut found = false;
        let mut stack = vec![tree.root().unwrap()];
        while let Some(id) = stack.pop() {
            if let RegionKind::Switch { cases, default, .. } = tree.kind(id) {
                found = true;
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[0].keys, vec![1]);
                assert!(cases[0].falls_to_next, "case 1 falls into case 2");
                assert!(!cases[1].falls_to_next);
                assert!(default.is_some());
            }
            stack.extend(tree.children(id));
        }
        assert!(found, "switch region not recovered");
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_try_catch_recovery() {
        // 0: const v0, 1          <- try { ... }
        // 1: const v0, 2
        // 2: goto 5
        // 3: const v1, 0          <- catch handler
        // 4: goto 5
        // 5: return
        let m = method(
            vec![
                konst(0, 1),
                konst(0, 2),
                Opcode::Goto { target: 5 },
                konst(1, 0),
                Opcode::Goto { target: 5 },
                Opcode::ReturnVoid,
            ],
            vec![ExceptionHandler {
                start: 0,
                end: 2,
                catch_type: Some(UnitName::new("java.lang.Exception")),
                handler: 3,
            }],
        );
        let (tree, attrs, cfg) = analyze(&m);
        let root = tree.root().unwrap();
        let (_, _, blocks, tries) = count_kinds(&tree, root);
        assert_eq!(tries, 1, "try/catch region not recovered");
        assert_eq!(blocks, 0);
        assert!(!attrs.is_failed());

        // The try body holds exactly the covered blocks, the catch exactly
        // the handler's blocks.
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let RegionKind::TryCatch { body, catches } = tree.kind(id) {
                let body_blocks = tree.collect_blocks(*body);
                for b in &body_blocks {
                    let range = cfg.block(*b).unwrap().range();
                    assert!(range.start < 2, "try body must only contain covered blocks");
                }
                assert_eq!(catches.len(), 1);
                assert!(!catches[0].dead);
                let catch_blocks = tree.collect_blocks(catches[0].body);
                for b in &catch_blocks {
                    let range = cfg.block(*b).unwrap().range();
                    assert!(range.start >= 3 && range.start <= 4);
                }
            }
            stack.extend(tree.children(id));
        }
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_irreducible_graph_degrades_to_block() {
        // 0: if (v0 == 0) goto 3
        // 1: const v1, 1
        // 2: goto 4          <- jumps into the other arm's middle
        // 3: const v1, 2
        // 4: const v1, 3     <- second entry point target
        // 5: if (v1 != 0) goto 1   <- loop with two entries
        // 6: return
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 3,
                },
                konst(1, 1),
                Opcode::Goto { target: 4 },
                konst(1, 2),
                konst(1, 3),
                Opcode::IfZero {
                    kind: CmpKind::Ne,
                    reg: Reg(1),
                    target: 1,
                },
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(!attrs.is_failed(), "degradation must not fail the method");
        assert!(
            !attrs.warnings().is_empty(),
            "irreducible shape must be diagnosed"
        );
        let (_, _, blocks, _) = count_kinds(&tree, tree.root().unwrap());
        assert!(blocks >= 1, "expected an unstructured fallback region");
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_ceiling_forces_fallback() {
        let m = method(
            vec![konst(0, 1), konst(0, 2), Opcode::ReturnVoid],
            vec![],
        );
        let mut attrs = AttributeSet::new();
        let cfg = CfgBuilder::build(&m, &mut attrs);
        let limits = StructureLimits {
            max_instructions: 1,
            max_blocks: 8,
        };
        let tree = RegionAnalyzer::analyze(&m, &cfg, &limits, &mut attrs);
        assert!(attrs.has_flag(AttrFlags::FALLBACK_MODE));
        assert!(attrs.has(crate::attributes::AttrKind::StructureCeiling));
        assert!(matches!(
            tree.kind(tree.root().unwrap()),
            RegionKind::Block { .. }
        ));
    }

    #[test]
    fn test_unreachable_code_preserved() {
        // 0: return-void
        // 1: const v0, 1   <- unreachable
        let m = method(vec![Opcode::ReturnVoid, konst(0, 1)], vec![]);
        let (tree, attrs, cfg) = analyze(&m);
        assert!(!attrs.is_failed());
        assert!(attrs
            .warnings()
            .iter()
            .any(|w| w.contains("unreachable")));
        assert_coverage(&tree, &cfg);
    }

    #[test]
    fn test_out_of_range_branch_still_structures() {
        let m = method(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(0),
                    target: 99,
                },
                Opcode::ReturnVoid,
            ],
            vec![],
        );
        let (tree, attrs, cfg) = analyze(&m);
        assert!(attrs.is_failed(), "malformed target must be recorded");
        assert!(tree.root().is_some());
        assert_coverage(&tree, &cfg);
    }
}
