//! Def-use chains over the CFG.
//!
//! Reaching-definition dataflow links every register use to the set of
//! definitions that may reach it. The chains are the substrate for both type
//! constraint propagation and register-version merging: two definitions of
//! the same register that reach a common use must describe the same variable.
//!
//! All iteration is in instruction/block index order, so chain construction
//! is deterministic for identical inputs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    cfg::ControlFlowGraph,
    ir::{JavaType, Method, Reg},
};

/// Identifier of one register definition site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefId(pub(crate) usize);

impl DefId {
    /// Returns the raw index into the definition table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Where a definition comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DefSite {
    /// Declared parameter (including the implicit receiver), live at entry.
    Param {
        /// Position in the rendered parameter list.
        position: usize,
        /// Declared type.
        ty: JavaType,
    },
    /// The instruction at this index defines the register.
    Instr(usize),
}

/// One register definition.
#[derive(Debug, Clone)]
pub struct Def {
    /// Identifier of this definition.
    pub id: DefId,
    /// Defined register.
    pub reg: Reg,
    /// Definition site.
    pub site: DefSite,
}

/// Def-use chains for one method.
#[derive(Debug, Default)]
pub struct DefUseChains {
    defs: Vec<Def>,
    /// Definition made by each instruction, by instruction index.
    def_at: HashMap<usize, DefId>,
    /// Reaching definitions per use site `(instruction, register)`.
    use_defs: HashMap<(usize, Reg), Vec<DefId>>,
}

impl DefUseChains {
    /// Builds chains for one method.
    ///
    /// `params` supplies the parameter registers with their declared types
    /// (see [`crate::ir::Method::param_regs`]); they become entry-live
    /// definitions.
    #[must_use]
    pub fn build(method: &Method, cfg: &ControlFlowGraph, params: &[(Reg, JavaType)]) -> Self {
        let mut chains = Self::default();

        let mut entry_state: BTreeMap<Reg, BTreeSet<DefId>> = BTreeMap::new();
        for (position, (reg, ty)) in params.iter().enumerate() {
            let id = DefId(chains.defs.len());
            chains.defs.push(Def {
                id,
                reg: *reg,
                site: DefSite::Param {
                    position,
                    ty: ty.clone(),
                },
            });
            entry_state.insert(*reg, BTreeSet::from([id]));
        }

        for (index, instr) in method.instructions().iter().enumerate() {
            if let Some(reg) = instr.def() {
                let id = DefId(chains.defs.len());
                chains.defs.push(Def {
                    id,
                    reg,
                    site: DefSite::Instr(index),
                });
                chains.def_at.insert(index, id);
            }
        }

        // Reaching definitions to a fixed point, blocks in reverse postorder.
        let block_count = cfg.block_count();
        let mut block_in: Vec<BTreeMap<Reg, BTreeSet<DefId>>> = vec![BTreeMap::new(); block_count];
        block_in[cfg.entry().index()] = entry_state;

        let order: Vec<_> = cfg.reverse_postorder().to_vec();
        loop {
            let mut changed = false;
            for &block_id in &order {
                let Some(block) = cfg.block(block_id) else {
                    continue;
                };
                let mut state = block_in[block_id.index()].clone();
                for index in block.range() {
                    let instr = &method.instructions()[index];
                    if let Some(reg) = instr.def() {
                        let id = chains.def_at[&index];
                        state.insert(reg, BTreeSet::from([id]));
                    }
                }
                for (succ, _) in block.successors() {
                    let target = &mut block_in[succ.index()];
                    for (reg, defs) in &state {
                        let entry = target.entry(*reg).or_default();
                        for def in defs {
                            changed |= entry.insert(*def);
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        // Record uses with the state replayed per block
        for &block_id in &order {
            let Some(block) = cfg.block(block_id) else {
                continue;
            };
            let mut state = block_in[block_id.index()].clone();
            for index in block.range() {
                let instr = &method.instructions()[index];
                for reg in instr.uses() {
                    let reaching: Vec<DefId> = state
                        .get(&reg)
                        .map(|set| set.iter().copied().collect())
                        .unwrap_or_default();
                    chains.use_defs.insert((index, reg), reaching);
                }
                if let Some(reg) = instr.def() {
                    let id = chains.def_at[&index];
                    state.insert(reg, BTreeSet::from([id]));
                }
            }
        }

        chains
    }

    /// All definitions, in creation order (parameters first).
    #[must_use]
    pub fn defs(&self) -> &[Def] {
        &self.defs
    }

    /// Returns the definition with the given ID.
    #[must_use]
    pub fn def(&self, id: DefId) -> &Def {
        &self.defs[id.index()]
    }

    /// Returns the definition made by the instruction at `index`, if any.
    #[must_use]
    pub fn def_at(&self, index: usize) -> Option<DefId> {
        self.def_at.get(&index).copied()
    }

    /// Returns the definitions reaching the use of `reg` at `index`.
    ///
    /// An empty slice means the register is read before any definition - a
    /// malformed-input situation the caller reports via attributes.
    #[must_use]
    pub fn reaching(&self, index: usize, reg: Reg) -> &[DefId] {
        self.use_defs
            .get(&(index, reg))
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attributes::AttributeSet,
        cfg::CfgBuilder,
        ir::{AccessFlags, CmpKind, ConstValue, Instruction, MethodSig, Opcode},
    };

    fn build(instrs: Vec<Opcode>, params: &[(Reg, JavaType)]) -> (Method, DefUseChains) {
        let method = Method::new(
            "test",
            MethodSig::void(),
            AccessFlags::STATIC,
            8,
            instrs.into_iter().map(Instruction::new).collect(),
            Vec::new(),
        );
        let mut attrs = AttributeSet::new();
        let cfg = CfgBuilder::build(&method, &mut attrs);
        let chains = DefUseChains::build(&method, &cfg, params);
        (method, chains)
    }

    #[test]
    fn test_straight_line_single_def() {
        // v0 = 1; v1 = v0; return
        let (_m, chains) = build(
            vec![
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(1),
                },
                Opcode::Move {
                    dest: Reg(1),
                    src: Reg(0),
                },
                Opcode::ReturnVoid,
            ],
            &[],
        );

        assert_eq!(chains.defs().len(), 2);
        let reaching = chains.reaching(1, Reg(0));
        assert_eq!(reaching.len(), 1);
        assert_eq!(chains.def(reaching[0]).site, DefSite::Instr(0));
    }

    #[test]
    fn test_redefinition_kills() {
        // v0 = 1; v0 = 2; v1 = v0
        let (_m, chains) = build(
            vec![
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(1),
                },
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(2),
                },
                Opcode::Move {
                    dest: Reg(1),
                    src: Reg(0),
                },
                Opcode::ReturnVoid,
            ],
            &[],
        );

        let reaching = chains.reaching(2, Reg(0));
        assert_eq!(reaching.len(), 1);
        assert_eq!(chains.def(reaching[0]).site, DefSite::Instr(1));
    }

    #[test]
    fn test_branch_merge_sees_both_defs() {
        // 0: if (v9 == 0) goto 3
        // 1: const v0, 1
        // 2: goto 4
        // 3: const v0, 2
        // 4: move v1, v0   <- both defs reach
        let (_m, chains) = build(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(9),
                    target: 3,
                },
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(1),
                },
                Opcode::Goto { target: 4 },
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(2),
                },
                Opcode::Move {
                    dest: Reg(1),
                    src: Reg(0),
                },
                Opcode::ReturnVoid,
            ],
            &[(Reg(9), JavaType::Int)],
        );

        let reaching = chains.reaching(4, Reg(0));
        assert_eq!(reaching.len(), 2);
    }

    #[test]
    fn test_param_def_reaches_use() {
        let (_m, chains) = build(
            vec![
                Opcode::Move {
                    dest: Reg(0),
                    src: Reg(7),
                },
                Opcode::ReturnVoid,
            ],
            &[(Reg(7), JavaType::Int)],
        );

        let reaching = chains.reaching(0, Reg(7));
        assert_eq!(reaching.len(), 1);
        assert!(matches!(
            chains.def(reaching[0]).site,
            DefSite::Param { position: 0, .. }
        ));
    }

    #[test]
    fn test_loop_carried_def() {
        // 0: const v0, 0
        // 1: if (v0 >= 10) goto 4   <- sees entry def and loop def
        // 2: const v0, 5
        // 3: goto 1
        // 4: return
        let (_m, chains) = build(
            vec![
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(0),
                },
                Opcode::IfZero {
                    kind: CmpKind::Ge,
                    reg: Reg(0),
                    target: 4,
                },
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Int(5),
                },
                Opcode::Goto { target: 1 },
                Opcode::ReturnVoid,
            ],
            &[],
        );

        let reaching = chains.reaching(1, Reg(0));
        assert_eq!(reaching.len(), 2, "header use must see both definitions");
    }

    #[test]
    fn test_undefined_use_is_empty() {
        let (_m, chains) = build(
            vec![
                Opcode::Move {
                    dest: Reg(0),
                    src: Reg(5),
                },
                Opcode::ReturnVoid,
            ],
            &[],
        );
        assert!(chains.reaching(0, Reg(5)).is_empty());
    }
}
