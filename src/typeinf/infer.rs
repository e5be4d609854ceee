//! Register type inference and variable binding.
//!
//! Inference runs in three stages over the def-use chains:
//!
//! 1. **Version merging** - definitions of one register that reach a common
//!    use are unioned into one class; definitions with disjoint live ranges
//!    stay apart, splitting a register reused for unrelated purposes.
//! 2. **Constraint collection** - every instruction imposes type bounds on
//!    the classes of its operands (a field access constrains the receiver to
//!    the declaring type, an array store constrains the element type, ...)
//!    plus equality/element edges along copies and array accesses.
//! 3. **Fixed-point resolution** - bounds merge through the symbol table;
//!    edges propagate resolved types until stable. Genuinely ambiguous
//!    classes fall back to the most general common supertype and record a
//!    warning attribute - a conflict never aborts the method.
//!
//! All iteration is in instruction/definition index order, so the inferred
//! names and types are identical across repeated runs on the same input.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{
    attributes::{Attribute, AttributeSet},
    cfg::ControlFlowGraph,
    ir::{BinOp, ConstValue, JavaType, Method, Opcode, Reg, TypeMerge, UnitName},
    project::SymbolTable,
    typeinf::{DefId, DefSite, DefUseChains, VarId, Variable, VariableMap},
};

/// A type bound on one inference class.
#[derive(Debug, Clone)]
enum Bound {
    /// Produced by a definition with a declared type (invoke result, field
    /// load, allocation, parameter). Wins over use-site bounds.
    DefStrong(JavaType),
    /// Produced by a use site with a declared type (argument, field store,
    /// return). Consulted when no definition pins the type.
    UseStrong(JavaType),
    /// A hint (literal families, monitor operands). Weakest.
    Weak(JavaType),
}

/// A propagation edge between inference classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    /// The two classes carry the same type (copies, arithmetic operands).
    Eq(usize, usize),
    /// `array` is an array whose element type is `elem`.
    ElemOf {
        /// Class holding the array reference.
        array: usize,
        /// Class holding the element value.
        elem: usize,
    },
}

/// Register-to-variable type inference for one method.
pub struct TypeInference;

impl TypeInference {
    /// Runs inference and variable binding for one method.
    ///
    /// `owner` supplies the receiver type of instance methods. Conflicts and
    /// undefined-register reads are recorded on `attrs` as warnings.
    #[must_use]
    pub fn run(
        method: &Method,
        owner: &UnitName,
        cfg: &ControlFlowGraph,
        symbols: &SymbolTable,
        attrs: &mut AttributeSet,
    ) -> VariableMap {
        let params = method.param_regs(owner);
        let chains = DefUseChains::build(method, cfg, &params);

        // Stage 1: union register versions through shared uses
        let mut uf = UnionFind::new(chains.defs().len());
        for (index, instr) in method.instructions().iter().enumerate() {
            for reg in instr.uses() {
                let reaching = chains.reaching(index, reg);
                for pair in reaching.windows(2) {
                    uf.union(pair[0].index(), pair[1].index());
                }
                if reaching.is_empty() {
                    attrs.attach(Attribute::Warning(format!(
                        "read of undefined register {reg} at instruction {index}"
                    )));
                }
            }
        }

        // Class numbering in first-definition order for determinism
        let mut class_of_def: Vec<usize> = vec![usize::MAX; chains.defs().len()];
        let mut class_count = 0;
        let mut rep_to_class: BTreeMap<usize, usize> = BTreeMap::new();
        for def in chains.defs() {
            let rep = uf.find(def.id.index());
            let class = *rep_to_class.entry(rep).or_insert_with(|| {
                let c = class_count;
                class_count += 1;
                c
            });
            class_of_def[def.id.index()] = class;
        }

        // Stage 2: constraint collection
        let mut engine = ConstraintEngine {
            chains: &chains,
            class_of_def: &class_of_def,
            bounds: vec![Vec::new(); class_count],
            edges: Vec::new(),
        };
        for def in chains.defs() {
            if let DefSite::Param { ty, .. } = &def.site {
                engine.bound_def(def.id, Bound::DefStrong(ty.clone()));
            }
        }
        for (index, instr) in method.instructions().iter().enumerate() {
            engine.collect(index, instr.opcode(), method);
        }

        // Stage 3: resolution + propagation
        let mut resolved = vec![JavaType::Unknown; class_count];
        let mut conflicted: BTreeSet<usize> = BTreeSet::new();
        for (class, bounds) in engine.bounds.iter().enumerate() {
            resolved[class] = resolve_bounds(class, bounds, symbols, attrs, &mut conflicted);
        }

        for _ in 0..16 {
            let mut changed = false;
            for edge in &engine.edges {
                match *edge {
                    Edge::Eq(a, b) => {
                        changed |= unify(a, b, &mut resolved, symbols, attrs, &mut conflicted);
                    }
                    Edge::ElemOf { array, elem } => {
                        if let JavaType::Array(inner) = resolved[array].clone() {
                            let merged = merge_into(
                                elem,
                                &inner,
                                &mut resolved,
                                symbols,
                                attrs,
                                &mut conflicted,
                            );
                            changed |= merged;
                        } else if resolved[array] == JavaType::Unknown
                            && resolved[elem].is_known()
                        {
                            resolved[array] = JavaType::array(resolved[elem].clone());
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }

        for (class, ty) in resolved.iter_mut().enumerate() {
            if !ty.is_known() {
                attrs.attach(Attribute::Warning(format!(
                    "unable to infer a type for variable class {class}; assuming java.lang.Object"
                )));
                *ty = JavaType::Object(UnitName::object());
            } else if *ty == JavaType::Null {
                *ty = JavaType::Object(UnitName::object());
            }
        }

        Self::bind_variables(method, cfg, chains, &class_of_def, resolved, class_count)
    }

    /// Builds the variable table and the def/use binding side tables.
    fn bind_variables(
        method: &Method,
        cfg: &ControlFlowGraph,
        chains: DefUseChains,
        class_of_def: &[usize],
        resolved: Vec<JavaType>,
        class_count: usize,
    ) -> VariableMap {
        // Per-class definition lists, in definition order
        let mut defs_of_class: Vec<Vec<DefId>> = vec![Vec::new(); class_count];
        for def in chains.defs() {
            defs_of_class[class_of_def[def.id.index()]].push(def.id);
        }

        // Per-class use sites
        let mut uses_of_class: Vec<Vec<usize>> = vec![Vec::new(); class_count];
        let mut use_var_raw: Vec<((usize, Reg), usize)> = Vec::new();
        for (index, instr) in method.instructions().iter().enumerate() {
            for reg in instr.uses() {
                if let Some(&first) = chains.reaching(index, reg).first() {
                    let class = class_of_def[first.index()];
                    uses_of_class[class].push(index);
                    use_var_raw.push(((index, reg), class));
                }
            }
        }

        let block_of = |index: usize| {
            cfg.blocks()
                .find(|b| b.range().contains(&index))
                .map(|b| b.id())
        };

        let mut vars = Vec::with_capacity(class_count);
        let mut local_counter = 0usize;
        for class in 0..class_count {
            let defs = &defs_of_class[class];
            let param_position = defs.iter().find_map(|d| match &chains.def(*d).site {
                DefSite::Param { position, .. } => Some(*position),
                DefSite::Instr(_) => None,
            });
            let reg = defs
                .first()
                .map(|d| chains.def(*d).reg)
                .unwrap_or(Reg(0));

            // The implicit receiver renders as `this`; declared parameters
            // number from p0 regardless of staticness.
            let receiver = usize::from(!method.is_static());
            let (name, is_param) = match param_position {
                Some(0) if receiver == 1 => ("this".to_string(), true),
                Some(position) => (format!("p{}", position - receiver), true),
                None => {
                    let name = format!("v{local_counter}");
                    local_counter += 1;
                    (name, false)
                }
            };

            let multi_def = defs.len() > 1;
            let decl_instr = if is_param || multi_def {
                None
            } else {
                match defs.first().map(|d| &chains.def(*d).site) {
                    Some(DefSite::Instr(index)) => {
                        let def_block = block_of(*index);
                        let inline = def_block.is_some()
                            && uses_of_class[class]
                                .iter()
                                .all(|use_index| block_of(*use_index) == def_block);
                        inline.then_some(*index)
                    }
                    _ => None,
                }
            };

            vars.push(Variable::new(
                VarId(class),
                name,
                resolved[class].clone(),
                reg,
                is_param,
                multi_def,
                decl_instr,
            ));
        }

        let def_var: Vec<VarId> = class_of_def.iter().map(|&c| VarId(c)).collect();
        let use_var: HashMap<(usize, Reg), VarId> = use_var_raw
            .into_iter()
            .map(|(key, class)| (key, VarId(class)))
            .collect();

        VariableMap::new(vars, def_var, use_var, chains)
    }
}

/// Collects bounds and edges instruction by instruction.
struct ConstraintEngine<'a> {
    chains: &'a DefUseChains,
    class_of_def: &'a [usize],
    bounds: Vec<Vec<Bound>>,
    edges: Vec<Edge>,
}

impl ConstraintEngine<'_> {
    fn class_of_use(&self, index: usize, reg: Reg) -> Option<usize> {
        self.chains
            .reaching(index, reg)
            .first()
            .map(|d| self.class_of_def[d.index()])
    }

    fn class_of_instr_def(&self, index: usize) -> Option<usize> {
        self.chains
            .def_at(index)
            .map(|d| self.class_of_def[d.index()])
    }

    fn bound_def(&mut self, def: DefId, bound: Bound) {
        let class = self.class_of_def[def.index()];
        self.bounds[class].push(bound);
    }

    fn bound_def_at(&mut self, index: usize, bound: Bound) {
        if let Some(class) = self.class_of_instr_def(index) {
            self.bounds[class].push(bound);
        }
    }

    fn bound_use(&mut self, index: usize, reg: Reg, bound: Bound) {
        if let Some(class) = self.class_of_use(index, reg) {
            self.bounds[class].push(bound);
        }
    }

    fn link(&mut self, a: Option<usize>, b: Option<usize>) {
        if let (Some(a), Some(b)) = (a, b) {
            if a != b {
                self.edges.push(Edge::Eq(a, b));
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn collect(&mut self, index: usize, opcode: &Opcode, method: &Method) {
        match opcode {
            Opcode::Const { value, .. } => {
                let bound = match value {
                    ConstValue::Int(_) | ConstValue::Null => Bound::Weak(value.natural_type()),
                    _ => Bound::DefStrong(value.natural_type()),
                };
                self.bound_def_at(index, bound);
            }
            Opcode::Move { src, .. } => {
                let dest = self.class_of_instr_def(index);
                let src = self.class_of_use(index, *src);
                self.link(dest, src);
            }
            Opcode::Unary { src, .. } => {
                let dest = self.class_of_instr_def(index);
                let src = self.class_of_use(index, *src);
                self.link(dest, src);
            }
            Opcode::Binary { op, lhs, rhs, .. } => {
                let dest = self.class_of_instr_def(index);
                let lhs = self.class_of_use(index, *lhs);
                let rhs_class = self.class_of_use(index, *rhs);
                self.link(dest, lhs);
                if matches!(op, BinOp::Shl | BinOp::Shr | BinOp::Ushr) {
                    // Shift amounts are int even for long shifts
                    self.bound_use(index, *rhs, Bound::UseStrong(JavaType::Int));
                } else {
                    self.link(dest, rhs_class);
                }
            }
            Opcode::Cmp { lhs, rhs, .. } => {
                self.bound_def_at(index, Bound::DefStrong(JavaType::Int));
                let lhs = self.class_of_use(index, *lhs);
                let rhs = self.class_of_use(index, *rhs);
                self.link(lhs, rhs);
            }
            Opcode::IfCmp { lhs, rhs, .. } => {
                let lhs = self.class_of_use(index, *lhs);
                let rhs = self.class_of_use(index, *rhs);
                self.link(lhs, rhs);
            }
            Opcode::Switch { selector, .. } => {
                self.bound_use(index, *selector, Bound::UseStrong(JavaType::Int));
            }
            Opcode::Invoke {
                kind,
                method: callee,
                args,
                ..
            } => {
                let mut arg_iter = args.iter();
                if !matches!(kind, crate::ir::InvokeKind::Static) {
                    if let Some(receiver) = arg_iter.next() {
                        self.bound_use(
                            index,
                            *receiver,
                            Bound::UseStrong(JavaType::Object(callee.owner.clone())),
                        );
                    }
                }
                for (arg, ty) in arg_iter.zip(callee.params.iter()) {
                    self.bound_use(index, *arg, Bound::UseStrong(ty.clone()));
                }
                if let Some(ret) = &callee.ret {
                    self.bound_def_at(index, Bound::DefStrong(ret.clone()));
                }
            }
            Opcode::FieldGet { object, field, .. } => {
                if let Some(object) = object {
                    self.bound_use(
                        index,
                        *object,
                        Bound::UseStrong(JavaType::Object(field.owner.clone())),
                    );
                }
                self.bound_def_at(index, Bound::DefStrong(field.ty.clone()));
            }
            Opcode::FieldPut { src, object, field } => {
                if let Some(object) = object {
                    self.bound_use(
                        index,
                        *object,
                        Bound::UseStrong(JavaType::Object(field.owner.clone())),
                    );
                }
                self.bound_use(index, *src, Bound::UseStrong(field.ty.clone()));
            }
            Opcode::ArrayGet { array, index: idx, .. } => {
                let array_class = self.class_of_use(index, *array);
                let dest = self.class_of_instr_def(index);
                if let (Some(array), Some(elem)) = (array_class, dest) {
                    self.edges.push(Edge::ElemOf { array, elem });
                }
                self.bound_use(index, *idx, Bound::UseStrong(JavaType::Int));
            }
            Opcode::ArrayPut { src, array, index: idx } => {
                let array_class = self.class_of_use(index, *array);
                let src_class = self.class_of_use(index, *src);
                if let (Some(array), Some(elem)) = (array_class, src_class) {
                    self.edges.push(Edge::ElemOf { array, elem });
                }
                self.bound_use(index, *idx, Bound::UseStrong(JavaType::Int));
            }
            Opcode::ArrayLength { array, .. } => {
                self.bound_def_at(index, Bound::DefStrong(JavaType::Int));
                self.bound_use(
                    index,
                    *array,
                    Bound::Weak(JavaType::array(JavaType::Unknown)),
                );
            }
            Opcode::NewInstance { class, .. } => {
                self.bound_def_at(index, Bound::DefStrong(JavaType::Object(class.clone())));
            }
            Opcode::NewArray { size, elem, .. } => {
                self.bound_def_at(index, Bound::DefStrong(JavaType::array(elem.clone())));
                self.bound_use(index, *size, Bound::UseStrong(JavaType::Int));
            }
            Opcode::InstanceOf { reg, .. } => {
                self.bound_def_at(index, Bound::DefStrong(JavaType::Boolean));
                self.bound_use(index, *reg, Bound::Weak(JavaType::Object(UnitName::object())));
            }
            Opcode::MonitorEnter { reg } | Opcode::MonitorExit { reg } => {
                self.bound_use(index, *reg, Bound::Weak(JavaType::Object(UnitName::object())));
            }
            Opcode::MoveException { .. } => {
                self.bound_def_at(
                    index,
                    Bound::Weak(JavaType::object("java.lang.Throwable")),
                );
            }
            Opcode::Throw { reg } => {
                self.bound_use(
                    index,
                    *reg,
                    Bound::UseStrong(JavaType::object("java.lang.Throwable")),
                );
            }
            Opcode::Return { reg } => {
                if let Some(ret) = &method.sig().ret {
                    self.bound_use(index, *reg, Bound::UseStrong(ret.clone()));
                }
            }
            Opcode::Nop
            | Opcode::IfZero { .. }
            | Opcode::Goto { .. }
            | Opcode::CheckCast { .. }
            | Opcode::ReturnVoid => {}
        }
    }
}

/// Resolves one class from its bounds: definition bounds win, then use
/// bounds, then weak hints.
fn resolve_bounds(
    class: usize,
    bounds: &[Bound],
    symbols: &SymbolTable,
    attrs: &mut AttributeSet,
    conflicted: &mut BTreeSet<usize>,
) -> JavaType {
    let pick = |selected: Vec<&JavaType>,
                attrs: &mut AttributeSet,
                conflicted: &mut BTreeSet<usize>| {
        let mut acc = JavaType::Unknown;
        for ty in selected {
            match symbols.merge_types(&acc, ty) {
                TypeMerge::Merged(t) => acc = t,
                TypeMerge::Conflict(fallback) => {
                    if conflicted.insert(class) {
                        attrs.attach(Attribute::Warning(format!(
                            "type conflict: {} vs {}, using {}",
                            acc.source_name(),
                            ty.source_name(),
                            fallback.source_name()
                        )));
                    }
                    acc = fallback;
                }
            }
        }
        acc
    };

    let def_strong: Vec<&JavaType> = bounds
        .iter()
        .filter_map(|b| match b {
            Bound::DefStrong(t) => Some(t),
            _ => None,
        })
        .collect();
    if !def_strong.is_empty() {
        return pick(def_strong, attrs, conflicted);
    }
    let use_strong: Vec<&JavaType> = bounds
        .iter()
        .filter_map(|b| match b {
            Bound::UseStrong(t) => Some(t),
            _ => None,
        })
        .collect();
    if !use_strong.is_empty() {
        return pick(use_strong, attrs, conflicted);
    }
    let weak: Vec<&JavaType> = bounds
        .iter()
        .filter_map(|b| match b {
            Bound::Weak(t) => Some(t),
            _ => None,
        })
        .collect();
    pick(weak, attrs, conflicted)
}

/// Propagates a type into one class; returns `true` on change.
fn merge_into(
    class: usize,
    ty: &JavaType,
    resolved: &mut [JavaType],
    symbols: &SymbolTable,
    attrs: &mut AttributeSet,
    conflicted: &mut BTreeSet<usize>,
) -> bool {
    let current = resolved[class].clone();
    let next = match symbols.merge_types(&current, ty) {
        TypeMerge::Merged(t) => t,
        TypeMerge::Conflict(fallback) => {
            if conflicted.insert(class) {
                attrs.attach(Attribute::Warning(format!(
                    "type conflict: {} vs {}, using {}",
                    current.source_name(),
                    ty.source_name(),
                    fallback.source_name()
                )));
            }
            fallback
        }
    };
    if next != resolved[class] {
        resolved[class] = next;
        true
    } else {
        false
    }
}

/// Unifies two classes along an equality edge; returns `true` on change.
fn unify(
    a: usize,
    b: usize,
    resolved: &mut [JavaType],
    symbols: &SymbolTable,
    attrs: &mut AttributeSet,
    conflicted: &mut BTreeSet<usize>,
) -> bool {
    match (resolved[a].is_known(), resolved[b].is_known()) {
        (true, false) => {
            resolved[b] = resolved[a].clone();
            true
        }
        (false, true) => {
            resolved[a] = resolved[b].clone();
            true
        }
        (true, true) if resolved[a] != resolved[b] => {
            let tb = resolved[b].clone();
            let changed = merge_into(a, &tb, resolved, symbols, attrs, conflicted);
            let ta = resolved[a].clone();
            merge_into(b, &ta, resolved, symbols, attrs, conflicted) || changed
        }
        _ => false,
    }
}

/// Plain union-find with path halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Smaller root wins, keeping class numbering stable
            if ra < rb {
                self.parent[rb] = ra;
            } else {
                self.parent[ra] = rb;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cfg::CfgBuilder,
        ir::{AccessFlags, CmpKind, FieldRef, Instruction, InvokeKind, MethodRef, MethodSig},
    };

    fn infer(
        instrs: Vec<Opcode>,
        sig: MethodSig,
        registers: u16,
    ) -> (VariableMap, AttributeSet) {
        let method = Method::new(
            "test",
            sig,
            AccessFlags::STATIC,
            registers,
            instrs.into_iter().map(Instruction::new).collect(),
            Vec::new(),
        );
        let mut attrs = AttributeSet::new();
        let cfg = CfgBuilder::build(&method, &mut attrs);
        let symbols = SymbolTable::new();
        let owner = UnitName::new("a.Test");
        let vars = TypeInference::run(&method, &owner, &cfg, &symbols, &mut attrs);
        (vars, attrs)
    }

    fn konst(dest: u16, value: i32) -> Opcode {
        Opcode::Const {
            dest: Reg(dest),
            value: ConstValue::Int(value),
        }
    }

    #[test]
    fn test_arithmetic_is_int() {
        let (vars, attrs) = infer(
            vec![
                konst(0, 1),
                konst(1, 2),
                Opcode::Binary {
                    op: BinOp::Add,
                    dest: Reg(2),
                    lhs: Reg(0),
                    rhs: Reg(1),
                },
                Opcode::Return { reg: Reg(2) },
            ],
            MethodSig::new(vec![], Some(JavaType::Int)),
            3,
        );
        assert!(attrs.warnings().is_empty());
        for var in vars.variables() {
            assert_eq!(*var.ty(), JavaType::Int);
        }
    }

    #[test]
    fn test_field_load_types_dest() {
        let field = FieldRef {
            owner: UnitName::new("a.B"),
            name: "s".to_string(),
            ty: JavaType::object("java.lang.String"),
        };
        let (vars, _attrs) = infer(
            vec![
                Opcode::FieldGet {
                    dest: Reg(0),
                    object: None,
                    field,
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::void(),
            1,
        );
        let var = vars.var_of_def_instr(0).map(|id| vars.variable(id)).unwrap();
        assert_eq!(*var.ty(), JavaType::object("java.lang.String"));
    }

    #[test]
    fn test_register_split_two_variables() {
        // v0 = 1; v1 = v0;  v0 = "s"; invoke(v0)  - disjoint live ranges
        let callee = MethodRef {
            owner: UnitName::new("a.B"),
            name: "f".to_string(),
            params: vec![JavaType::object("java.lang.String")],
            ret: None,
        };
        let (vars, _attrs) = infer(
            vec![
                konst(0, 1),
                Opcode::Move {
                    dest: Reg(1),
                    src: Reg(0),
                },
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::String("s".to_string()),
                },
                Opcode::Invoke {
                    kind: InvokeKind::Static,
                    method: callee,
                    args: vec![Reg(0)],
                    dest: None,
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::void(),
            2,
        );

        let first = vars.var_of_def_instr(0).unwrap();
        let second = vars.var_of_def_instr(2).unwrap();
        assert_ne!(first, second, "disjoint live ranges must split the register");
        assert_eq!(*vars.variable(first).ty(), JavaType::Int);
        assert_eq!(
            *vars.variable(second).ty(),
            JavaType::object("java.lang.String")
        );
        assert_ne!(vars.variable(first).name(), vars.variable(second).name());
    }

    #[test]
    fn test_branch_merge_single_variable() {
        // if (p0 == 0) { v0 = 1 } else { v0 = 2 }; return v0
        let (vars, _attrs) = infer(
            vec![
                Opcode::IfZero {
                    kind: CmpKind::Eq,
                    reg: Reg(1),
                    target: 3,
                },
                konst(0, 1),
                Opcode::Goto { target: 4 },
                konst(0, 2),
                Opcode::Return { reg: Reg(0) },
            ],
            MethodSig::new(vec![JavaType::Int], Some(JavaType::Int)),
            2,
        );

        let a = vars.var_of_def_instr(1).unwrap();
        let b = vars.var_of_def_instr(3).unwrap();
        assert_eq!(a, b, "defs reaching a common use are one variable");
        let var = vars.variable(a);
        assert!(var.is_multi_def());
        assert_eq!(*var.ty(), JavaType::Int);
    }

    #[test]
    fn test_param_naming_and_types() {
        let (vars, _attrs) = infer(
            vec![
                Opcode::Move {
                    dest: Reg(0),
                    src: Reg(3),
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::new(vec![JavaType::Long, JavaType::Int], None),
            4,
        );
        // Params in v1 (long, wide pair v1/v2... low reg v1) - registers=4,
        // width=3, first=1: p0 at v1, p1 at v3.
        let params: Vec<_> = vars.variables().iter().filter(|v| v.is_param()).collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name(), "p0");
        assert_eq!(*params[0].ty(), JavaType::Long);
        assert_eq!(params[1].name(), "p1");
        assert_eq!(*params[1].ty(), JavaType::Int);
    }

    #[test]
    fn test_null_const_takes_reference_type() {
        let field = FieldRef {
            owner: UnitName::new("a.B"),
            name: "s".to_string(),
            ty: JavaType::object("java.lang.String"),
        };
        // v0 = null; B.s = v0
        let (vars, attrs) = infer(
            vec![
                Opcode::Const {
                    dest: Reg(0),
                    value: ConstValue::Null,
                },
                Opcode::FieldPut {
                    src: Reg(0),
                    object: None,
                    field,
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::void(),
            1,
        );
        assert!(attrs.warnings().is_empty());
        let var = vars.var_of_def_instr(0).map(|id| vars.variable(id)).unwrap();
        assert_eq!(*var.ty(), JavaType::object("java.lang.String"));
    }

    #[test]
    fn test_array_element_propagation() {
        // v0 = new int[p0]; v1 = v0[p0]
        let (vars, _attrs) = infer(
            vec![
                Opcode::NewArray {
                    dest: Reg(0),
                    size: Reg(2),
                    elem: JavaType::Int,
                },
                Opcode::ArrayGet {
                    dest: Reg(1),
                    array: Reg(0),
                    index: Reg(2),
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::new(vec![JavaType::Int], None),
            3,
        );
        let arr = vars.var_of_def_instr(0).map(|id| vars.variable(id)).unwrap();
        let elem = vars.var_of_def_instr(1).map(|id| vars.variable(id)).unwrap();
        assert_eq!(*arr.ty(), JavaType::array(JavaType::Int));
        assert_eq!(*elem.ty(), JavaType::Int);
    }

    #[test]
    fn test_conflict_falls_back_with_warning() {
        // v0 = new a.B; v0 used where unrelated c.D is required
        let callee = MethodRef {
            owner: UnitName::new("x.X"),
            name: "f".to_string(),
            params: vec![JavaType::object("c.D")],
            ret: None,
        };
        let (vars, attrs) = infer(
            vec![
                Opcode::NewInstance {
                    dest: Reg(0),
                    class: UnitName::new("a.B"),
                },
                Opcode::Invoke {
                    kind: InvokeKind::Static,
                    method: callee,
                    args: vec![Reg(0)],
                    dest: None,
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::void(),
            1,
        );
        // DefStrong(a.B) wins; the conflicting use bound is ignored, no abort
        let var = vars.var_of_def_instr(0).map(|id| vars.variable(id)).unwrap();
        assert_eq!(*var.ty(), JavaType::object("a.B"));
        assert!(!attrs.is_failed());
    }

    #[test]
    fn test_determinism_across_runs() {
        let build = || {
            infer(
                vec![
                    konst(0, 1),
                    konst(1, 2),
                    Opcode::Binary {
                        op: BinOp::Xor,
                        dest: Reg(2),
                        lhs: Reg(0),
                        rhs: Reg(1),
                    },
                    Opcode::Return { reg: Reg(2) },
                ],
                MethodSig::new(vec![], Some(JavaType::Int)),
                3,
            )
        };
        let (a, _) = build();
        let (b, _) = build();
        let names_a: Vec<_> = a.variables().iter().map(|v| v.name().to_string()).collect();
        let names_b: Vec<_> = b.variables().iter().map(|v| v.name().to_string()).collect();
        let types_a: Vec<_> = a.variables().iter().map(|v| v.ty().clone()).collect();
        let types_b: Vec<_> = b.variables().iter().map(|v| v.ty().clone()).collect();
        assert_eq!(names_a, names_b);
        assert_eq!(types_a, types_b);
    }

    #[test]
    fn test_inline_declaration_same_block_only() {
        // Straight line: def and use in one block -> inline declaration
        let (vars, _attrs) = infer(
            vec![
                konst(0, 5),
                Opcode::Move {
                    dest: Reg(1),
                    src: Reg(0),
                },
                Opcode::ReturnVoid,
            ],
            MethodSig::void(),
            2,
        );
        let var = vars.var_of_def_instr(0).map(|id| vars.variable(id)).unwrap();
        assert_eq!(var.decl_instr(), Some(0));
    }
}
