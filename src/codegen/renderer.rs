//! Rendering the structured, typed tree to Java source text.
//!
//! The renderer walks the region tree depth-first, emitting one statement per
//! instruction with variables shown by their inferred type and display name.
//! Rendering never fails: residual inconsistencies (unstructured `Block`
//! regions, ambiguous types, malformed input) are rendered as syntactically
//! valid source augmented with visible comment markers, so the output is
//! always a well-formed compilation unit even when semantically approximate.
//!
//! Structured terminators (branches, switches, gotos) are implied by the
//! surrounding region and are not emitted as statements; inside an
//! unstructured `Block` region they reappear as labeled `// goto` comments
//! preserving the raw edges.

use std::collections::BTreeSet;

use crate::{
    cfg::{BlockId, ControlFlowGraph, LoopKind},
    codegen::CodeWriter,
    ir::{AccessFlags, CmpKind, ConstValue, InvokeKind, JavaType, Opcode, Reg, Unit, UnitName},
    passes::MethodContext,
    project::ResourceMap,
    structure::{RegionId, RegionKind, RegionTree},
    typeinf::VariableMap,
};

/// Depth-first region-tree renderer for one method.
pub struct CodeRenderer<'a> {
    ctx: &'a MethodContext<'a>,
    resources: Option<&'a ResourceMap>,
    out: CodeWriter,
    /// `move-exception` instructions consumed by catch-clause headers.
    consumed: BTreeSet<usize>,
}

impl<'a> CodeRenderer<'a> {
    /// Renders one method (signature plus body) at class-member indentation.
    #[must_use]
    pub fn render_method(ctx: &'a MethodContext<'a>, resources: Option<&'a ResourceMap>) -> String {
        let mut renderer = Self {
            ctx,
            resources,
            out: CodeWriter::with_indent(1),
            consumed: BTreeSet::new(),
        };
        renderer.emit_method();
        renderer.out.finish()
    }

    /// Assembles a unit's source text from its pre-rendered method bodies.
    #[must_use]
    pub fn render_unit(unit: &Unit, method_texts: &[String]) -> String {
        let mut out = CodeWriter::new();

        let package = unit.name().package();
        if !package.is_empty() {
            out.linef(format_args!("package {package};"));
            out.blank();
        }

        for comment in unit.attributes().comments() {
            out.linef(format_args!("// {comment}"));
        }
        for warning in unit.attributes().warnings() {
            out.linef(format_args!("// warning: {warning}"));
        }

        let keyword = if unit.flags().contains(AccessFlags::INTERFACE) {
            "interface"
        } else {
            "class"
        };
        let mut decl = format!(
            "{}{} {}",
            unit.flags().source_modifiers(),
            keyword,
            unit.name().simple_name()
        );
        if let Some(superclass) = unit.superclass() {
            if *superclass != UnitName::object() {
                decl.push_str(&format!(" extends {}", class_name(superclass)));
            }
        }
        if !unit.interfaces().is_empty() {
            let names: Vec<String> = unit.interfaces().iter().map(class_name).collect();
            decl.push_str(&format!(" implements {}", names.join(", ")));
        }
        out.open(&decl);

        for field in unit.fields() {
            out.linef(format_args!(
                "{}{} {};",
                field.flags.source_modifiers(),
                type_name(&field.ty),
                field.name
            ));
        }
        if !unit.fields().is_empty() && !method_texts.is_empty() {
            out.blank();
        }

        for (index, text) in method_texts.iter().enumerate() {
            if index > 0 {
                out.blank();
            }
            out.append_raw(text);
        }

        out.close();
        out.finish()
    }

    // ---- method shell -------------------------------------------------------

    fn emit_method(&mut self) {
        let method = self.ctx.method;
        let signature = self.signature();

        if method
            .flags()
            .intersects(AccessFlags::ABSTRACT | AccessFlags::NATIVE)
        {
            self.out.line(&format!("{signature};"));
            return;
        }

        self.out.open(&signature);
        self.emit_diagnostics();
        self.emit_top_declarations();

        match (&self.ctx.regions, &self.ctx.cfg) {
            (Some(tree), Some(_)) => {
                if let Some(root) = tree.root() {
                    self.region(tree, root, false);
                }
            }
            _ => self.emit_raw_listing(),
        }

        self.out.close();
    }

    fn signature(&self) -> String {
        let method = self.ctx.method;
        let ret = method
            .sig()
            .ret
            .as_ref()
            .map_or_else(|| "void".to_string(), type_name);
        let name = if method.is_constructor() {
            self.ctx.unit.name().simple_name().to_string()
        } else {
            method.name().to_string()
        };
        let params: Vec<String> = method
            .sig()
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| format!("{} p{i}", type_name(ty)))
            .collect();

        if method.is_constructor() {
            format!(
                "{}{name}({})",
                method.flags().source_modifiers(),
                params.join(", ")
            )
        } else {
            format!(
                "{}{ret} {name}({})",
                method.flags().source_modifiers(),
                params.join(", ")
            )
        }
    }

    fn emit_diagnostics(&mut self) {
        let attrs = &self.ctx.attributes;
        for error in attrs.errors() {
            self.out.linef(format_args!("// error: {error}"));
        }
        for warning in attrs.warnings() {
            self.out.linef(format_args!("// warning: {warning}"));
        }
        for comment in attrs.comments() {
            self.out.linef(format_args!("// {comment}"));
        }
    }

    /// Variables that cannot declare at their definition site declare once at
    /// method top, which keeps degraded output scoping-correct.
    fn emit_top_declarations(&mut self) {
        let Some(vars) = &self.ctx.variables else {
            return;
        };
        for var in vars.variables() {
            if !var.is_param() && var.decl_instr().is_none() {
                self.out
                    .linef(format_args!("{} {};", type_name(var.ty()), var.name()));
            }
        }
    }

    /// Fallback when no region tree exists (pass failure before structuring):
    /// every instruction as a commented listing, still a valid body.
    fn emit_raw_listing(&mut self) {
        self.out
            .line("// decompilation did not produce a structured body; raw instructions:");
        for index in 0..self.ctx.method.instructions().len() {
            if let Some(text) = self.statement(index) {
                self.out.linef(format_args!("// {index}: {text}"));
            }
        }
    }

    // ---- region dispatch ----------------------------------------------------

    fn region(&mut self, tree: &RegionTree, id: RegionId, raw: bool) {
        match tree.kind(id).clone() {
            RegionKind::Leaf { block } => self.leaf(block, raw),
            RegionKind::Sequence { children } => {
                for child in children {
                    self.region(tree, child, raw);
                }
            }
            RegionKind::If {
                header,
                cond_block,
                negate,
                then_r,
                else_r,
            } => {
                self.region(tree, header, raw);
                let cond = self.condition(cond_block, negate);
                self.out.open(&format!("if ({cond})"));
                self.region(tree, then_r, raw);
                if let Some(else_r) = else_r {
                    self.out.chain("} else {");
                    self.region(tree, else_r, raw);
                }
                self.out.close();
            }
            RegionKind::Loop {
                kind,
                cond_block,
                children,
            } => self.loop_region(tree, id, kind, cond_block, &children, raw),
            RegionKind::Switch {
                header,
                selector_block,
                cases,
                default,
            } => {
                self.region(tree, header, raw);
                let selector = self.selector_name(selector_block);
                self.out.open(&format!("switch ({selector})"));
                for case in &cases {
                    for key in &case.keys {
                        self.out.linef(format_args!("case {key}:"));
                    }
                    self.out.push();
                    self.region(tree, case.body, raw);
                    if !case.falls_to_next && !self.region_terminates(tree, case.body) {
                        self.out.line("break;");
                    }
                    self.out.pop();
                }
                if let Some(default) = default {
                    self.out.line("default:");
                    self.out.push();
                    self.region(tree, default, raw);
                    self.out.pop();
                }
                self.out.close();
            }
            RegionKind::TryCatch { body, catches } => {
                self.out.open("try");
                self.region(tree, body, raw);
                for clause in &catches {
                    let ty = clause
                        .ty
                        .as_ref()
                        .map_or_else(|| "Throwable".to_string(), class_name);
                    let name = self.catch_var(tree, clause.body);
                    self.out.chain(&format!("}} catch ({ty} {name}) {{"));
                    if clause.dead {
                        self.out.line("// unreachable handler");
                    }
                    self.region(tree, clause.body, raw);
                }
                self.out.close();
            }
            RegionKind::Block { children } => {
                self.out
                    .line("// unable to reconstruct structured control flow; original blocks:");
                for child in children {
                    if let Some(first) = tree.collect_blocks(child).first() {
                        self.out.linef(format_args!("// L{}:", first.index()));
                    }
                    self.region(tree, child, true);
                }
            }
        }
    }

    fn loop_region(
        &mut self,
        tree: &RegionTree,
        id: RegionId,
        kind: LoopKind,
        cond_block: Option<BlockId>,
        children: &[RegionId],
        raw: bool,
    ) {
        let loop_blocks: BTreeSet<BlockId> = tree.collect_blocks(id).into_iter().collect();

        match (kind, cond_block) {
            (LoopKind::While, Some(cond)) => {
                let header = children[0];
                let compact = matches!(tree.kind(header), RegionKind::Leaf { block }
                    if self.block_len(*block) == 1);
                let continue_cond = self.loop_condition(cond, &loop_blocks, true);
                if compact {
                    self.out.open(&format!("while ({continue_cond})"));
                    for child in &children[1..] {
                        self.region(tree, *child, raw);
                    }
                    self.out.close();
                } else {
                    let exit_cond = self.loop_condition(cond, &loop_blocks, false);
                    self.out.open("while (true)");
                    self.region(tree, header, raw);
                    self.out.linef(format_args!("if ({exit_cond}) break;"));
                    for child in &children[1..] {
                        self.region(tree, *child, raw);
                    }
                    self.out.close();
                }
            }
            (LoopKind::DoWhile, Some(cond)) => {
                let continue_cond = self.loop_condition(cond, &loop_blocks, true);
                self.out.open("do");
                for child in children {
                    self.region(tree, *child, raw);
                }
                self.out
                    .close_with(&format!("}} while ({continue_cond});"));
            }
            _ => {
                self.out.open("while (true)");
                for child in children {
                    self.region(tree, *child, raw);
                }
                self.out.close();
            }
        }
    }

    fn leaf(&mut self, block: BlockId, raw: bool) {
        let Some(cfg) = &self.ctx.cfg else {
            return;
        };
        let Some(block) = cfg.block(block) else {
            return;
        };
        for index in block.range() {
            if self.consumed.contains(&index) {
                continue;
            }
            let instr = &self.ctx.method.instructions()[index];
            match instr.opcode() {
                Opcode::Goto { target } => {
                    if raw {
                        self.emit_goto_comment(cfg, *target);
                    }
                }
                Opcode::IfCmp { target, .. } | Opcode::IfZero { target, .. } => {
                    if raw {
                        let cond = self.condition_at(index, false);
                        let label = cfg.block_at(*target).map_or(usize::MAX, BlockId::index);
                        self.out
                            .linef(format_args!("// if ({cond}) goto L{label}"));
                    }
                }
                Opcode::Switch { cases, .. } => {
                    if raw {
                        for (value, target) in cases {
                            let label = cfg.block_at(*target).map_or(usize::MAX, BlockId::index);
                            self.out
                                .linef(format_args!("// case {value}: goto L{label}"));
                        }
                    }
                }
                _ => {
                    if let Some(text) = self.statement(index) {
                        self.out.line(&text);
                    }
                }
            }
        }
    }

    fn emit_goto_comment(&mut self, cfg: &ControlFlowGraph, target: usize) {
        let label = cfg.block_at(target).map_or(usize::MAX, BlockId::index);
        self.out.linef(format_args!("// goto L{label}"));
    }

    // ---- conditions ---------------------------------------------------------

    fn condition(&self, block: BlockId, negate: bool) -> String {
        let index = self
            .ctx
            .cfg
            .as_ref()
            .and_then(|cfg| cfg.block(block))
            .and_then(|b| b.last_index());
        index.map_or_else(|| "true".to_string(), |i| self.condition_at(i, negate))
    }

    fn condition_at(&self, index: usize, negate: bool) -> String {
        match self.ctx.method.instructions()[index].opcode() {
            Opcode::IfCmp { kind, lhs, rhs, .. } => {
                let kind = if negate { kind.negate() } else { *kind };
                format!(
                    "{} {} {}",
                    self.use_name(index, *lhs),
                    kind.symbol(),
                    self.use_name(index, *rhs)
                )
            }
            Opcode::IfZero { kind, reg, .. } => {
                let kind = if negate { kind.negate() } else { *kind };
                let name = self.use_name(index, *reg);
                match self.use_type(index, *reg) {
                    Some(ty) if ty.is_reference() => match kind {
                        CmpKind::Eq => format!("{name} == null"),
                        CmpKind::Ne => format!("{name} != null"),
                        _ => format!("{name} {} 0", kind.symbol()),
                    },
                    Some(JavaType::Boolean) => match kind {
                        CmpKind::Eq => format!("!{name}"),
                        CmpKind::Ne => name,
                        _ => format!("{name} {} 0", kind.symbol()),
                    },
                    _ => format!("{name} {} 0", kind.symbol()),
                }
            }
            _ => "true".to_string(),
        }
    }

    /// Condition of a loop's branch, oriented to continue (or exit) the loop.
    fn loop_condition(
        &self,
        cond_block: BlockId,
        loop_blocks: &BTreeSet<BlockId>,
        continuing: bool,
    ) -> String {
        let Some(cfg) = &self.ctx.cfg else {
            return "true".to_string();
        };
        let Some(index) = cfg.block(cond_block).and_then(|b| b.last_index()) else {
            return "true".to_string();
        };
        let taken_in_loop = self.ctx.method.instructions()[index]
            .branch_targets()
            .first()
            .and_then(|t| cfg.block_at(*t))
            .is_some_and(|b| loop_blocks.contains(&b));
        // Taken edge stays in the loop: the as-written condition continues.
        let negate = taken_in_loop != continuing;
        self.condition_at(index, negate)
    }

    // ---- statements ---------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn statement(&self, index: usize) -> Option<String> {
        let instr = &self.ctx.method.instructions()[index];
        match instr.opcode() {
            Opcode::Nop
            | Opcode::Goto { .. }
            | Opcode::IfCmp { .. }
            | Opcode::IfZero { .. }
            | Opcode::Switch { .. } => None,
            Opcode::Const { value, .. } => {
                let expr = self.const_expr(index, value);
                Some(self.assignment(index, &expr))
            }
            Opcode::Move { src, .. } => {
                let expr = self.use_name(index, *src);
                Some(self.assignment(index, &expr))
            }
            Opcode::Unary { op, src, .. } => {
                let expr = format!("{}{}", op.symbol(), self.use_name(index, *src));
                Some(self.assignment(index, &expr))
            }
            Opcode::Binary { op, lhs, rhs, .. } => {
                let expr = format!(
                    "{} {} {}",
                    self.use_name(index, *lhs),
                    op.symbol(),
                    self.use_name(index, *rhs)
                );
                Some(self.assignment(index, &expr))
            }
            Opcode::Cmp { lhs, rhs, .. } => {
                let boxed = match self.use_type(index, *lhs) {
                    Some(JavaType::Long) => "Long",
                    Some(JavaType::Float) => "Float",
                    Some(JavaType::Double) => "Double",
                    _ => "Integer",
                };
                let expr = format!(
                    "{boxed}.compare({}, {})",
                    self.use_name(index, *lhs),
                    self.use_name(index, *rhs)
                );
                Some(self.assignment(index, &expr))
            }
            Opcode::Invoke {
                kind,
                method: callee,
                args,
                dest,
            } => self.invoke_statement(index, *kind, callee, args, *dest),
            Opcode::FieldGet { object, field, .. } => {
                let target = object.map_or_else(
                    || class_name(&field.owner),
                    |reg| self.use_name(index, reg),
                );
                let expr = format!("{target}.{}", field.name);
                Some(self.assignment(index, &expr))
            }
            Opcode::FieldPut { src, object, field } => {
                let target = object.map_or_else(
                    || class_name(&field.owner),
                    |reg| self.use_name(index, reg),
                );
                Some(format!(
                    "{target}.{} = {};",
                    field.name,
                    self.use_name(index, *src)
                ))
            }
            Opcode::ArrayGet { array, index: idx, .. } => {
                let expr = format!(
                    "{}[{}]",
                    self.use_name(index, *array),
                    self.use_name(index, *idx)
                );
                Some(self.assignment(index, &expr))
            }
            Opcode::ArrayPut { src, array, index: idx } => Some(format!(
                "{}[{}] = {};",
                self.use_name(index, *array),
                self.use_name(index, *idx),
                self.use_name(index, *src)
            )),
            Opcode::ArrayLength { array, .. } => {
                let expr = format!("{}.length", self.use_name(index, *array));
                Some(self.assignment(index, &expr))
            }
            Opcode::NewInstance { dest, class } => {
                if self.constructor_for(index, *dest).is_some() {
                    // The fused constructor call renders the assignment
                    None
                } else {
                    let expr = format!("new {}()", class_name(class));
                    Some(self.assignment(index, &expr))
                }
            }
            Opcode::NewArray { size, elem, .. } => {
                let expr = self.new_array_expr(index, *size, elem);
                Some(self.assignment(index, &expr))
            }
            Opcode::CheckCast { reg, class } => {
                let name = self.use_name(index, *reg);
                Some(format!("{name} = ({}) {name};", class_name(class)))
            }
            Opcode::InstanceOf { reg, class, .. } => {
                let expr = format!(
                    "{} instanceof {}",
                    self.use_name(index, *reg),
                    class_name(class)
                );
                Some(self.assignment(index, &expr))
            }
            Opcode::MoveException { .. } => {
                // Only reachable when a handler was not claimed as a catch
                Some(self.assignment(index, "null /* move-exception */"))
            }
            Opcode::MonitorEnter { reg } => {
                Some(format!("// monitor-enter {}", self.use_name(index, *reg)))
            }
            Opcode::MonitorExit { reg } => {
                Some(format!("// monitor-exit {}", self.use_name(index, *reg)))
            }
            Opcode::Throw { reg } => Some(format!("throw {};", self.use_name(index, *reg))),
            Opcode::Return { reg } => Some(format!("return {};", self.use_name(index, *reg))),
            Opcode::ReturnVoid => Some("return;".to_string()),
        }
    }

    fn invoke_statement(
        &self,
        index: usize,
        kind: InvokeKind,
        callee: &crate::ir::MethodRef,
        args: &[Reg],
        dest: Option<Reg>,
    ) -> Option<String> {
        if callee.is_constructor() && kind == InvokeKind::Direct && !args.is_empty() {
            let receiver = self.use_name(index, args[0]);
            let rendered_args = self.arg_list(index, &args[1..]);
            if self.ctx.method.is_constructor() && receiver == "this" {
                let call = if callee.owner == *self.ctx.unit.name() {
                    "this"
                } else {
                    "super"
                };
                return Some(format!("{call}({rendered_args});"));
            }
            // When the fused NewInstance was the variable's declaration site,
            // the declaration moves onto this statement.
            let decl = self
                .vars()
                .and_then(|vars| {
                    let var = vars.variable(vars.var_of_use(index, args[0])?);
                    let site = var.decl_instr()?;
                    match self.ctx.method.instructions()[site].opcode() {
                        Opcode::NewInstance { .. }
                            if self.constructor_for(site, args[0]) == Some(index) =>
                        {
                            Some(format!("{} ", type_name(var.ty())))
                        }
                        _ => None,
                    }
                })
                .unwrap_or_default();
            return Some(format!(
                "{decl}{receiver} = new {}({rendered_args});",
                class_name(&callee.owner)
            ));
        }

        let (target, rest) = match kind {
            InvokeKind::Static => (class_name(&callee.owner), args),
            _ => (
                self.use_name(index, *args.first()?),
                args.get(1..).unwrap_or(&[]),
            ),
        };
        let call = format!("{target}.{}({})", callee.name, self.arg_list(index, rest));
        match dest {
            Some(_) => Some(self.assignment(index, &call)),
            None => Some(format!("{call};")),
        }
    }

    fn arg_list(&self, index: usize, args: &[Reg]) -> String {
        args.iter()
            .map(|reg| self.use_name(index, *reg))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Finds the constructor invocation fused with a `NewInstance`, scanning
    /// ahead within the same block.
    fn constructor_for(&self, index: usize, dest: Reg) -> Option<usize> {
        let cfg = self.ctx.cfg.as_ref()?;
        let block = cfg.block_at(index)?;
        let range = cfg.block(block)?.range();
        for next in (index + 1)..range.end {
            match self.ctx.method.instructions()[next].opcode() {
                Opcode::Invoke {
                    kind: InvokeKind::Direct,
                    method,
                    args,
                    ..
                } if method.is_constructor() && args.first() == Some(&dest) => {
                    return Some(next);
                }
                // A redefinition of the register before the constructor call
                // breaks the fusion
                op if crate::ir::Instruction::new(op.clone()).def() == Some(dest) => return None,
                _ => {}
            }
        }
        None
    }

    fn new_array_expr(&self, index: usize, size: Reg, elem: &JavaType) -> String {
        let mut base = elem;
        let mut extra_dims = String::new();
        while let JavaType::Array(inner) = base {
            base = inner;
            extra_dims.push_str("[]");
        }
        format!(
            "new {}[{}]{}",
            type_name(base),
            self.use_name(index, size),
            extra_dims
        )
    }

    fn const_expr(&self, index: usize, value: &ConstValue) -> String {
        match value {
            ConstValue::Int(v) => {
                let ty = self.def_type(index);
                match ty {
                    Some(JavaType::Boolean) => {
                        if *v == 0 { "false" } else { "true" }.to_string()
                    }
                    Some(ty) if ty.is_reference() && *v == 0 => "null".to_string(),
                    Some(JavaType::Int) => {
                        if let Some(name) = self.resources.and_then(|r| r.lookup(*v)) {
                            format!("{name} /* 0x{v:08x} */")
                        } else {
                            v.to_string()
                        }
                    }
                    _ => v.to_string(),
                }
            }
            ConstValue::Long(v) => format!("{v}L"),
            ConstValue::Float(v) => format!("{v:?}f"),
            ConstValue::Double(v) => format!("{v:?}"),
            ConstValue::String(s) => format!("\"{}\"", escape_string(s)),
            ConstValue::Class(name) => format!("{}.class", class_name(name)),
            ConstValue::Null => "null".to_string(),
        }
    }

    // ---- names and types ----------------------------------------------------

    fn vars(&self) -> Option<&VariableMap> {
        self.ctx.variables.as_ref()
    }

    fn use_name(&self, index: usize, reg: Reg) -> String {
        if let Some(vars) = self.vars() {
            if let Some(id) = vars.var_of_use(index, reg) {
                return vars.variable(id).name().to_string();
            }
        }
        reg.to_string()
    }

    fn use_type(&self, index: usize, reg: Reg) -> Option<JavaType> {
        let vars = self.vars()?;
        let id = vars.var_of_use(index, reg)?;
        Some(vars.variable(id).ty().clone())
    }

    fn def_name(&self, index: usize) -> String {
        if let Some(vars) = self.vars() {
            if let Some(id) = vars.var_of_def_instr(index) {
                return vars.variable(id).name().to_string();
            }
        }
        self.ctx.method.instructions()[index]
            .def()
            .map_or_else(|| "_".to_string(), |r| r.to_string())
    }

    fn def_type(&self, index: usize) -> Option<JavaType> {
        let vars = self.vars()?;
        let id = vars.var_of_def_instr(index)?;
        Some(vars.variable(id).ty().clone())
    }

    fn assignment(&self, index: usize, rhs: &str) -> String {
        let Some(vars) = self.vars() else {
            let dest = self.ctx.method.instructions()[index]
                .def()
                .map_or_else(|| "_".to_string(), |r| r.to_string());
            return format!("{dest} = {rhs};");
        };
        match vars.var_of_def_instr(index) {
            Some(id) => {
                let var = vars.variable(id);
                if var.decl_instr() == Some(index) {
                    format!("{} {} = {rhs};", type_name(var.ty()), var.name())
                } else {
                    format!("{} = {rhs};", var.name())
                }
            }
            None => format!("{rhs};"),
        }
    }

    fn selector_name(&self, block: BlockId) -> String {
        let index = self
            .ctx
            .cfg
            .as_ref()
            .and_then(|cfg| cfg.block(block))
            .and_then(|b| b.last_index());
        match index {
            Some(i) => match self.ctx.method.instructions()[i].opcode() {
                Opcode::Switch { selector, .. } => self.use_name(i, *selector),
                _ => "0".to_string(),
            },
            None => "0".to_string(),
        }
    }

    /// Picks the catch-parameter name from the handler's `move-exception`,
    /// consuming that instruction so the body does not render it again.
    fn catch_var(&mut self, tree: &RegionTree, body: RegionId) -> String {
        let first_block = tree.collect_blocks(body).into_iter().next();
        let first_index = first_block
            .and_then(|b| self.ctx.cfg.as_ref().and_then(|cfg| cfg.block(b)))
            .and_then(|b| b.first_index());
        if let Some(index) = first_index {
            if matches!(
                self.ctx.method.instructions()[index].opcode(),
                Opcode::MoveException { .. }
            ) {
                self.consumed.insert(index);
                return self.def_name(index);
            }
        }
        "e".to_string()
    }

    fn region_terminates(&self, tree: &RegionTree, region: RegionId) -> bool {
        let blocks = tree.collect_blocks(region);
        let Some(last) = blocks.last() else {
            return false;
        };
        self.ctx
            .cfg
            .as_ref()
            .and_then(|cfg| cfg.block(*last))
            .and_then(|b| b.terminator(self.ctx.method))
            .is_some_and(|i| {
                matches!(
                    i.opcode(),
                    Opcode::Return { .. } | Opcode::ReturnVoid | Opcode::Throw { .. }
                )
            })
    }

    fn block_len(&self, block: BlockId) -> usize {
        self.ctx
            .cfg
            .as_ref()
            .and_then(|cfg| cfg.block(block))
            .map_or(0, crate::cfg::BasicBlock::len)
    }
}

/// Renders a class name, dropping the `java.lang` prefix like source code
/// written under the default import.
fn class_name(name: &UnitName) -> String {
    if name.package() == "java.lang" {
        name.simple_name().to_string()
    } else {
        name.as_str().to_string()
    }
}

/// Renders a type as Java source, with `java.lang` stripped.
fn type_name(ty: &JavaType) -> String {
    match ty {
        JavaType::Object(name) => class_name(name),
        JavaType::Array(elem) => format!("{}[]", type_name(elem)),
        other => other.source_name(),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_name_strips_java_lang() {
        assert_eq!(class_name(&UnitName::new("java.lang.String")), "String");
        assert_eq!(class_name(&UnitName::new("a.b.C")), "a.b.C");
        assert_eq!(
            type_name(&JavaType::array(JavaType::object("java.lang.Object"))),
            "Object[]"
        );
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
