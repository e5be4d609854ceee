//! The ordered pass pipeline and its standard passes.
//!
//! A [`PassPipeline`] is an ordered list of values implementing
//! [`DecompilePass`]. The pipeline owns ordering; fixed-point repetition is
//! explicit pass metadata ([`DecompilePass::repeat`]), not a runtime type
//! check. Attribute state written by pass *n* is visible to pass *n+1*.
//!
//! # Fault Isolation
//!
//! A pass returning an error marks the method as failed via an error
//! attribute and the pipeline skips the method's remaining passes; the
//! caller proceeds to the next method. Nothing a pass does can abort a unit.

use crate::{
    attributes::Attribute,
    cfg::CfgBuilder,
    passes::MethodContext,
    structure::{RegionAnalyzer, RegionKind, RegionTree},
    typeinf::TypeInference,
    Result,
};

/// One transformation over a method's analysis state.
///
/// Passes must be thread-safe; the pipeline itself runs a method's passes
/// strictly sequentially, but different methods run on different worker
/// threads sharing the pass objects.
pub trait DecompilePass: Send + Sync {
    /// Unique name for diagnostics.
    fn name(&self) -> &'static str;

    /// `true` if the pass must re-run until it reports no further changes.
    fn repeat(&self) -> bool {
        false
    }

    /// Runs the pass. Returns `true` if the context changed.
    ///
    /// # Errors
    ///
    /// An error marks the method as failed; it never propagates further.
    fn run(&self, ctx: &mut MethodContext<'_>) -> Result<bool>;
}

/// Builds the control flow graph.
pub struct BuildCfg;

impl DecompilePass for BuildCfg {
    fn name(&self) -> &'static str {
        "cfg"
    }

    fn run(&self, ctx: &mut MethodContext<'_>) -> Result<bool> {
        let cfg = CfgBuilder::build(ctx.method, &mut ctx.attributes);
        ctx.cfg = Some(cfg);
        Ok(true)
    }
}

/// Recovers the region tree from the CFG.
pub struct RecoverRegions;

impl DecompilePass for RecoverRegions {
    fn name(&self) -> &'static str {
        "regions"
    }

    fn run(&self, ctx: &mut MethodContext<'_>) -> Result<bool> {
        let Some(cfg) = ctx.cfg.as_ref() else {
            return Err(crate::Error::PassError {
                pass: self.name(),
                message: "no CFG available".to_string(),
            });
        };
        let tree = RegionAnalyzer::analyze(ctx.method, cfg, &ctx.limits, &mut ctx.attributes);
        ctx.regions = Some(tree);
        Ok(true)
    }
}

/// Infers register types and binds variables.
pub struct InferTypes;

impl DecompilePass for InferTypes {
    fn name(&self) -> &'static str {
        "typeinf"
    }

    fn run(&self, ctx: &mut MethodContext<'_>) -> Result<bool> {
        let Some(cfg) = ctx.cfg.as_ref() else {
            return Err(crate::Error::PassError {
                pass: self.name(),
                message: "no CFG available".to_string(),
            });
        };
        let vars = TypeInference::run(
            ctx.method,
            ctx.unit.name(),
            cfg,
            ctx.symbols,
            &mut ctx.attributes,
        );
        ctx.variables = Some(vars);
        Ok(true)
    }
}

/// Region-tree cleanup: flattens single-child sequences and drops empty
/// container regions. Repeats until stable - one flattening can expose
/// another.
pub struct SimplifyRegions;

impl DecompilePass for SimplifyRegions {
    fn name(&self) -> &'static str {
        "simplify"
    }

    fn repeat(&self) -> bool {
        true
    }

    fn run(&self, ctx: &mut MethodContext<'_>) -> Result<bool> {
        let Some(tree) = ctx.regions.as_mut() else {
            return Ok(false);
        };
        Ok(simplify_once(tree))
    }
}

/// One simplification sweep; returns `true` if anything changed.
fn simplify_once(tree: &mut RegionTree) -> bool {
    let mut changed = false;
    for index in 0..tree.len() {
        let id = crate::structure::RegionId::new(index);
        // Only container kinds hold rewritable child lists
        let children = match tree.kind(id) {
            RegionKind::Sequence { children } | RegionKind::Block { children } => children.clone(),
            _ => continue,
        };

        let mut rewritten: Vec<crate::structure::RegionId> = Vec::with_capacity(children.len());
        for child in children {
            match tree.kind(child) {
                // Hoist nested sequences into the parent
                RegionKind::Sequence {
                    children: grandchildren,
                } => {
                    rewritten.extend(grandchildren.iter().copied());
                    changed = true;
                }
                // Drop childless containers
                RegionKind::Block { children: inner } if inner.is_empty() => {
                    changed = true;
                }
                _ => rewritten.push(child),
            }
        }

        match tree.kind_mut(id) {
            RegionKind::Sequence { children } | RegionKind::Block { children } => {
                *children = rewritten;
            }
            _ => {}
        }
    }
    changed
}

/// An ordered sequence of named passes with per-method fault isolation.
pub struct PassPipeline {
    passes: Vec<Box<dyn DecompilePass>>,
    max_fixpoint: usize,
}

impl PassPipeline {
    /// Creates a pipeline from an explicit pass list.
    #[must_use]
    pub fn new(passes: Vec<Box<dyn DecompilePass>>) -> Self {
        Self {
            passes,
            max_fixpoint: 16,
        }
    }

    /// The standard decompilation pipeline:
    /// CFG → regions → inference → simplification.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(BuildCfg),
            Box::new(RecoverRegions),
            Box::new(InferTypes),
            Box::new(SimplifyRegions),
        ])
    }

    /// Names of the passes in execution order.
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|p| p.name())
    }

    /// Runs all passes over one method's context.
    ///
    /// A failing pass attaches an error attribute and the remaining passes
    /// for this method are skipped; the method still renders through the
    /// fallback path.
    pub fn run(&self, ctx: &mut MethodContext<'_>) {
        for pass in &self.passes {
            let budget = if pass.repeat() { self.max_fixpoint } else { 1 };
            for _ in 0..budget {
                match pass.run(ctx) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => {
                        ctx.attributes.attach(Attribute::Error(format!(
                            "pass '{}' failed: {err}",
                            pass.name()
                        )));
                        return;
                    }
                }
            }
        }
    }
}

impl Default for PassPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
