//! Decompilation orchestration.
//!
//! [`Decompiler`] drives the pass pipeline and renderer over units and
//! methods. Units are decompiled independently on a bounded worker pool, one
//! unit per task; the only shared state is the frozen [`SymbolTable`] and the
//! pass objects, both read-only during parallel execution. Within one
//! method's pipeline all stages are strictly sequential.
//!
//! # Fault Isolation
//!
//! - A failing pass marks its method failed; the unit continues.
//! - Fatal input corruption (a missing required symbol) skips the unit; other
//!   units continue.
//! - Whole-run cancellation is cooperative, checked between methods.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
    attributes::{Attribute, AttributeSet},
    codegen::CodeRenderer,
    ir::{Method, Unit, UnitName},
    passes::{MethodContext, PassPipeline},
    project::{ResourceMap, SymbolTable},
    structure::StructureLimits,
    Error, Result,
};

/// Tuning knobs for one decompilation run.
#[derive(Debug, Clone)]
pub struct DecompileOptions {
    /// Worker threads for [`Decompiler::decompile_all`]; `0` uses the global
    /// pool's default.
    pub threads: usize,
    /// Per-method instruction ceiling before structuring falls back.
    pub max_instructions: usize,
    /// Per-method basic block ceiling before structuring falls back.
    pub max_blocks: usize,
    /// Optional resource-id to symbolic-name mapping for rendering.
    pub resources: Option<ResourceMap>,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        let limits = StructureLimits::default();
        Self {
            threads: 0,
            max_instructions: limits.max_instructions,
            max_blocks: limits.max_blocks,
            resources: None,
        }
    }
}

impl DecompileOptions {
    fn limits(&self) -> StructureLimits {
        StructureLimits {
            max_instructions: self.max_instructions,
            max_blocks: self.max_blocks,
        }
    }
}

/// Rendered output plus final attribute set for one method.
#[derive(Debug)]
pub struct MethodResult {
    name: String,
    code: String,
    attributes: AttributeSet,
}

impl MethodResult {
    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The rendered source fragment.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The final attribute set.
    #[must_use]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Success means no error-class attribute is present; warning-class
    /// attributes may exist on a successful result and are surfaced in the
    /// rendered text.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.attributes.is_failed()
    }
}

/// Rendered output for one unit.
#[derive(Debug)]
pub struct UnitResult {
    name: UnitName,
    code: String,
    methods: Vec<MethodResult>,
    error: Option<String>,
}

impl UnitResult {
    fn skipped(name: UnitName, error: &Error) -> Self {
        Self {
            name: name.clone(),
            code: format!("// unit {name} skipped: {error}\n"),
            methods: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// The unit's qualified name.
    #[must_use]
    pub fn name(&self) -> &UnitName {
        &self.name
    }

    /// The rendered unit source.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Per-method results in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodResult] {
        &self.methods
    }

    /// The unit-fatal error, if the unit was skipped.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` when the unit was processed and every method succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.methods.iter().all(MethodResult::is_success)
    }
}

/// The decompilation engine.
///
/// Construct once with a populated symbol table, then decompile units from
/// any number of threads; the engine itself is immutable apart from the
/// cooperative cancellation flag.
pub struct Decompiler {
    symbols: SymbolTable,
    options: DecompileOptions,
    pipeline: PassPipeline,
    cancelled: AtomicBool,
}

impl Decompiler {
    /// Creates a decompiler with the standard pass pipeline.
    #[must_use]
    pub fn new(symbols: SymbolTable, options: DecompileOptions) -> Self {
        Self::with_pipeline(symbols, options, PassPipeline::standard())
    }

    /// Creates a decompiler with a custom pass pipeline.
    #[must_use]
    pub fn with_pipeline(
        symbols: SymbolTable,
        options: DecompileOptions,
        pipeline: PassPipeline,
    ) -> Self {
        Self {
            symbols,
            options,
            pipeline,
            cancelled: AtomicBool::new(false),
        }
    }

    /// The shared symbol table.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Requests cooperative cancellation; in-flight methods finish, further
    /// methods are skipped with an error attribute.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Decompiles one method: pipeline then renderer.
    ///
    /// Always produces a rendered fragment; failures are carried in the
    /// result's attribute set, never as an `Err`.
    #[must_use]
    pub fn decompile_method(&self, unit: &Unit, method: &Method) -> MethodResult {
        let mut ctx = MethodContext::new(unit, method, &self.symbols, self.options.limits());
        self.pipeline.run(&mut ctx);
        let code = CodeRenderer::render_method(&ctx, self.options.resources.as_ref());
        MethodResult {
            name: method.name().to_string(),
            code,
            attributes: ctx.attributes,
        }
    }

    /// Decompiles one unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] for a unit without a name, and
    /// [`Error::SymbolNotFound`] when the unit's superclass is neither
    /// registered nor a platform class - the unit-fatal corruption cases.
    /// Method-level failures never surface here.
    pub fn decompile_unit(&self, unit: &Unit) -> Result<UnitResult> {
        if unit.name().as_str().is_empty() {
            return Err(malformed_error!("unit has an empty name"));
        }
        if let Some(superclass) = unit.superclass() {
            if !self.symbols.contains(superclass) && !is_platform(superclass) {
                return Err(Error::SymbolNotFound(superclass.as_str().to_string()));
            }
        }

        let mut methods = Vec::with_capacity(unit.methods().len());
        for method in unit.methods() {
            // Cancellation is checked between methods, never mid-method
            if self.is_cancelled() {
                let mut attributes = AttributeSet::new();
                attributes.attach(Attribute::Error("cancelled before decompilation".to_string()));
                methods.push(MethodResult {
                    name: method.name().to_string(),
                    code: format!(
                        "    // {}: cancelled before decompilation\n",
                        method.name()
                    ),
                    attributes,
                });
                continue;
            }
            methods.push(self.decompile_method(unit, method));
        }

        let texts: Vec<String> = methods.iter().map(|m| m.code.clone()).collect();
        let code = CodeRenderer::render_unit(unit, &texts);
        Ok(UnitResult {
            name: unit.name().clone(),
            code,
            methods,
            error: None,
        })
    }

    /// Decompiles all units on a bounded worker pool.
    ///
    /// Results come back in input order. Unit-fatal errors are converted into
    /// skipped [`UnitResult`]s so one corrupt unit never aborts the batch.
    #[must_use]
    pub fn decompile_all(&self, units: &[Unit]) -> Vec<UnitResult> {
        let results: boxcar::Vec<(usize, UnitResult)> = boxcar::Vec::new();

        let run = || {
            units.par_iter().enumerate().for_each(|(index, unit)| {
                let result = match self.decompile_unit(unit) {
                    Ok(result) => result,
                    Err(error) => UnitResult::skipped(unit.name().clone(), &error),
                };
                results.push((index, result));
            });
        };

        if self.options.threads > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.threads)
                .build()
            {
                Ok(pool) => pool.install(run),
                Err(_) => run(),
            }
        } else {
            run();
        }

        let mut ordered: Vec<(usize, UnitResult)> = results.into_iter().collect();
        ordered.sort_by_key(|(index, _)| *index);
        ordered.into_iter().map(|(_, result)| result).collect()
    }
}

/// Platform packages are assumed resolvable even without registered metadata.
fn is_platform(name: &UnitName) -> bool {
    let s = name.as_str();
    s.starts_with("java.") || s.starts_with("javax.") || s.starts_with("android.")
}
