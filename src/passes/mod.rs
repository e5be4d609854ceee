//! The decompilation pass pipeline.
//!
//! An ordered list of named passes, each consuming and producing the same
//! per-method analysis state ([`MethodContext`]), with a shared execution
//! protocol: declaration-order execution, explicit fixed-point repetition
//! flags, and fault isolation at method granularity.
//!
//! # Key Components
//!
//! - [`DecompilePass`] - The pass capability
//! - [`PassPipeline`] - Ordering, repetition and fault isolation
//! - [`MethodContext`] - The state threaded between passes
//! - [`BuildCfg`] / [`RecoverRegions`] / [`InferTypes`] / [`SimplifyRegions`] -
//!   The standard pipeline stages

mod context;
mod pipeline;

pub use context::MethodContext;
pub use pipeline::{
    BuildCfg, DecompilePass, InferTypes, PassPipeline, RecoverRegions, SimplifyRegions,
};
