//! Decompilation orchestration and shared metadata.
//!
//! # Key Components
//!
//! - [`Decompiler`] / [`DecompileOptions`] - The engine driving units through
//!   the pipeline, with a bounded worker pool and cooperative cancellation
//! - [`UnitResult`] / [`MethodResult`] - Observable per-unit/per-method output
//! - [`SymbolTable`] - Read-mostly class hierarchy metadata
//! - [`ResourceMap`] - Optional resource-name substitution for rendering

mod decompiler;
mod resources;
mod symbols;

pub use decompiler::{DecompileOptions, Decompiler, MethodResult, UnitResult};
pub use resources::ResourceMap;
pub use symbols::{SymbolTable, UnitMeta};
