#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # dexlift
//!
//! A framework for decompiling Android DEX method bytecode into readable,
//! recompilable Java source. Built in pure Rust, `dexlift` implements the
//! decompilation pipeline core: control-flow graph construction with
//! exception-range integration, control-structure recovery from arbitrary
//! CFGs, register-to-variable type inference, and rendering of the recovered
//! tree to source text.
//!
//! ## Features
//!
//! - **Graph-based structuring** - dominator analysis and iterative region
//!   reduction recover loops, branches, switches and try/catch from raw
//!   bytecode
//! - **Attribute-based soft failure** - anomalies degrade to marked output
//!   instead of aborting; every input method yields a rendered result
//! - **Deterministic inference** - register versions merge into typed,
//!   stable variables with identical results across runs
//! - **Parallel by unit** - independent units decompile on a bounded worker
//!   pool with cooperative cancellation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dexlift::prelude::*;
//!
//! // Units come from the ingestion collaborator
//! let mut symbols = SymbolTable::new();
//! symbols.add_units(&units);
//!
//! let decompiler = Decompiler::new(symbols, DecompileOptions::default());
//! for result in decompiler.decompile_all(&units) {
//!     println!("{}", result.code());
//! }
//! ```
//!
//! ## Architecture
//!
//! The pipeline runs per method: raw bytecode → [`cfg`] → [`structure`] →
//! [`typeinf`] → (simplification under [`passes`]) → [`codegen`], with the
//! [`attributes`] system consulted and written at every stage.
//!
//! - [`ir`] - Typed IR: units, methods, instructions, the type lattice
//! - [`attributes`] - Diagnostics and analysis metadata on any node
//! - [`cfg`] - Basic blocks, dominators, natural loops
//! - [`structure`] - Region tree recovery with graceful degradation
//! - [`typeinf`] - Def-use chains, constraint solving, variable binding
//! - [`passes`] - The ordered pass pipeline with fault isolation
//! - [`codegen`] - Source rendering that never fails
//! - [`project`] - Orchestration, symbol table, per-unit results
//!
//! Container/archive ingestion, resource-table parsing and output
//! verification are external collaborators: the core consumes already-decoded
//! instruction lists and symbol metadata, and produces source text plus
//! attribute sets.

#[macro_use]
pub(crate) mod error;

pub mod attributes;
pub mod cfg;
pub mod codegen;
pub mod ir;
pub mod passes;
pub mod prelude;
pub mod project;
pub mod structure;
pub mod typeinf;

pub use error::Error;

/// The result type used throughout dexlift.
pub type Result<T> = std::result::Result<T, Error>;

pub use project::{DecompileOptions, Decompiler, MethodResult, UnitResult};
