//! Type and variable inference.
//!
//! Assigns a source-level type to every register definition/use and merges
//! register versions into stable [`Variable`]s. Instructions are never
//! mutated: results live in side tables ([`VariableMap`]) keyed by
//! instruction index, keeping the IR reusable across passes.
//!
//! # Key Components
//!
//! - [`DefUseChains`] - Reaching-definition chains per register
//! - [`TypeInference`] - Constraint collection and fixed-point resolution
//! - [`VariableMap`] / [`Variable`] - The inference result
//!
//! # Failure Semantics
//!
//! Unresolvable type conflicts never abort: the class falls back to the most
//! general applicable type and a warning attribute records the conflict,
//! which the renderer surfaces as an inline diagnostic comment.

mod defuse;
mod infer;
mod variables;

pub use defuse::{Def, DefId, DefSite, DefUseChains};
pub use infer::TypeInference;
pub use variables::{VarId, Variable, VariableMap};
