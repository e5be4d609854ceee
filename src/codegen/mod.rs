//! Source text generation from the structured, typed tree.
//!
//! # Key Components
//!
//! - [`CodeRenderer`] - Depth-first region walk emitting Java source
//! - [`CodeWriter`] - Indentation-tracking text sink
//!
//! Rendering never fails; see [`CodeRenderer`] for the degradation contract.

mod renderer;
mod writer;

pub use renderer::CodeRenderer;
pub use writer::CodeWriter;
