use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Note that the decompilation pipeline itself rarely surfaces these: per-method anomalies
/// (unstructurable graphs, type conflicts, malformed branch targets) are recorded as
/// attributes on the method's result and the pipeline keeps going. `Error` is reserved
/// for contract violations on the public API and for input corruption that makes an
/// entire [`crate::ir::Unit`]'s output meaningless.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - Corrupted or inconsistent input data
/// - [`Error::Empty`] - Empty input provided
///
/// ## Symbol Errors
/// - [`Error::SymbolNotFound`] - A required symbol is missing from the symbol table
/// - [`Error::TypeError`] - General type system operation error
///
/// ## Analysis Errors
/// - [`Error::GraphError`] - CFG or region graph construction error
/// - [`Error::PassError`] - Unexpected failure inside one pipeline pass
/// - [`Error::RecursionLimit`] - Maximum recursion depth exceeded
///
/// # Examples
///
/// ```rust,ignore
/// use dexlift::{Decompiler, Error};
///
/// match decompiler.decompile_unit(&unit) {
///     Ok(result) => println!("{}", result.code()),
///     Err(Error::SymbolNotFound(name)) => eprintln!("missing symbol: {name}"),
///     Err(e) => eprintln!("unit skipped: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input data is damaged or internally inconsistent.
    ///
    /// The error includes the source location where the malformation was
    /// detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Provided input was empty.
    ///
    /// This error occurs when an empty unit or instruction list is provided
    /// where actual content was required by the API contract.
    #[error("Provided input was empty")]
    Empty,

    /// A symbol required for decompilation is missing from the symbol table.
    ///
    /// This is the unit-fatal failure class: the owning unit is skipped,
    /// other units continue processing.
    #[error("Failed to find symbol - {0}")]
    SymbolNotFound(String),

    /// General error during type system usage.
    ///
    /// Covers type resolution and hierarchy walks that cannot produce a
    /// meaningful result even with the most-general fallback.
    #[error("{0}")]
    TypeError(String),

    /// Graph construction or traversal error.
    ///
    /// Errors related to the control flow graph arena or the region overlay,
    /// such as an arena index that does not resolve to a live node.
    #[error("{0}")]
    GraphError(String),

    /// A pipeline pass failed in a way it could not record as an attribute.
    ///
    /// The pipeline converts this into an error attribute on the method and
    /// proceeds with the next method; it never aborts the unit.
    #[error("Pass '{pass}' failed: {message}")]
    PassError {
        /// Name of the failing pass
        pass: &'static str,
        /// Description of the failure
        message: String,
    },

    /// Recursion limit reached.
    ///
    /// To prevent stack overflow during recursive operations like region
    /// rendering, a maximum recursion depth is enforced. This error indicates
    /// that limit was exceeded.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories.
    #[error("{0}")]
    Error(String),
}
