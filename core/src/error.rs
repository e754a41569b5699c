//! Core error types for pullkit.
//!
//! Grammar crates define their own error enums and implement
//! `From<pullkit::Error>`, `From<Diagnostic>` and `From<WriteError>` to
//! integrate with the engine's terminal states.

use core::fmt;

/// Resource limit errors raised by the engine itself.
///
/// These never originate from malformed input as such; they signal that a
/// configured [`ParseConfig`](crate::ParseConfig) limit was reached.
///
/// # Example
///
/// ```ignore
/// use thiserror::Error;
///
/// #[derive(Error, Debug)]
/// pub enum MyError {
///     #[error(transparent)]
///     Limit(#[from] pullkit::Error),
///
///     #[error(transparent)]
///     Syntax(#[from] pullkit::Diagnostic),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Nesting limit exceeded during parsing.
    ///
    /// Nested parsers resume their children from inside their own `feed`
    /// call, so nesting depth translates into native stack depth while
    /// input is being consumed. Input like `{{{{{{...}}}}}}` with thousands
    /// of levels trips this limit (default 128).
    NestingLimitExceeded {
        /// Depth that would have been entered.
        depth: usize,
        /// Maximum allowed depth.
        limit: usize,
    },

    /// Input limit exceeded during incremental parsing.
    InputLimitExceeded {
        /// Number of code points consumed when the limit was exceeded.
        consumed: usize,
        /// Maximum allowed number of code points.
        limit: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NestingLimitExceeded { depth, limit } => {
                write!(f, "nesting limit exceeded: depth {} > limit {}", depth, limit)
            }
            Error::InputLimitExceeded { consumed, limit } => {
                write!(
                    f,
                    "input limit exceeded: consumed {} > limit {}",
                    consumed, limit
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
