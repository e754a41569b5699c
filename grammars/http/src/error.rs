use pullkit_core::{Diagnostic, WriteError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    #[error("conflicting content lengths {first} and {second}")]
    ConflictingLength { first: u64, second: u64 },

    #[error("both content-length and chunked transfer-encoding given")]
    AmbiguousFraming,

    #[error("duplicate {0} header")]
    DuplicateHeader(String),

    #[error("invalid token {0:?}")]
    InvalidToken(String),

    #[error("invalid quoted string {0:?}")]
    InvalidQuoted(String),

    #[error("invalid comment {0:?}")]
    InvalidComment(String),

    #[error("invalid field value {0:?}")]
    InvalidValue(String),

    #[error("invalid weight {0}")]
    InvalidWeight(f32),

    #[error("unsupported transfer coding {0}")]
    UnsupportedCoding(String),

    #[error("syntax error: {0}")]
    Syntax(#[from] Diagnostic),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl HttpError {
    /// Where parsing failed, for syntax errors.
    pub fn position(&self) -> Option<pullkit_core::Position> {
        match self {
            HttpError::Syntax(diagnostic) => Some(diagnostic.position()),
            _ => None,
        }
    }
}
