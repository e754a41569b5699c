use pullkit_core::{Diagnostic, WriteError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Diagnostic),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl ReconError {
    /// Where parsing failed, for syntax errors.
    pub fn position(&self) -> Option<pullkit_core::Position> {
        match self {
            ReconError::Syntax(diagnostic) => Some(diagnostic.position()),
            ReconError::Write(_) => None,
        }
    }
}
