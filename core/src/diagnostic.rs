//! Positioned parse errors.
//!
//! A [`Diagnostic`] is the only error a [`Parser`](crate::Parser) can end
//! in. It records where in the logical input stream the failure was
//! detected and what the parser was looking for, so callers can render a
//! message like `expected '}' but found ',' at 3:14`.

use core::fmt;
use std::borrow::Cow;

use crate::Error;
use crate::input::Input;

/// A location in a logical input stream.
///
/// `offset` counts code points from the start of the stream; `line` and
/// `column` are 1-based. Positions keep counting across chunk boundaries
/// when inputs are created with [`StrInput::at`](crate::StrInput::at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Code points consumed before this position.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    /// The start of a stream.
    pub const START: Self = Self {
        offset: 0,
        line: 1,
        column: 1,
    };

    /// Returns the position following `c`.
    #[inline]
    pub const fn advance(self, c: char) -> Self {
        if c == '\n' {
            Self {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
            }
        } else {
            Self {
                offset: self.offset + 1,
                line: self.line,
                column: self.column + 1,
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// A specific character was required.
    ExpectedChar {
        /// The required character.
        expected: char,
        /// What was there instead; `None` at end of input.
        found: Option<char>,
    },
    /// A construct was required, e.g. `"value"` or `"chunk size"`.
    Expected {
        /// Human-readable name of the construct.
        expected: Cow<'static, str>,
        /// What was there instead; `None` at end of input.
        found: Option<char>,
    },
    /// Input continued where it should have ended.
    Unexpected {
        /// The offending character; `None` at end of input.
        found: Option<char>,
    },
    /// An engine limit was reached.
    Limit(Error),
    /// Free-form message.
    Message(Cow<'static, str>),
}

/// A positioned, human-readable parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    position: Position,
    kind: DiagnosticKind,
}

impl Diagnostic {
    /// Creates a diagnostic at an explicit position.
    #[inline]
    pub fn new(position: Position, kind: DiagnosticKind) -> Self {
        Self { position, kind }
    }

    /// `expected` was required at the current input position.
    ///
    /// If the input is faulted, its trap is returned instead: upstream
    /// errors take precedence over the grammar's own complaint.
    pub fn expected_char<I: Input + ?Sized>(expected: char, input: &I) -> Self {
        if let Some(trap) = input.trap() {
            return trap;
        }
        Self::new(
            input.position(),
            DiagnosticKind::ExpectedChar {
                expected,
                found: input.head(),
            },
        )
    }

    /// The named construct was required at the current input position.
    pub fn expected<I: Input + ?Sized>(expected: impl Into<Cow<'static, str>>, input: &I) -> Self {
        if let Some(trap) = input.trap() {
            return trap;
        }
        Self::new(
            input.position(),
            DiagnosticKind::Expected {
                expected: expected.into(),
                found: input.head(),
            },
        )
    }

    /// The current input character was not allowed.
    pub fn unexpected<I: Input + ?Sized>(input: &I) -> Self {
        if let Some(trap) = input.trap() {
            return trap;
        }
        Self::new(
            input.position(),
            DiagnosticKind::Unexpected {
                found: input.head(),
            },
        )
    }

    /// Free-form message at the current input position.
    pub fn message<I: Input + ?Sized>(message: impl Into<Cow<'static, str>>, input: &I) -> Self {
        Self::new(input.position(), DiagnosticKind::Message(message.into()))
    }

    /// An engine limit was hit at the current input position.
    pub fn limit<I: Input + ?Sized>(error: Error, input: &I) -> Self {
        Self::new(input.position(), DiagnosticKind::Limit(error))
    }

    /// Where the error was detected.
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    /// What went wrong.
    #[inline]
    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }
}

struct Found(Option<char>);

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(c) => write!(f, "{:?}", c),
            None => f.write_str("end of input"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::ExpectedChar { expected, found } => {
                write!(f, "expected {:?} but found {}", expected, Found(*found))?
            }
            DiagnosticKind::Expected { expected, found } => {
                write!(f, "expected {} but found {}", expected, Found(*found))?
            }
            DiagnosticKind::Unexpected { found } => write!(f, "unexpected {}", Found(*found))?,
            DiagnosticKind::Limit(error) => write!(f, "{}", error)?,
            DiagnosticKind::Message(message) => f.write_str(message)?,
        }
        write!(f, " at {}", self.position)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrInput;

    #[test]
    fn test_position_advances_lines() {
        let p = Position::START.advance('a').advance('\n').advance('b');
        assert_eq!(p.offset, 3);
        assert_eq!(p.line, 2);
        assert_eq!(p.column, 2);
    }

    #[test]
    fn test_expected_char_display() {
        let mut input = StrInput::new("ab");
        input.step();
        let diag = Diagnostic::expected_char('}', &input);
        assert_eq!(diag.to_string(), "expected '}' but found 'b' at 1:2");
    }

    #[test]
    fn test_expected_at_end_of_input() {
        let input = StrInput::new("");
        let diag = Diagnostic::expected("value", &input);
        assert_eq!(diag.to_string(), "expected value but found end of input at 1:1");
        assert!(matches!(
            diag.kind(),
            DiagnosticKind::Expected { found: None, .. }
        ));
    }
}
