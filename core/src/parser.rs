//! The suspend/resume parsing protocol.
//!
//! A [`Parser`] is a state machine value. Feeding it an [`Input`] consumes
//! as many code points as are available and returns a [`Parsed`]:
//!
//! - [`Parsed::Cont`] - the input ran dry; the returned state resumes
//!   exactly where this one stopped.
//! - [`Parsed::Done`] - a value was produced; the input is positioned right
//!   after it.
//! - [`Parsed::Error`] - the input is malformed or faulted.
//!
#![cfg_attr(feature = "docs", doc = simple_mermaid::mermaid!("../docs/diagrams/parsed.mmd"))]
//!
//! Parsers never block and never recurse across suspension: a parser that
//! needs a sub-parser stores it in one of its own enum variants and feeds
//! it from the top of its `feed` loop on the next call.
//!
//! # Example
//!
//! ```ignore
//! enum Pair {
//!     Left(NumberParser),
//!     Comma(i64),
//!     Right(i64, NumberParser),
//! }
//!
//! impl Parser for Pair {
//!     type Value = (i64, i64);
//!
//!     fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Self::Value> {
//!         let mut state = self;
//!         loop {
//!             state = match state {
//!                 Pair::Left(number) => Pair::Comma(resume!(number.feed(input), Pair::Left)),
//!                 Pair::Comma(left) => match input.head() {
//!                     Some(',') => { input.step(); Pair::Right(left, NumberParser::new()) }
//!                     Some(_) => return Parsed::Error(Diagnostic::expected_char(',', input)),
//!                     None if input.is_empty() => return Parsed::Cont(Pair::Comma(left)),
//!                     None => return Parsed::Error(Diagnostic::expected_char(',', input)),
//!                 },
//!                 Pair::Right(left, number) => {
//!                     let right = resume!(number.feed(input), |number| Pair::Right(left, number));
//!                     return Parsed::Done((left, right));
//!                 }
//!             };
//!         }
//!     }
//! }
//! ```

use crate::config::ParseConfig;
use crate::diagnostic::{Diagnostic, Position};
use crate::error::Error;
use crate::input::{BytesInput, Input, StrInput};

/// Outcome of feeding a [`Parser`].
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<P, T> {
    /// More input is needed; resume with the contained state.
    Cont(P),
    /// Parsing finished with a value.
    Done(T),
    /// Parsing failed.
    Error(Diagnostic),
}

/// A resumable parser state.
pub trait Parser: Sized {
    /// The value produced on completion.
    type Value;

    /// Consumes available input and returns the next state.
    ///
    /// Implementations must return [`Parsed::Cont`] only when the input is
    /// empty (more may arrive), and must surface a faulted input's trap as
    /// [`Parsed::Error`].
    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Self::Value>;
}

impl<P, T> Parsed<P, T> {
    /// A terminal error state built from the current input position.
    #[inline]
    pub fn error(diagnostic: Diagnostic) -> Self {
        Parsed::Error(diagnostic)
    }

    /// More input is wanted.
    #[inline]
    pub fn is_cont(&self) -> bool {
        matches!(self, Parsed::Cont(_))
    }

    /// A value was produced.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Parsed::Done(_))
    }

    /// Parsing failed.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Parsed::Error(_))
    }

    /// Maps the produced value, leaving other states untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<P, U> {
        match self {
            Parsed::Cont(parser) => Parsed::Cont(parser),
            Parsed::Done(value) => Parsed::Done(f(value)),
            Parsed::Error(error) => Parsed::Error(error),
        }
    }

    /// Maps the continuation state, leaving other states untouched.
    pub fn map_cont<Q>(self, f: impl FnOnce(P) -> Q) -> Parsed<Q, T> {
        match self {
            Parsed::Cont(parser) => Parsed::Cont(f(parser)),
            Parsed::Done(value) => Parsed::Done(value),
            Parsed::Error(error) => Parsed::Error(error),
        }
    }

    /// The produced value, or the error. A pending state is reported as an
    /// unexpected end of input at `position`.
    pub fn into_result(self, position: Position) -> Result<T, Diagnostic> {
        match self {
            Parsed::Done(value) => Ok(value),
            Parsed::Error(error) => Err(error),
            Parsed::Cont(_) => Err(Diagnostic::new(
                position,
                crate::DiagnosticKind::Unexpected { found: None },
            )),
        }
    }
}

impl<P: Parser> Parsed<P, P::Value> {
    /// Feeds a pending state; terminal states are returned unchanged.
    #[inline]
    pub fn feed<I: Input + ?Sized>(self, input: &mut I) -> Self {
        match self {
            Parsed::Cont(parser) => parser.feed(input),
            terminal => terminal,
        }
    }
}

/// Unwraps a finished sub-parse, or suspends the enclosing parser.
///
/// `resume!(expr, wrap)` evaluates to the `Done` value of `expr`. On `Cont`
/// it returns `Parsed::Cont(wrap(state))` from the enclosing function; on
/// `Error` it returns the error. `wrap` may be a tuple-variant path or a
/// closure-like `|state| expr` form that moves captured fields.
#[macro_export]
macro_rules! resume {
    ($parsed:expr, |$cont:pat_param| $suspend:expr) => {
        match $parsed {
            $crate::Parsed::Done(value) => value,
            $crate::Parsed::Cont($cont) => return $crate::Parsed::Cont($suspend),
            $crate::Parsed::Error(error) => return $crate::Parsed::Error(error),
        }
    };
    ($parsed:expr, $wrap:expr) => {
        match $parsed {
            $crate::Parsed::Done(value) => value,
            $crate::Parsed::Cont(cont) => return $crate::Parsed::Cont($wrap(cont)),
            $crate::Parsed::Error(error) => return $crate::Parsed::Error(error),
        }
    };
}

/// A parser that is already finished.
#[derive(Debug, Clone)]
pub struct Ready<T>(pub T);

impl<T> Parser for Ready<T> {
    type Value = T;

    #[inline]
    fn feed<I: Input + ?Sized>(self, _input: &mut I) -> Parsed<Self, T> {
        Parsed::Done(self.0)
    }
}

/// Parses a complete text, requiring the parser to consume all of it.
///
/// # Example
///
/// ```ignore
/// let value = parse_all(BlockParser::<Value>::new(), "{a:1}")?;
/// ```
pub fn parse_all<P: Parser>(parser: P, text: &str) -> Result<P::Value, Diagnostic> {
    let mut input = StrInput::new(text);
    finish_complete(parser.feed(&mut input), &input)
}

/// Parses a complete octet sequence, requiring the parser to consume all of
/// it.
pub fn parse_all_bytes<P: Parser>(parser: P, bytes: &[u8]) -> Result<P::Value, Diagnostic> {
    let mut input = BytesInput::new(bytes);
    finish_complete(parser.feed(&mut input), &input)
}

fn finish_complete<P: Parser, I: Input>(
    parsed: Parsed<P, P::Value>,
    input: &I,
) -> Result<P::Value, Diagnostic> {
    match parsed {
        Parsed::Done(value) if input.is_done() => Ok(value),
        Parsed::Done(_) => Err(Diagnostic::unexpected(input)),
        other => other.into_result(input.position()),
    }
}

/// Drives a parser over a sequence of chunks.
///
/// Positions continue across chunks, and the configured
/// [`max_input_len`](ParseConfig::max_input_len) is enforced on the total
/// number of code points fed. Input left over after the parser finishes is
/// an error.
///
/// # Example
///
/// ```ignore
/// let mut parse = Incremental::new(BlockParser::<Value>::new());
/// for chunk in ["{a:", "1,b", ":2}"] {
///     parse.feed(chunk)?;
/// }
/// let value = parse.finish()?;
/// ```
#[derive(Debug)]
pub struct Incremental<P: Parser> {
    state: Option<Parsed<P, P::Value>>,
    position: Position,
    config: ParseConfig,
}

impl<P: Parser> Incremental<P> {
    /// Wraps `parser` with the default configuration.
    pub fn new(parser: P) -> Self {
        Self::with_config(parser, ParseConfig::default())
    }

    /// Wraps `parser`, enforcing `config`'s input limit.
    pub fn with_config(parser: P, config: ParseConfig) -> Self {
        Self {
            state: Some(Parsed::Cont(parser)),
            position: Position::START,
            config,
        }
    }

    /// Position reached in the logical stream.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Whether the parser has already produced a value.
    pub fn is_done(&self) -> bool {
        matches!(self.state, Some(Parsed::Done(_)))
    }

    /// Feeds the next text chunk.
    pub fn feed(&mut self, chunk: &str) -> Result<(), Diagnostic> {
        self.check_limit(chunk.chars().count())?;
        let input = StrInput::new(chunk).partial(true).at(self.position);
        self.advance(input)
    }

    /// Feeds the next octet chunk, read as ISO-8859-1.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Result<(), Diagnostic> {
        self.check_limit(chunk.len())?;
        let input = BytesInput::new(chunk).partial(true).at(self.position);
        self.advance(input)
    }

    /// Signals end of input and returns the parsed value.
    pub fn finish(mut self) -> Result<P::Value, Diagnostic> {
        let mut input = StrInput::new("").at(self.position);
        let state = self.take_state(&input)?.feed(&mut input);
        log::debug!("incremental parse finished at {}", input.position());
        state.into_result(input.position())
    }

    fn check_limit(&self, len: usize) -> Result<(), Diagnostic> {
        let consumed = self.position.offset.saturating_add(len);
        if consumed > self.config.max_input_len {
            return Err(Diagnostic::new(
                self.position,
                crate::DiagnosticKind::Limit(Error::InputLimitExceeded {
                    consumed,
                    limit: self.config.max_input_len,
                }),
            ));
        }
        Ok(())
    }

    fn advance<I: Input>(&mut self, mut input: I) -> Result<(), Diagnostic> {
        let state = self.take_state(&input)?.feed(&mut input);
        self.position = input.position();
        let result = match &state {
            Parsed::Error(error) => Err(error.clone()),
            Parsed::Done(_) if input.is_cont() => Err(Diagnostic::unexpected(&input)),
            _ => Ok(()),
        };
        self.state = Some(match result {
            Err(ref error) => Parsed::Error(error.clone()),
            Ok(()) => state,
        });
        result
    }

    fn take_state<I: Input>(&mut self, input: &I) -> Result<Parsed<P, P::Value>, Diagnostic> {
        self.state
            .take()
            .ok_or_else(|| Diagnostic::message("parser state lost", input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticKind;

    /// Decimal digits up to a `;` terminator.
    #[derive(Debug)]
    struct Digits(u64);

    impl Parser for Digits {
        type Value = u64;

        fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, u64> {
            let mut value = self.0;
            loop {
                match input.head() {
                    Some(c @ '0'..='9') => {
                        input.step();
                        value = value * 10 + u64::from(c as u8 - b'0');
                    }
                    Some(';') => {
                        input.step();
                        return Parsed::Done(value);
                    }
                    Some(_) => return Parsed::Error(Diagnostic::expected("digit", input)),
                    None if input.is_empty() => return Parsed::Cont(Digits(value)),
                    None => return Parsed::Error(Diagnostic::expected_char(';', input)),
                }
            }
        }
    }

    /// Two `Digits` in a row, summed.
    enum Sum {
        Left(Digits),
        Right(u64, Digits),
    }

    impl Parser for Sum {
        type Value = u64;

        fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, u64> {
            let mut state = self;
            loop {
                state = match state {
                    Sum::Left(digits) => {
                        let left = resume!(digits.feed(input), Sum::Left);
                        Sum::Right(left, Digits(0))
                    }
                    Sum::Right(left, digits) => {
                        let right = resume!(digits.feed(input), |digits| Sum::Right(left, digits));
                        return Parsed::Done(left + right);
                    }
                };
            }
        }
    }

    #[test]
    fn test_parse_all() {
        assert_eq!(parse_all(Digits(0), "123;").unwrap(), 123);
    }

    #[test]
    fn test_parse_all_rejects_trailing_input() {
        let error = parse_all(Digits(0), "1;x").unwrap_err();
        assert_eq!(error.kind(), &DiagnosticKind::Unexpected { found: Some('x') });
    }

    #[test]
    fn test_parse_all_reports_end_of_input() {
        let error = parse_all(Digits(0), "12").unwrap_err();
        assert_eq!(error.to_string(), "expected ';' but found end of input at 1:3");
    }

    #[test]
    fn test_suspends_and_resumes() {
        let mut first = StrInput::new("4").partial(true);
        let state = Sum::Left(Digits(0)).feed(&mut first);
        assert!(state.is_cont());
        let mut second = StrInput::new("2;7;").at(first.position());
        assert!(matches!(state.feed(&mut second), Parsed::Done(49)));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut input = StrInput::new("x");
        let state = Digits(0).feed(&mut input);
        assert!(state.is_error());
        let mut more = StrInput::new("1;");
        assert!(state.feed(&mut more).is_error());
        assert_eq!(more.head(), Some('1'));
    }

    #[test]
    fn test_incremental_byte_by_byte() {
        let mut parse = Incremental::new(Sum::Left(Digits(0)));
        for chunk in ["1", "0", ";", "2", "5", ";"] {
            parse.feed(chunk).unwrap();
        }
        assert!(parse.is_done());
        assert_eq!(parse.finish().unwrap(), 35);
    }

    #[test]
    fn test_incremental_trailing_input() {
        let mut parse = Incremental::new(Digits(0));
        assert!(parse.feed("1;2").is_err());
        assert!(parse.finish().is_err());
    }

    #[test]
    fn test_incremental_input_limit() {
        let config = ParseConfig::new().with_max_input_len(3);
        let mut parse = Incremental::with_config(Digits(0), config);
        parse.feed("12").unwrap();
        let error = parse.feed("34").unwrap_err();
        assert!(matches!(
            error.kind(),
            DiagnosticKind::Limit(Error::InputLimitExceeded { consumed: 4, limit: 3 })
        ));
    }

    #[test]
    fn test_incremental_finish_incomplete() {
        let mut parse = Incremental::new(Digits(0));
        parse.feed("12").unwrap();
        let error = parse.finish().unwrap_err();
        assert_eq!(error.position().offset, 2);
    }
}
