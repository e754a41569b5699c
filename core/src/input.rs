//! Input cursors.
//!
//! An [`Input`] is a view over whatever part of a stream is available right
//! now. It is in exactly one of four states:
//!
//! | State | `head()` | Meaning |
//! |-------|----------|---------|
//! | cont  | `Some(c)` | a code point is available |
//! | empty | `None` | nothing available now, more may arrive (`is_part`) |
//! | done  | `None` | end of stream |
//! | error | `None` | upstream fault, see [`Input::trap`] |
//!
//! Cursors are small `Clone` values. [`Input::step`] advances the receiver
//! only; a copy taken before stepping still points at the old position.

use crate::diagnostic::{Diagnostic, Position};

/// A cursor over a possibly partial code point stream.
pub trait Input {
    /// The code point at the cursor, if one is available now.
    fn head(&self) -> Option<char>;

    /// Advances past the current code point.
    ///
    /// Stepping a cursor that is not in the cont state does nothing.
    fn step(&mut self);

    /// Whether more input may arrive after the available code points.
    fn is_part(&self) -> bool;

    /// Position of the cursor in the logical stream.
    fn position(&self) -> Position;

    /// The upstream fault, if this input is in the error state.
    fn trap(&self) -> Option<Diagnostic> {
        None
    }

    /// A code point is available now.
    #[inline]
    fn is_cont(&self) -> bool {
        self.head().is_some()
    }

    /// No code point is available now, but more may arrive.
    #[inline]
    fn is_empty(&self) -> bool {
        self.head().is_none() && self.is_part() && !self.is_error()
    }

    /// The end of the stream has been reached.
    #[inline]
    fn is_done(&self) -> bool {
        self.head().is_none() && !self.is_part() && !self.is_error()
    }

    /// The input is faulted.
    #[inline]
    fn is_error(&self) -> bool {
        self.trap().is_some()
    }
}

impl<I: Input + ?Sized> Input for &mut I {
    #[inline]
    fn head(&self) -> Option<char> {
        (**self).head()
    }

    #[inline]
    fn step(&mut self) {
        (**self).step()
    }

    #[inline]
    fn is_part(&self) -> bool {
        (**self).is_part()
    }

    #[inline]
    fn position(&self) -> Position {
        (**self).position()
    }

    #[inline]
    fn trap(&self) -> Option<Diagnostic> {
        (**self).trap()
    }
}

/// A cursor over a chunk of UTF-8 text.
///
/// # Example
///
/// ```ignore
/// let mut input = StrInput::new("{a:").partial(true);
/// let state = parser.feed(&mut input);
/// // later, continue where the first chunk stopped
/// let mut input = StrInput::new("1}").at(input.position());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StrInput<'a> {
    text: &'a str,
    index: usize,
    part: bool,
    position: Position,
}

impl<'a> StrInput<'a> {
    /// A complete input: the stream ends after `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            index: 0,
            part: false,
            position: Position::START,
        }
    }

    /// Marks whether more chunks follow this one.
    #[inline]
    pub fn partial(mut self, part: bool) -> Self {
        self.part = part;
        self
    }

    /// Starts position tracking at `position` instead of the stream start.
    #[inline]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Text not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.text[self.index..]
    }
}

impl Input for StrInput<'_> {
    #[inline]
    fn head(&self) -> Option<char> {
        self.text[self.index..].chars().next()
    }

    #[inline]
    fn step(&mut self) {
        if let Some(c) = self.head() {
            self.index += c.len_utf8();
            self.position = self.position.advance(c);
        }
    }

    #[inline]
    fn is_part(&self) -> bool {
        self.part
    }

    #[inline]
    fn position(&self) -> Position {
        self.position
    }
}

/// A cursor over a chunk of octets, each read as the code point of the
/// same value (ISO-8859-1).
///
/// HTTP grammars are defined over octets; reading them as Latin-1 code
/// points keeps the same [`Input`] protocol for text and binary framing.
#[derive(Debug, Clone, Copy)]
pub struct BytesInput<'a> {
    bytes: &'a [u8],
    index: usize,
    part: bool,
    position: Position,
}

impl<'a> BytesInput<'a> {
    /// A complete input: the stream ends after `bytes`.
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            index: 0,
            part: false,
            position: Position::START,
        }
    }

    /// Marks whether more chunks follow this one.
    #[inline]
    pub fn partial(mut self, part: bool) -> Self {
        self.part = part;
        self
    }

    /// Starts position tracking at `position` instead of the stream start.
    #[inline]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Octets not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.index..]
    }
}

impl Input for BytesInput<'_> {
    #[inline]
    fn head(&self) -> Option<char> {
        self.bytes.get(self.index).map(|&b| char::from(b))
    }

    #[inline]
    fn step(&mut self) {
        if let Some(c) = self.head() {
            self.index += 1;
            self.position = self.position.advance(c);
        }
    }

    #[inline]
    fn is_part(&self) -> bool {
        self.part
    }

    #[inline]
    fn position(&self) -> Position {
        self.position
    }
}

/// An input stuck in the error state.
///
/// Transports use this to surface a read failure through the same
/// protocol as data: every parser fed a faulted input terminates with the
/// input's trap.
#[derive(Debug, Clone)]
pub struct FaultInput {
    trap: Diagnostic,
}

impl FaultInput {
    /// An input whose trap is `trap`.
    pub fn new(trap: Diagnostic) -> Self {
        Self { trap }
    }
}

impl Input for FaultInput {
    #[inline]
    fn head(&self) -> Option<char> {
        None
    }

    #[inline]
    fn step(&mut self) {}

    #[inline]
    fn is_part(&self) -> bool {
        false
    }

    #[inline]
    fn position(&self) -> Position {
        self.trap.position()
    }

    fn trap(&self) -> Option<Diagnostic> {
        Some(self.trap.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticKind;

    #[test]
    fn test_str_input_states() {
        let mut input = StrInput::new("ab").partial(true);
        assert!(input.is_cont());
        input.step();
        input.step();
        assert!(input.is_empty());
        assert!(!input.is_done());

        let done = StrInput::new("");
        assert!(done.is_done());
        assert!(!done.is_empty());
    }

    #[test]
    fn test_step_does_not_affect_copies() {
        let mut input = StrInput::new("xyz");
        let saved = input;
        input.step();
        assert_eq!(input.head(), Some('y'));
        assert_eq!(saved.head(), Some('x'));
    }

    #[test]
    fn test_str_input_multibyte() {
        let mut input = StrInput::new("日本");
        assert_eq!(input.head(), Some('日'));
        input.step();
        assert_eq!(input.head(), Some('本'));
        assert_eq!(input.position().offset, 1);
        assert_eq!(input.remaining(), "本");
    }

    #[test]
    fn test_positions_continue_across_chunks() {
        let mut first = StrInput::new("a\nb").partial(true);
        while first.is_cont() {
            first.step();
        }
        let second = StrInput::new("c").at(first.position());
        assert_eq!(second.position().line, 2);
        assert_eq!(second.position().column, 2);
    }

    #[test]
    fn test_bytes_input_latin1() {
        let mut input = BytesInput::new(&[0x41, 0xE9]);
        assert_eq!(input.head(), Some('A'));
        input.step();
        assert_eq!(input.head(), Some('\u{e9}'));
    }

    #[test]
    fn test_fault_input() {
        let trap = Diagnostic::new(Position::START, DiagnosticKind::Message("reset".into()));
        let input = FaultInput::new(trap.clone());
        assert!(input.is_error());
        assert!(!input.is_done());
        assert!(!input.is_empty());
        assert_eq!(input.trap(), Some(trap));
    }
}
