//! The pull-based writing protocol.
//!
//! Writers are the dual of [`Parser`](crate::Parser)s: a [`Writer`] state is
//! pulled with an [`Output`] and writes as much as fits, returning
//! [`Written::Cont`] as soon as the sink has no room. An [`Encoder`] is the
//! same protocol over an [`OutputBuffer`], for framings that need to patch
//! bytes they already wrote.

use core::fmt;
use std::borrow::Cow;

use crate::output::{ByteBuffer, Output, OutputBuffer, StringOutput};

/// Writer and encoder contract violations.
///
/// These are never caused by the data being written; they signal that a
/// sink or an inner encoder broke its length contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteError {
    /// The sink closed before the writer finished.
    Truncated,
    /// An inner encoder wrote past the region it was given.
    BufferOverflow,
    /// An inner encoder left the buffer behind where it started.
    BufferUnderflow,
    /// The writer made no progress with room available.
    Stalled,
    /// Free-form message.
    Message(Cow<'static, str>),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Truncated => f.write_str("output truncated"),
            WriteError::BufferOverflow => f.write_str("buffer overflow"),
            WriteError::BufferUnderflow => f.write_str("buffer underflow"),
            WriteError::Stalled => f.write_str("writer stalled"),
            WriteError::Message(message) => f.write_str(message),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for WriteError {}

/// Outcome of pulling a [`Writer`] or [`Encoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Written<W, T> {
    /// The sink is full; resume with the contained state.
    Cont(W),
    /// Writing finished.
    Done(T),
    /// Writing failed.
    Error(WriteError),
}

impl<W, T> Written<W, T> {
    /// More room is wanted.
    #[inline]
    pub fn is_cont(&self) -> bool {
        matches!(self, Written::Cont(_))
    }

    /// Writing finished.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Written::Done(_))
    }

    /// Writing failed.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Written::Error(_))
    }

    /// Maps the continuation state, leaving other states untouched.
    pub fn map_cont<X>(self, f: impl FnOnce(W) -> X) -> Written<X, T> {
        match self {
            Written::Cont(writer) => Written::Cont(f(writer)),
            Written::Done(value) => Written::Done(value),
            Written::Error(error) => Written::Error(error),
        }
    }
}

/// A resumable writer state over a code point sink.
pub trait Writer: Sized {
    /// The value produced on completion, usually `()`.
    type Value;

    /// Writes while the sink has room and returns the next state.
    ///
    /// Implementations return [`Written::Cont`] as soon as the output stops
    /// reporting `is_cont`, and [`WriteError::Truncated`] if it reports
    /// `is_done` before they finish.
    fn pull<O: Output + ?Sized>(self, output: &mut O) -> Written<Self, Self::Value>;
}

/// A resumable encoder state over an octet buffer.
pub trait Encoder: Sized {
    /// The value produced on completion, usually `()`.
    type Value;

    /// Encodes into the buffer between its index and limit.
    fn pull<B: OutputBuffer + ?Sized>(self, buffer: &mut B) -> Written<Self, Self::Value>;
}

impl<W: Writer> Written<W, W::Value> {
    /// Pulls a pending writer; terminal states are returned unchanged.
    #[inline]
    pub fn pull<O: Output + ?Sized>(self, output: &mut O) -> Self {
        match self {
            Written::Cont(writer) => writer.pull(output),
            terminal => terminal,
        }
    }
}

/// Unwraps a finished sub-write, or suspends the enclosing writer.
///
/// The write-side twin of [`resume!`](crate::resume).
#[macro_export]
macro_rules! resume_write {
    ($written:expr, |$cont:pat_param| $suspend:expr) => {
        match $written {
            $crate::Written::Done(value) => value,
            $crate::Written::Cont($cont) => return $crate::Written::Cont($suspend),
            $crate::Written::Error(error) => return $crate::Written::Error(error),
        }
    };
    ($written:expr, $wrap:expr) => {
        match $written {
            $crate::Written::Done(value) => value,
            $crate::Written::Cont(cont) => return $crate::Written::Cont($wrap(cont)),
            $crate::Written::Error(error) => return $crate::Written::Error(error),
        }
    };
}

/// Writes a static or owned text, resuming from a byte offset.
///
/// The building block most writers delegate their literal output to.
#[derive(Debug, Clone)]
pub struct TextWriter<'a> {
    text: Cow<'a, str>,
    offset: usize,
}

impl<'a> TextWriter<'a> {
    /// A writer for `text`.
    pub fn new(text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            text: text.into(),
            offset: 0,
        }
    }
}

impl Writer for TextWriter<'_> {
    type Value = ();

    fn pull<O: Output + ?Sized>(mut self, output: &mut O) -> Written<Self, ()> {
        if output.is_error() {
            return Written::Error(WriteError::BufferOverflow);
        }
        self.offset = output.write_from(&self.text, self.offset);
        if self.offset == self.text.len() {
            Written::Done(())
        } else if output.is_done() {
            Written::Error(WriteError::Truncated)
        } else if output.is_error() {
            Written::Error(WriteError::BufferOverflow)
        } else {
            Written::Cont(self)
        }
    }
}

/// Pulls a writer to completion into a string.
pub fn write_all<W: Writer>(writer: W) -> Result<String, WriteError> {
    let mut output = StringOutput::new();
    match writer.pull(&mut output) {
        Written::Done(_) => Ok(output.into_string()),
        Written::Cont(_) => Err(WriteError::Stalled),
        Written::Error(error) => Err(error),
    }
}

/// Pulls a writer to completion through a sink that accepts at most
/// `window` code points per pull, concatenating the drained text.
///
/// Every suspension point of the writer is crossed when `window` is 1.
pub fn write_windowed<W: Writer>(writer: W, window: usize) -> Result<String, WriteError> {
    let mut output = StringOutput::with_window(window.max(1));
    let mut text = String::new();
    let mut state = Written::Cont(writer);
    loop {
        state = state.pull(&mut output);
        let drained = output.take();
        match state {
            Written::Cont(_) if drained.is_empty() => return Err(WriteError::Stalled),
            Written::Cont(_) => text.push_str(&drained),
            Written::Done(_) => {
                text.push_str(&drained);
                return Ok(text);
            }
            Written::Error(error) => return Err(error),
        }
    }
}

/// Pulls an encoder to completion through a buffer of `buffer_size` octets,
/// collecting everything it produced.
pub fn encode_all<E: Encoder>(encoder: E, buffer_size: usize) -> Result<Vec<u8>, WriteError> {
    let mut buffer = ByteBuffer::with_capacity(buffer_size);
    let mut bytes = Vec::new();
    let mut state = encoder;
    loop {
        match state.pull(&mut buffer) {
            Written::Done(_) => {
                bytes.extend_from_slice(buffer.as_slice());
                return Ok(bytes);
            }
            Written::Cont(next) => {
                if buffer.index() == 0 {
                    log::warn!("encoder made no progress with {} octets free", buffer_size);
                    return Err(WriteError::Stalled);
                }
                bytes.extend_from_slice(buffer.as_slice());
                buffer.clear();
                state = next;
            }
            Written::Error(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes `[a,b,c]` from a slice of words.
    enum Words<'a> {
        Open(&'a [&'a str]),
        Word(&'a [&'a str], usize, TextWriter<'a>),
        Close(TextWriter<'a>),
    }

    impl<'a> Writer for Words<'a> {
        type Value = ();

        fn pull<O: Output + ?Sized>(self, output: &mut O) -> Written<Self, ()> {
            let mut state = self;
            loop {
                state = match state {
                    Words::Open(words) => {
                        if !output.is_cont() {
                            return Written::Cont(Words::Open(words));
                        }
                        output.write('[');
                        Words::Word(words, 0, TextWriter::new(words.first().copied().unwrap_or("")))
                    }
                    Words::Word(words, index, text) => {
                        resume_write!(text.pull(output), |text| Words::Word(words, index, text));
                        match words.get(index + 1) {
                            Some(next) => Words::Word(words, index + 1, TextWriter::new(format!(",{next}"))),
                            None => Words::Close(TextWriter::new("]")),
                        }
                    }
                    Words::Close(text) => {
                        resume_write!(text.pull(output), Words::Close);
                        return Written::Done(());
                    }
                };
            }
        }
    }

    #[test]
    fn test_write_all() {
        let words = ["a", "bc", "d"];
        assert_eq!(write_all(Words::Open(&words)).unwrap(), "[a,bc,d]");
    }

    #[test_case::test_case(1; "one code point per pull")]
    #[test_case::test_case(2; "two code points per pull")]
    #[test_case::test_case(64; "everything at once")]
    fn test_write_windowed(window: usize) {
        let words = ["alpha", "beta"];
        assert_eq!(write_windowed(Words::Open(&words), window).unwrap(), "[alpha,beta]");
    }

    #[test]
    fn test_text_writer_truncated() {
        let mut output = StringOutput::new();
        output.close();
        assert!(matches!(
            TextWriter::new("x").pull(&mut output),
            Written::Error(WriteError::Truncated)
        ));
    }

    struct Repeat(u8, usize);

    impl Encoder for Repeat {
        type Value = ();

        fn pull<B: OutputBuffer + ?Sized>(self, buffer: &mut B) -> Written<Self, ()> {
            let mut left = self.1;
            while left > 0 && buffer.is_cont() {
                buffer.write_byte(self.0);
                left -= 1;
            }
            if left == 0 {
                Written::Done(())
            } else {
                Written::Cont(Repeat(self.0, left))
            }
        }
    }

    #[test]
    fn test_encode_all_through_small_buffer() {
        assert_eq!(encode_all(Repeat(b'z', 7), 3).unwrap(), b"zzzzzzz");
    }

    #[test]
    fn test_encode_all_detects_stall() {
        assert_eq!(encode_all(Repeat(b'z', 1), 0), Err(WriteError::Stalled));
    }
}
