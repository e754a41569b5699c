//! Async drivers for resumable parsers.
//!
//! A [`Parser`] never blocks, so driving one from an async source needs no
//! buffering beyond the chunk in hand: every chunk that arrives is fed
//! straight into the current state, and only the state is kept between
//! chunks.
//!
//! # Features
//!
//! - **tokio**: [`tokio_impl::ChannelParser`] reads chunks from an
//!   `mpsc::Receiver<String>`.
//! - **futures**: [`futures_impl::ParseFuture`] polls any
//!   `Stream<Item = String>`.
//!
//! # Example
//!
//! ```ignore
//! use pullkit::async_stream::tokio_impl::ChannelParser;
//!
//! async fn read_value(rx: tokio::sync::mpsc::Receiver<String>) -> Result<Value, StreamError> {
//!     ChannelParser::new(BlockParser::<Value>::new(), rx).run().await
//! }
//! ```

use core::fmt;

use crate::diagnostic::{Diagnostic, Position};
use crate::input::{Input, StrInput};
use crate::parser::{Parsed, Parser};

/// Why an async driver stopped without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The parser rejected the input.
    Parse(Diagnostic),
    /// Input ended before the parser finished.
    IncompleteInput,
    /// Input continued after the parser finished.
    TrailingInput(Position),
    /// A chunk was larger than [`StreamConfig::max_chunk_size`].
    ChunkTooLarge {
        size: usize,
        max: usize,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Parse(diagnostic) => write!(f, "parse error: {}", diagnostic),
            StreamError::IncompleteInput => write!(f, "incomplete input at end of stream"),
            StreamError::TrailingInput(position) => {
                write!(f, "trailing input after value at {}", position)
            }
            StreamError::ChunkTooLarge { size, max } => {
                write!(f, "chunk size {} exceeds maximum {}", size, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StreamError {}

impl From<Diagnostic> for StreamError {
    fn from(diagnostic: Diagnostic) -> Self {
        StreamError::Parse(diagnostic)
    }
}

/// Limits applied by the async drivers to each received chunk.
///
/// # Example
///
/// ```ignore
/// let config = StreamConfig::from_chunk_size(16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Largest chunk accepted, in UTF-8 bytes; bigger chunks fail the
    /// parse with [`StreamError::ChunkTooLarge`]. 64 KiB by default.
    pub max_chunk_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::medium()
    }
}

impl StreamConfig {
    /// 4 KiB chunks, for small framed messages.
    pub const fn small() -> Self {
        Self::with_max_chunk_size(4 * 1024)
    }

    /// 64 KiB chunks, a typical socket read.
    pub const fn medium() -> Self {
        Self::with_max_chunk_size(64 * 1024)
    }

    /// 256 KiB chunks, for bulk documents.
    pub const fn large() -> Self {
        Self::with_max_chunk_size(256 * 1024)
    }

    #[inline]
    pub const fn with_max_chunk_size(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Allows twice the expected chunk size.
    pub const fn from_chunk_size(chunk_size: usize) -> Self {
        Self::with_max_chunk_size(chunk_size.saturating_mul(2))
    }
}

/// Parser state shared by the drivers: the pending parse and the position
/// reached so far.
struct Feeder<P: Parser> {
    state: Option<Parsed<P, P::Value>>,
    position: Position,
    config: StreamConfig,
}

impl<P: Parser> Feeder<P> {
    fn new(parser: P, config: StreamConfig) -> Self {
        Self {
            state: Some(Parsed::Cont(parser)),
            position: Position::START,
            config,
        }
    }

    fn feed(&mut self, chunk: &str) -> Result<(), StreamError> {
        if chunk.len() > self.config.max_chunk_size {
            return Err(StreamError::ChunkTooLarge {
                size: chunk.len(),
                max: self.config.max_chunk_size,
            });
        }
        let mut input = StrInput::new(chunk).partial(true).at(self.position);
        let state = self
            .state
            .take()
            .ok_or(StreamError::IncompleteInput)?
            .feed(&mut input);
        self.position = input.position();
        let result = match &state {
            Parsed::Error(error) => Err(StreamError::Parse(error.clone())),
            Parsed::Done(_) if input.is_cont() => Err(StreamError::TrailingInput(self.position)),
            _ => Ok(()),
        };
        self.state = Some(state);
        result
    }

    fn finish(self) -> Result<P::Value, StreamError> {
        let mut input = StrInput::new("").at(self.position);
        let state = self.state.ok_or(StreamError::IncompleteInput)?;
        match state.feed(&mut input) {
            Parsed::Done(value) => {
                log::debug!("stream parse finished at {}", input.position());
                Ok(value)
            }
            Parsed::Error(error) => Err(StreamError::Parse(error)),
            Parsed::Cont(_) => Err(StreamError::IncompleteInput),
        }
    }
}

#[cfg(feature = "tokio")]
pub mod tokio_impl {
    //! Tokio-based async driver.

    use super::*;
    use ::tokio::sync::mpsc;

    /// Feeds a parser from a channel of text chunks.
    pub struct ChannelParser<P: Parser> {
        feeder: Feeder<P>,
        rx: mpsc::Receiver<String>,
    }

    impl<P: Parser> ChannelParser<P> {
        /// Create a new channel parser with default configuration.
        pub fn new(parser: P, rx: mpsc::Receiver<String>) -> Self {
            Self::with_config(parser, rx, StreamConfig::default())
        }

        /// Create a new channel parser with custom configuration.
        pub fn with_config(parser: P, rx: mpsc::Receiver<String>, config: StreamConfig) -> Self {
            Self {
                feeder: Feeder::new(parser, config),
                rx,
            }
        }

        /// Feeds chunks until the channel closes, then finishes the parse.
        pub async fn run(mut self) -> Result<P::Value, StreamError> {
            while let Some(chunk) = self.rx.recv().await {
                self.feeder.feed(&chunk)?;
            }
            self.feeder.finish()
        }
    }
}

#[cfg(feature = "futures")]
pub mod futures_impl {
    //! Futures-based async driver (runtime-agnostic).

    use super::*;
    use core::future::Future;
    use core::pin::Pin;
    use core::task::{Context, Poll};
    use futures_core::Stream;

    /// A future that feeds a parser from a stream of text chunks and
    /// resolves once the stream ends.
    pub struct ParseFuture<S, P: Parser> {
        inner: S,
        feeder: Option<Feeder<P>>,
    }

    impl<S, P> ParseFuture<S, P>
    where
        S: Stream<Item = String>,
        P: Parser,
    {
        /// Create a new parse future over a chunk stream.
        pub fn new(inner: S, parser: P) -> Self {
            Self::with_config(inner, parser, StreamConfig::default())
        }

        /// Create a new parse future with custom configuration.
        pub fn with_config(inner: S, parser: P, config: StreamConfig) -> Self {
            Self {
                inner,
                feeder: Some(Feeder::new(parser, config)),
            }
        }
    }

    impl<S, P> Future for ParseFuture<S, P>
    where
        S: Stream<Item = String> + Unpin,
        P: Parser + Unpin,
        P::Value: Unpin,
    {
        type Output = Result<P::Value, StreamError>;

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
            let this = self.get_mut();
            loop {
                match Pin::new(&mut this.inner).poll_next(cx) {
                    Poll::Ready(Some(chunk)) => {
                        let Some(feeder) = this.feeder.as_mut() else {
                            return Poll::Ready(Err(StreamError::IncompleteInput));
                        };
                        if let Err(error) = feeder.feed(&chunk) {
                            this.feeder = None;
                            return Poll::Ready(Err(error));
                        }
                    }
                    Poll::Ready(None) => {
                        return Poll::Ready(match this.feeder.take() {
                            Some(feeder) => feeder.finish(),
                            None => Err(StreamError::IncompleteInput),
                        });
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }
        }
    }
}
