#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
//! Resumable, non-blocking parsers and writers.
//!
//! Every parser in the pullkit family is a state machine value: feeding it
//! whatever input is available returns either a finished value, an error,
//! or a new state that picks up exactly where the input ran out. Writers
//! work the same way against output with bounded room.
//!
//! ```text
//! Input ──feed──▶ Parser ──▶ Parsed::{Cont, Done, Error}
//! Writer ──pull──▶ Output ──▶ Written::{Cont, Done, Error}
//! ```

pub mod builder;
pub mod cache;
pub mod config;
mod diagnostic;
mod error;
pub mod input;
pub mod output;
pub mod parser;
pub mod writer;

#[cfg(any(feature = "tokio", feature = "futures"))]
pub mod async_stream;

pub use builder::Builder;
pub use cache::{BoundedLruCache, HashGenCacheMap, HashGenCacheSet};
pub use config::{NestingGuard, ParseConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind, Position};
pub use error::Error;
pub use input::{BytesInput, FaultInput, Input, StrInput};
pub use output::{ByteBuffer, Output, OutputBuffer, StringOutput};
pub use parser::{Incremental, Parsed, Parser, Ready, parse_all, parse_all_bytes};
pub use writer::{
    Encoder, TextWriter, WriteError, Writer, Written, encode_all, write_all, write_windowed,
};
