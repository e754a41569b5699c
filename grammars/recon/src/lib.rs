#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
//! Recon, a record notation that unifies JSON-like structures with XML-like
//! markup, parsed and written incrementally.
//!
//! ```text
//! @event(id: 7) {
//!   title: [Launch @em[today]!]
//!   when: $schedule.start + 3600
//! }
//! ```
//!
//! Parsing goes through [`BlockParser`], [`MarkupParser`] and
//! [`SelectorParser`]; writing through [`ReconWriter`]. All of them are
//! generic over a [`ReconModel`] and default to the [`Value`] tree.
//!
//! # Example
//!
//! ```ignore
//! let value: Value = "@point {x: 1, y: 2}".parse()?;
//! assert_eq!(pullkit_recon::to_string(&value)?, "@point{x:1,y:2}");
//! ```

pub mod data;
mod error;
pub mod ident;
pub mod model;
pub mod number;
mod operator;
pub mod parser;
pub mod string;
mod value;
pub mod writer;

pub use error::ReconError;
pub use model::{InfixOp, ItemView, Precedence, PrefixOp, ReconModel, Step, ValueView};
pub use number::Num;
pub use parser::{
    BlockParser, MarkupParser, SelectorParser, parse_block, parse_markup, parse_selector,
};
pub use value::{Item, Operator, RecordBuilder, Value, ValueBuilder, ValueModel, intern};
pub use writer::ReconWriter;

use pullkit_core::{ParseConfig, parse_all, write_all};

/// Parses a complete Recon document.
pub fn parse(text: &str) -> Result<Value, ReconError> {
    parse_with_config(text, ParseConfig::default())
}

/// Parses a complete Recon document under `config`'s limits.
pub fn parse_with_config(text: &str, config: ParseConfig) -> Result<Value, ReconError> {
    Ok(parse_all(BlockParser::<ValueModel>::with_config(config), text)?)
}

/// Writes `value` in block form.
pub fn to_string(value: &Value) -> Result<String, ReconError> {
    Ok(write_all(ReconWriter::<ValueModel>::block(value))?)
}
