#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
//! Resumable, non-blocking parsers and writers for Recon and HTTP/1.1.
//!
//! The engine is re-exported at the root; the grammars live under
//! [`recon`] and [`http`] behind features of the same names.

pub use pullkit_core::*;

#[cfg(feature = "http")]
pub use pullkit_http as http;
#[cfg(feature = "recon")]
pub use pullkit_recon as recon;
