#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
//! HTTP/1.1 message parsing and encoding on the pullkit engine.
//!
//! Octets are read as ISO-8859-1 code points through [`BytesInput`], so
//! every parser here suspends at any byte boundary and resumes where it
//! stopped. Structured header values (media types, codings, weights,
//! products) are parsed into typed [`Header`] variants; anything else is
//! kept raw.
//!
//! ```text
//! RequestParser ─▶ RequestHead ─framing()─▶ BodyDecoder ─▶ Body
//! RequestHead + Entity ─▶ MessageEncoder ─pull─▶ ByteBuffer
//! ```
//!
//! # Example
//!
//! ```ignore
//! let (head, body) = pullkit_http::decode_request(
//!     b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 2\r\n\r\nhi",
//! )?;
//! assert_eq!(body.content, b"hi");
//! ```

pub mod body;
mod config;
pub mod encoder;
mod error;
pub mod grammar;
pub mod header;
pub mod message;
pub mod params;
pub mod values;

pub use body::{
    Body, BodyDecoder, ChunkHeader, ChunkHeaderParser, ChunkedDecoder, FixedBodyDecoder, Framing,
};
pub use config::HttpConfig;
pub use encoder::{ChunkedEncoder, Entity, FixedBodyEncoder, MessageEncoder};
pub use error::HttpError;
pub use header::{Header, HeaderParser, Headers, HeadersParser, canonical_name};
pub use message::{Method, RequestHead, RequestParser, ResponseHead, ResponseParser, Version};
pub use params::{Params, Weight};
pub use values::{
    Charset, ContentCoding, LanguageRange, MediaRange, MediaType, Product, TransferCoding,
    UpgradeProtocol,
};

use pullkit_core::{BytesInput, Diagnostic, Input, Parsed, Parser, encode_all};

/// Output buffer size used by the `encode_*` helpers.
const ENCODE_BUFFER: usize = 4096;

/// Starts reading a request head from `input`.
pub fn parse_request<I: Input + ?Sized>(input: &mut I) -> Parsed<RequestParser, RequestHead> {
    RequestParser::new().feed(input)
}

/// Starts reading a response head from `input`.
pub fn parse_response<I: Input + ?Sized>(input: &mut I) -> Parsed<ResponseParser, ResponseHead> {
    ResponseParser::new().feed(input)
}

/// Starts reading one `name: value CRLF` header field from `input`.
pub fn parse_header<I: Input + ?Sized>(input: &mut I) -> Parsed<HeaderParser, Header> {
    HeaderParser::new().feed(input)
}

/// Starts reading one chunk size line from `input`.
pub fn parse_chunk_header<I: Input + ?Sized>(
    input: &mut I,
) -> Parsed<ChunkHeaderParser, ChunkHeader> {
    ChunkHeaderParser::new().feed(input)
}

/// Reads a complete request, head and body, from `bytes`.
pub fn decode_request(bytes: &[u8]) -> Result<(RequestHead, Body), HttpError> {
    let config = HttpConfig::default();
    let mut input = BytesInput::new(bytes);
    let head = RequestParser::with_config(config)
        .feed(&mut input)
        .into_result(input.position())?;
    let body = decode_body(head.framing()?, config, &mut input)?;
    Ok((head, body))
}

/// Reads a complete response, head and body, from `bytes`.
pub fn decode_response(bytes: &[u8]) -> Result<(ResponseHead, Body), HttpError> {
    let config = HttpConfig::default();
    let mut input = BytesInput::new(bytes);
    let head = ResponseParser::with_config(config)
        .feed(&mut input)
        .into_result(input.position())?;
    let body = decode_body(head.framing()?, config, &mut input)?;
    Ok((head, body))
}

fn decode_body(
    framing: Framing,
    config: HttpConfig,
    input: &mut BytesInput<'_>,
) -> Result<Body, HttpError> {
    let body = framing
        .decoder(config)
        .feed(input)
        .into_result(input.position())?;
    if input.is_cont() {
        return Err(Diagnostic::unexpected(&*input).into());
    }
    Ok(body)
}

/// Writes `head` followed by `content`, framed per the head's headers.
pub fn encode_request(head: &RequestHead, content: &[u8]) -> Result<Vec<u8>, HttpError> {
    let entity = Entity::new(head.framing()?, content)?;
    Ok(encode_all(MessageEncoder::request(head, entity)?, ENCODE_BUFFER)?)
}

/// Writes `head` followed by `content`, framed per the head's headers.
pub fn encode_response(head: &ResponseHead, content: &[u8]) -> Result<Vec<u8>, HttpError> {
    let entity = Entity::new(head.framing()?, content)?;
    Ok(encode_all(MessageEncoder::response(head, entity)?, ENCODE_BUFFER)?)
}
