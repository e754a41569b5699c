//! Message body framing and decoders.
//!
//! A body is read from the same [`Input`] as the head, one octet per code
//! point. Chunked bodies are parsed as a sequence of chunk headers, data
//! runs and CRLFs, ending with the last chunk and the trailer fields.

use pullkit_core::{Diagnostic, Input, Parsed, Parser, resume};

use crate::config::HttpConfig;
use crate::grammar::expect;
use crate::header::{Headers, HeadersParser};
use crate::params::{ParamMode, Params, ParamsParser};

/// How a message body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Empty,
    Fixed(u64),
    Chunked,
}

impl Framing {
    pub fn decoder(self, config: HttpConfig) -> BodyDecoder {
        match self {
            Framing::Empty => BodyDecoder::Empty,
            Framing::Fixed(length) => BodyDecoder::Fixed(FixedBodyDecoder::new(length)),
            Framing::Chunked => BodyDecoder::Chunked(ChunkedDecoder::with_config(config)),
        }
    }
}

/// A decoded body and, for chunked bodies, its trailer fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    pub content: Vec<u8>,
    pub trailers: Headers,
}

fn octet<I: Input + ?Sized>(c: char, input: &I) -> Result<u8, Diagnostic> {
    u8::try_from(u32::from(c)).map_err(|_| Diagnostic::expected("octet", input))
}

/// Reads exactly `length` octets.
#[derive(Debug, Clone)]
pub struct FixedBodyDecoder {
    content: Vec<u8>,
    remaining: u64,
}

impl FixedBodyDecoder {
    pub fn new(length: u64) -> Self {
        Self {
            content: Vec::new(),
            remaining: length,
        }
    }
}

impl Parser for FixedBodyDecoder {
    type Value = Vec<u8>;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, Vec<u8>> {
        while self.remaining > 0 {
            match input.head() {
                Some(c) => match octet(c, input) {
                    Ok(byte) => {
                        input.step();
                        self.content.push(byte);
                        self.remaining -= 1;
                    }
                    Err(error) => return Parsed::Error(error),
                },
                None if input.is_empty() => return Parsed::Cont(self),
                None => return Parsed::Error(Diagnostic::expected("body octet", input)),
            }
        }
        Parsed::Done(self.content)
    }
}

/// The size line of one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkHeader {
    pub size: u64,
    /// Chunk extensions; a name without a value has an empty value.
    pub extensions: Params,
}

enum Line {
    Size,
    Extensions(ParamsParser),
    Cr,
    Lf,
}

/// Reads `chunk-size [ chunk-ext ] CRLF`.
pub struct ChunkHeaderParser {
    size: Option<u64>,
    extensions: Params,
    line: Line,
}

impl ChunkHeaderParser {
    pub fn new() -> Self {
        Self {
            size: None,
            extensions: Params::new(),
            line: Line::Size,
        }
    }
}

impl Default for ChunkHeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ChunkHeaderParser {
    type Value = ChunkHeader;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, ChunkHeader> {
        let ChunkHeaderParser {
            mut size,
            mut extensions,
            mut line,
        } = self;
        loop {
            line = match line {
                Line::Size => match input.head() {
                    Some(c) if c.is_ascii_hexdigit() => {
                        let digit = u64::from(c.to_digit(16).unwrap_or(0));
                        let Some(next) = size.unwrap_or(0).checked_mul(16).map(|s| s + digit) else {
                            return Parsed::Error(Diagnostic::message("chunk size out of range", input));
                        };
                        input.step();
                        size = Some(next);
                        Line::Size
                    }
                    None if input.is_empty() => {
                        return Parsed::Cont(ChunkHeaderParser {
                            size,
                            extensions,
                            line: Line::Size,
                        });
                    }
                    _ if size.is_none() => {
                        return Parsed::Error(Diagnostic::expected("chunk size", input));
                    }
                    _ => Line::Extensions(ParamsParser::new(ParamMode::Extension)),
                },
                Line::Extensions(parser) => {
                    extensions = resume!(parser.feed(input), |parser| ChunkHeaderParser {
                        size,
                        extensions,
                        line: Line::Extensions(parser),
                    });
                    Line::Cr
                }
                Line::Cr => match expect('\r', input) {
                    None => {
                        return Parsed::Cont(ChunkHeaderParser {
                            size,
                            extensions,
                            line: Line::Cr,
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Line::Lf,
                },
                Line::Lf => match expect('\n', input) {
                    None => {
                        return Parsed::Cont(ChunkHeaderParser {
                            size,
                            extensions,
                            line: Line::Lf,
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => {
                        return Parsed::Done(ChunkHeader {
                            size: size.unwrap_or(0),
                            extensions,
                        });
                    }
                },
            };
        }
    }
}

enum Chunk {
    Header(ChunkHeaderParser),
    Data(FixedBodyDecoder),
    Cr,
    Lf,
    Trailers(HeadersParser),
}

/// Reads a chunked body: chunks until the zero-size chunk, then trailers.
pub struct ChunkedDecoder {
    content: Vec<u8>,
    config: HttpConfig,
    chunk: Chunk,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Self {
        Self {
            content: Vec::new(),
            config,
            chunk: Chunk::Header(ChunkHeaderParser::new()),
        }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ChunkedDecoder {
    type Value = Body;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Body> {
        let ChunkedDecoder {
            mut content,
            config,
            mut chunk,
        } = self;
        loop {
            chunk = match chunk {
                Chunk::Header(parser) => {
                    let header = resume!(parser.feed(input), |parser| ChunkedDecoder {
                        content,
                        config,
                        chunk: Chunk::Header(parser),
                    });
                    if header.size == 0 {
                        Chunk::Trailers(HeadersParser::new(config))
                    } else {
                        Chunk::Data(FixedBodyDecoder::new(header.size))
                    }
                }
                Chunk::Data(decoder) => {
                    let data = resume!(decoder.feed(input), |decoder| {
                        log::trace!("chunk data suspended at {}", input.position());
                        ChunkedDecoder {
                            content,
                            config,
                            chunk: Chunk::Data(decoder),
                        }
                    });
                    content.extend_from_slice(&data);
                    Chunk::Cr
                }
                Chunk::Cr => match expect('\r', input) {
                    None => {
                        return Parsed::Cont(ChunkedDecoder {
                            content,
                            config,
                            chunk: Chunk::Cr,
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Chunk::Lf,
                },
                Chunk::Lf => match expect('\n', input) {
                    None => {
                        return Parsed::Cont(ChunkedDecoder {
                            content,
                            config,
                            chunk: Chunk::Lf,
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Chunk::Header(ChunkHeaderParser::new()),
                },
                Chunk::Trailers(parser) => {
                    let trailers = resume!(parser.feed(input), |parser| ChunkedDecoder {
                        content,
                        config,
                        chunk: Chunk::Trailers(parser),
                    });
                    return Parsed::Done(Body { content, trailers });
                }
            };
        }
    }
}

/// Reads a body with whichever [`Framing`] the head selected.
pub enum BodyDecoder {
    Empty,
    Fixed(FixedBodyDecoder),
    Chunked(ChunkedDecoder),
}

impl Parser for BodyDecoder {
    type Value = Body;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Body> {
        match self {
            BodyDecoder::Empty => Parsed::Done(Body::default()),
            BodyDecoder::Fixed(decoder) => decoder
                .feed(input)
                .map_cont(BodyDecoder::Fixed)
                .map(|content| Body {
                    content,
                    trailers: Headers::new(),
                }),
            BodyDecoder::Chunked(decoder) => decoder.feed(input).map_cont(BodyDecoder::Chunked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{Incremental, parse_all_bytes};

    use crate::header::Header;

    #[test]
    fn test_fixed_body() {
        assert_eq!(parse_all_bytes(FixedBodyDecoder::new(3), b"a\xffc").unwrap(), b"a\xffc");
        assert_eq!(parse_all_bytes(FixedBodyDecoder::new(0), b"").unwrap(), b"");
        assert!(parse_all_bytes(FixedBodyDecoder::new(4), b"abc").is_err());
    }

    #[test_case::test_case(b"5\r\n", 5; "decimal digit")]
    #[test_case::test_case(b"12c\r\n", 300; "hex digits")]
    #[test_case::test_case(b"1A;name=value;flag\r\n", 26; "extensions")]
    fn test_chunk_header(bytes: &[u8], size: u64) {
        assert_eq!(parse_all_bytes(ChunkHeaderParser::new(), bytes).unwrap().size, size);
    }

    #[test]
    fn test_chunk_extensions() {
        let header = parse_all_bytes(ChunkHeaderParser::new(), b"0 ; a=\"x y\" ; b\r\n").unwrap();
        assert_eq!(header.extensions.get("a"), Some("x y"));
        assert_eq!(header.extensions.get("b"), Some(""));
    }

    #[test_case::test_case(b"\r\n"; "missing size")]
    #[test_case::test_case(b"g\r\n"; "not hex")]
    #[test_case::test_case(b"11111111111111111\r\n"; "size overflow")]
    #[test_case::test_case(b"5\n"; "bare newline")]
    fn test_bad_chunk_header(bytes: &[u8]) {
        assert!(parse_all_bytes(ChunkHeaderParser::new(), bytes).is_err());
    }

    #[test]
    fn test_chunked_body_with_trailers() {
        let body = parse_all_bytes(
            ChunkedDecoder::new(),
            b"5\r\nhello\r\n7;ext\r\n, world\r\n0\r\nExpires: never\r\n\r\n",
        )
        .unwrap();
        assert_eq!(body.content, b"hello, world");
        assert_eq!(body.trailers.get("expires"), Some(&Header::raw("Expires", "never")));
    }

    #[test]
    fn test_chunked_body_byte_by_byte() {
        let encoded = b"3\r\nabc\r\n1\r\nd\r\n0\r\n\r\n";
        let mut parse = Incremental::new(ChunkedDecoder::new());
        for byte in encoded {
            parse.feed_bytes(&[*byte]).unwrap();
        }
        assert_eq!(parse.finish().unwrap().content, b"abcd");
    }

    #[test]
    fn test_chunk_data_must_end_with_crlf() {
        let error = parse_all_bytes(ChunkedDecoder::new(), b"2\r\nabc\r\n0\r\n\r\n").unwrap_err();
        assert_eq!(error.to_string(), "expected '\\r' but found 'c' at 2:3");
    }

    #[test]
    fn test_body_decoder_by_framing() {
        let config = HttpConfig::default();
        assert_eq!(parse_all_bytes(Framing::Empty.decoder(config), b"").unwrap(), Body::default());
        assert_eq!(parse_all_bytes(Framing::Fixed(2).decoder(config), b"hi").unwrap().content, b"hi");
        assert_eq!(
            parse_all_bytes(Framing::Chunked.decoder(config), b"2\r\nhi\r\n0\r\n\r\n").unwrap().content,
            b"hi"
        );
    }
}
