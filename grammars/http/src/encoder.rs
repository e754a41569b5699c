//! Message encoders.
//!
//! Encoders write into an [`OutputBuffer`] and suspend whenever it fills.
//! The chunked encoder reserves room for the size line in front of each
//! chunk, lets the inner encoder fill the rest, then writes the size and
//! slides the framed chunk back over the unused part of the reserve.

use pullkit_core::{Encoder, OutputBuffer, WriteError, Written};

use crate::body::Framing;
use crate::error::HttpError;
use crate::header::Headers;
use crate::message::{RequestHead, ResponseHead};

/// Octets reserved in front of each chunk: 8 hex digits and CRLF.
const RESERVE: usize = 10;

/// Largest chunk whose size fits in the reserve.
const MAX_CHUNK: usize = 0xFFFF_FFFF;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Writes `text[offset..]`, advancing `offset`. `Ok(true)` once all of it
/// is written, `Ok(false)` when the buffer filled first.
fn write_text<B: OutputBuffer + ?Sized>(
    buffer: &mut B,
    text: &str,
    offset: &mut usize,
) -> Result<bool, WriteError> {
    *offset = buffer.write_from(text, *offset);
    if buffer.is_error() {
        log::warn!("octet buffer faulted while writing {:?}", text);
        return Err(WriteError::BufferOverflow);
    }
    Ok(*offset == text.len())
}

/// Writes a byte slice as-is.
#[derive(Debug, Clone)]
pub struct FixedBodyEncoder<'a> {
    content: &'a [u8],
    offset: usize,
}

impl<'a> FixedBodyEncoder<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self { content, offset: 0 }
    }
}

impl Encoder for FixedBodyEncoder<'_> {
    type Value = ();

    fn pull<B: OutputBuffer + ?Sized>(mut self, buffer: &mut B) -> Written<Self, ()> {
        self.offset += buffer.write_slice(&self.content[self.offset..]);
        if buffer.is_error() {
            return Written::Error(WriteError::BufferOverflow);
        }
        if self.offset == self.content.len() {
            Written::Done(())
        } else {
            Written::Cont(self)
        }
    }
}

#[derive(Debug, Clone)]
enum Chunks<E> {
    Data(E),
    Last(usize),
}

/// Frames everything an inner encoder writes as chunks, then writes the
/// last chunk and any trailer fields.
///
/// # Example
///
/// ```ignore
/// let bytes = encode_all(ChunkedEncoder::new(FixedBodyEncoder::new(b"hello")), 64)?;
/// assert_eq!(bytes, b"5\r\nhello\r\n0\r\n\r\n");
/// ```
#[derive(Debug, Clone)]
pub struct ChunkedEncoder<E> {
    chunks: Chunks<E>,
    /// The last chunk, trailer lines and the closing CRLF.
    tail: String,
}

impl<E: Encoder> ChunkedEncoder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            chunks: Chunks::Data(inner),
            tail: String::from("0\r\n\r\n"),
        }
    }

    pub fn with_trailers(mut self, trailers: &Headers) -> Result<Self, HttpError> {
        let mut tail = String::from("0\r\n");
        for header in trailers {
            header.render(&mut tail)?;
            tail.push_str("\r\n");
        }
        tail.push_str("\r\n");
        self.tail = tail;
        Ok(self)
    }
}

/// Writes the size line in front of `data..end` and the CRLF after it,
/// then moves the framed chunk down to `start`.
fn frame<B: OutputBuffer + ?Sized>(buffer: &mut B, start: usize, data: usize, end: usize) {
    let size = (end - data) as u64;
    let mut digits = 1;
    while digits < 16 && size >> (4 * digits) != 0 {
        digits += 1;
    }
    let head = data - digits - 2;
    buffer.set_index(head);
    for shift in (0..digits).rev() {
        buffer.write_byte(HEX[((size >> (4 * shift)) & 0xf) as usize]);
    }
    buffer.write_byte(b'\r');
    buffer.write_byte(b'\n');
    buffer.set_index(end);
    buffer.write_byte(b'\r');
    buffer.write_byte(b'\n');
    let len = end + 2 - head;
    buffer.move_bytes(head, start, len);
    buffer.set_index(start + len);
}

impl<E: Encoder<Value = ()>> Encoder for ChunkedEncoder<E> {
    type Value = ();

    fn pull<B: OutputBuffer + ?Sized>(self, buffer: &mut B) -> Written<Self, ()> {
        let ChunkedEncoder { mut chunks, tail } = self;
        loop {
            chunks = match chunks {
                Chunks::Data(inner) => {
                    let start = buffer.index();
                    let limit = buffer.limit();
                    // Size line, one octet and the closing CRLF.
                    if limit.saturating_sub(start) < RESERVE + 3 {
                        log::trace!("chunked encoder suspended at octet {}", start);
                        return Written::Cont(ChunkedEncoder {
                            chunks: Chunks::Data(inner),
                            tail,
                        });
                    }
                    let data = start + RESERVE;
                    let data_limit = (limit - 2).min(data.saturating_add(MAX_CHUNK));
                    buffer.set_index(data);
                    buffer.set_limit(data_limit);
                    let pulled = inner.pull(buffer);
                    let end = buffer.index();
                    buffer.set_limit(limit);
                    if buffer.is_error() || end > data_limit {
                        log::warn!("inner encoder wrote past its {} octet region", data_limit - data);
                        return Written::Error(WriteError::BufferOverflow);
                    }
                    if end < data {
                        log::warn!("inner encoder moved the index back to {}", end);
                        return Written::Error(WriteError::BufferUnderflow);
                    }
                    if end == data {
                        buffer.set_index(start);
                    } else {
                        frame(buffer, start, data, end);
                    }
                    match pulled {
                        Written::Done(()) => Chunks::Last(0),
                        Written::Cont(inner) if end == data => {
                            return Written::Cont(ChunkedEncoder {
                                chunks: Chunks::Data(inner),
                                tail,
                            });
                        }
                        Written::Cont(inner) => Chunks::Data(inner),
                        Written::Error(error) => return Written::Error(error),
                    }
                }
                Chunks::Last(mut offset) => {
                    return match write_text(buffer, &tail, &mut offset) {
                        Ok(true) => Written::Done(()),
                        Ok(false) => Written::Cont(ChunkedEncoder {
                            chunks: Chunks::Last(offset),
                            tail,
                        }),
                        Err(error) => Written::Error(error),
                    };
                }
            };
        }
    }
}

/// The body of a message, encoded per its framing.
#[derive(Debug, Clone)]
pub enum Entity<'a> {
    Empty,
    Fixed(FixedBodyEncoder<'a>),
    Chunked(ChunkedEncoder<FixedBodyEncoder<'a>>),
}

impl<'a> Entity<'a> {
    /// Fails when a fixed framing disagrees with the content length.
    pub fn new(framing: Framing, content: &'a [u8]) -> Result<Self, HttpError> {
        let length = content.len() as u64;
        match framing {
            Framing::Empty if content.is_empty() => Ok(Entity::Empty),
            Framing::Empty => Err(HttpError::ConflictingLength {
                first: 0,
                second: length,
            }),
            Framing::Fixed(declared) if declared == length => {
                Ok(Entity::Fixed(FixedBodyEncoder::new(content)))
            }
            Framing::Fixed(declared) => Err(HttpError::ConflictingLength {
                first: declared,
                second: length,
            }),
            Framing::Chunked => Ok(Entity::Chunked(ChunkedEncoder::new(FixedBodyEncoder::new(
                content,
            )))),
        }
    }
}

impl Encoder for Entity<'_> {
    type Value = ();

    fn pull<B: OutputBuffer + ?Sized>(self, buffer: &mut B) -> Written<Self, ()> {
        match self {
            Entity::Empty => Written::Done(()),
            Entity::Fixed(encoder) => encoder.pull(buffer).map_cont(Entity::Fixed),
            Entity::Chunked(encoder) => encoder.pull(buffer).map_cont(Entity::Chunked),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Start,
    Header(usize),
    Blank,
    Entity,
}

/// Writes a start line, the header block and an entity.
///
/// Header fields are rendered one at a time into a reused line buffer, so
/// a field that cannot be written fails the encoder when it is reached.
///
/// # Example
///
/// ```ignore
/// let head = RequestHead::new(Method::Post, "/").with_header(Header::ContentLength(5));
/// let entity = Entity::new(head.framing()?, b"hello")?;
/// let bytes = encode_all(MessageEncoder::request(&head, entity)?, 4096)?;
/// ```
#[derive(Debug, Clone)]
pub struct MessageEncoder<'a, E> {
    start: String,
    headers: &'a Headers,
    line: String,
    offset: usize,
    part: Part,
    entity: E,
}

impl<'a, E: Encoder> MessageEncoder<'a, E> {
    pub fn request(head: &'a RequestHead, entity: E) -> Result<Self, HttpError> {
        Ok(Self::new(head.start_line()?, &head.headers, entity))
    }

    pub fn response(head: &'a ResponseHead, entity: E) -> Result<Self, HttpError> {
        Ok(Self::new(head.start_line()?, &head.headers, entity))
    }

    fn new(start: String, headers: &'a Headers, entity: E) -> Self {
        Self {
            start,
            headers,
            line: String::new(),
            offset: 0,
            part: Part::Start,
            entity,
        }
    }

    /// Renders header `index` into the line buffer, or moves on to the
    /// blank line after the last one.
    fn enter_header(&mut self, index: usize) -> Result<(), WriteError> {
        self.offset = 0;
        let Some(header) = self.headers.iter().nth(index) else {
            self.part = Part::Blank;
            return Ok(());
        };
        self.line.clear();
        if let Err(error) = header.render(&mut self.line) {
            log::warn!("cannot write {} header: {}", header.name(), error);
            return Err(WriteError::Message(error.to_string().into()));
        }
        self.line.push_str("\r\n");
        self.part = Part::Header(index);
        Ok(())
    }
}

impl<E: Encoder> Encoder for MessageEncoder<'_, E> {
    type Value = E::Value;

    fn pull<B: OutputBuffer + ?Sized>(mut self, buffer: &mut B) -> Written<Self, E::Value> {
        loop {
            let written = match self.part {
                Part::Start => write_text(buffer, &self.start, &mut self.offset),
                Part::Header(_) => write_text(buffer, &self.line, &mut self.offset),
                Part::Blank => write_text(buffer, "\r\n", &mut self.offset),
                Part::Entity => {
                    let MessageEncoder {
                        start,
                        headers,
                        line,
                        offset,
                        part,
                        entity,
                    } = self;
                    return entity.pull(buffer).map_cont(|entity| MessageEncoder {
                        start,
                        headers,
                        line,
                        offset,
                        part,
                        entity,
                    });
                }
            };
            match written {
                Ok(true) => {}
                Ok(false) => return Written::Cont(self),
                Err(error) => return Written::Error(error),
            }
            let next = match self.part {
                Part::Start => self.enter_header(0),
                Part::Header(index) => self.enter_header(index + 1),
                _ => {
                    self.part = Part::Entity;
                    Ok(())
                }
            };
            if let Err(error) = next {
                return Written::Error(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ChunkedDecoder;
    use crate::header::Header;
    use crate::message::Method;
    use pullkit_core::{ByteBuffer, encode_all, parse_all_bytes};

    fn chunked(content: &[u8], buffer_size: usize) -> Vec<u8> {
        encode_all(ChunkedEncoder::new(FixedBodyEncoder::new(content)), buffer_size).unwrap()
    }

    #[test]
    fn test_fixed_body() {
        let bytes = encode_all(FixedBodyEncoder::new(b"hello world"), 4).unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn test_single_chunk() {
        assert_eq!(chunked(b"hello", 64), b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn test_empty_chunked_body() {
        assert_eq!(chunked(b"", 64), b"0\r\n\r\n");
    }

    #[test]
    fn test_hex_size_line() {
        let content = vec![b'x'; 300];
        let bytes = chunked(&content, 4096);
        assert!(bytes.starts_with(b"12c\r\n"));
        assert!(bytes.ends_with(b"x\r\n0\r\n\r\n"));
        assert_eq!(bytes.len(), 5 + 300 + 2 + 5);
    }

    #[test_case::test_case(13; "one octet per chunk")]
    #[test_case::test_case(16; "tiny")]
    #[test_case::test_case(100; "small")]
    #[test_case::test_case(8192; "large")]
    fn test_chunks_decode_to_content(buffer_size: usize) {
        let content: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let bytes = chunked(&content, buffer_size);
        let body = parse_all_bytes(ChunkedDecoder::new(), &bytes).unwrap();
        assert_eq!(body.content, content);
    }

    #[test]
    fn test_buffer_too_small_for_a_chunk() {
        let encoder = ChunkedEncoder::new(FixedBodyEncoder::new(b"hello"));
        assert_eq!(encode_all(encoder, 12), Err(WriteError::Stalled));
    }

    #[test]
    fn test_chunk_is_packed_to_the_start() {
        let mut buffer = ByteBuffer::with_capacity(20);
        let state = ChunkedEncoder::new(FixedBodyEncoder::new(b"abcdefghij")).pull(&mut buffer);
        assert!(state.is_cont());
        assert_eq!(buffer.as_slice(), b"8\r\nabcdefgh\r\n");
    }

    #[test]
    fn test_trailers() {
        let trailers = Headers::new().with(Header::raw("expires", "never"));
        let encoder = ChunkedEncoder::new(FixedBodyEncoder::new(b"ab"))
            .with_trailers(&trailers)
            .unwrap();
        let bytes = encode_all(encoder, 64).unwrap();
        assert_eq!(bytes, b"2\r\nab\r\n0\r\nExpires: never\r\n\r\n");
        let body = parse_all_bytes(ChunkedDecoder::new(), &bytes).unwrap();
        assert_eq!(body.trailers, trailers);
    }

    /// An encoder that claims progress it did not make.
    struct Rewind;

    impl Encoder for Rewind {
        type Value = ();

        fn pull<B: OutputBuffer + ?Sized>(self, buffer: &mut B) -> Written<Self, ()> {
            buffer.set_index(buffer.index() - 1);
            Written::Done(())
        }
    }

    #[test]
    fn test_inner_underflow() {
        let mut buffer = ByteBuffer::with_capacity(64);
        let state = ChunkedEncoder::new(Rewind).pull(&mut buffer);
        assert_eq!(state.map_cont(|_| ()), Written::Error(WriteError::BufferUnderflow));
    }

    #[test]
    fn test_entity_length_mismatch() {
        assert_eq!(
            Entity::new(Framing::Fixed(3), b"hello").unwrap_err(),
            HttpError::ConflictingLength { first: 3, second: 5 }
        );
        assert!(Entity::new(Framing::Empty, b"x").is_err());
    }

    #[test]
    fn test_request_message() {
        let head = RequestHead::new(Method::Post, "/submit")
            .with_header(Header::Host("example.com".to_owned()))
            .with_header(Header::ContentLength(5));
        let entity = Entity::new(head.framing().unwrap(), b"hello").unwrap();
        let bytes = encode_all(MessageEncoder::request(&head, entity).unwrap(), 7).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        insta::assert_debug_snapshot!(text, @r#""POST /submit HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello""#);
    }

    #[test]
    fn test_chunked_response_message() {
        let head = ResponseHead::new(200, "OK")
            .with_header(Header::TransferEncoding(vec![crate::values::TransferCoding::chunked()]));
        let entity = Entity::new(head.framing().unwrap(), b"hi").unwrap();
        let bytes = encode_all(MessageEncoder::response(&head, entity).unwrap(), 64).unwrap();
        assert_eq!(
            bytes,
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nhi\r\n0\r\n\r\n"
        );
    }

    #[test]
    fn test_unwritable_header() {
        let head = RequestHead::new(Method::Get, "/").with_header(Header::raw("bad name", "x"));
        let encoder = MessageEncoder::request(&head, Entity::Empty).unwrap();
        assert!(matches!(encode_all(encoder, 64), Err(WriteError::Message(_))));
    }
}
