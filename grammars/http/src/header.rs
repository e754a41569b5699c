//! Header fields and header blocks.

use std::sync::{Arc, OnceLock};

use pullkit_core::{BoundedLruCache, Diagnostic, Error, Input, Parsed, Parser, resume};

use crate::body::Framing;
use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::grammar::{TokenParser, expect, is_obs_text, is_space, is_vchar, skip_space, write_token};
use crate::values::{
    Charset, ContentCoding, ElementParser, LanguageRange, ListParser, MediaRange, MediaType,
    Product, ProductsParser, TransferCoding, UpgradeProtocol, at_value_end, intern_media_type,
    render_list,
};

static NAMES: OnceLock<BoundedLruCache<String, Arc<str>>> = OnceLock::new();

/// The conventional spelling of a header name: each `-`-separated word
/// capitalised, as in `X-Request-Id`.
pub fn canonical_name(name: &str) -> Arc<str> {
    let names = NAMES.get_or_init(|| BoundedLruCache::new(256));
    let key = name.to_ascii_lowercase();
    if let Some(cached) = names.get(&key) {
        return cached;
    }
    let mut canonical = String::with_capacity(key.len());
    let mut upper = true;
    for c in key.chars() {
        canonical.push(if upper { c.to_ascii_uppercase() } else { c });
        upper = c == '-';
    }
    let canonical = Arc::<str>::from(canonical);
    names.put(key, canonical.clone());
    canonical
}

/// A header field, parsed structurally when its name is known.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Header {
    ContentLength(u64),
    TransferEncoding(Vec<TransferCoding>),
    ContentEncoding(Vec<ContentCoding>),
    ContentType(Arc<MediaType>),
    Accept(Vec<MediaRange>),
    AcceptCharset(Vec<Charset>),
    AcceptEncoding(Vec<ContentCoding>),
    AcceptLanguage(Vec<LanguageRange>),
    Upgrade(Vec<UpgradeProtocol>),
    Connection(Vec<String>),
    Host(String),
    UserAgent(Vec<Product>),
    Server(Vec<Product>),
    Raw { name: Arc<str>, value: String },
}

impl Header {
    pub fn raw(name: &str, value: &str) -> Self {
        Header::Raw {
            name: canonical_name(name),
            value: value.to_owned(),
        }
    }

    pub fn content_type(media_type: MediaType) -> Self {
        Header::ContentType(intern_media_type(media_type))
    }

    pub fn name(&self) -> &str {
        match self {
            Header::ContentLength(_) => "Content-Length",
            Header::TransferEncoding(_) => "Transfer-Encoding",
            Header::ContentEncoding(_) => "Content-Encoding",
            Header::ContentType(_) => "Content-Type",
            Header::Accept(_) => "Accept",
            Header::AcceptCharset(_) => "Accept-Charset",
            Header::AcceptEncoding(_) => "Accept-Encoding",
            Header::AcceptLanguage(_) => "Accept-Language",
            Header::Upgrade(_) => "Upgrade",
            Header::Connection(_) => "Connection",
            Header::Host(_) => "Host",
            Header::UserAgent(_) => "User-Agent",
            Header::Server(_) => "Server",
            Header::Raw { name, .. } => name,
        }
    }

    /// Appends `Name: value`, without the line terminator.
    pub fn render(&self, line: &mut String) -> Result<(), HttpError> {
        write_token(line, self.name())?;
        line.push_str(": ");
        match self {
            Header::ContentLength(length) => line.push_str(&length.to_string()),
            Header::TransferEncoding(codings) => render_list(line, codings, TransferCoding::render)?,
            Header::ContentEncoding(codings) | Header::AcceptEncoding(codings) => {
                render_list(line, codings, ContentCoding::render)?
            }
            Header::ContentType(media_type) => media_type.render(line)?,
            Header::Accept(ranges) => render_list(line, ranges, MediaRange::render)?,
            Header::AcceptCharset(charsets) => render_list(line, charsets, Charset::render)?,
            Header::AcceptLanguage(ranges) => render_list(line, ranges, LanguageRange::render)?,
            Header::Upgrade(protocols) => render_list(line, protocols, UpgradeProtocol::render)?,
            Header::Connection(options) => {
                render_list(line, options, |option, line| write_token(line, option))?
            }
            Header::UserAgent(products) | Header::Server(products) => {
                for (index, product) in products.iter().enumerate() {
                    if index > 0 {
                        line.push(' ');
                    }
                    product.render(line)?;
                }
            }
            Header::Host(value) | Header::Raw { value, .. } => {
                if !value.chars().all(is_field_char) || value.starts_with(is_space) {
                    return Err(HttpError::InvalidValue(value.clone()));
                }
                line.push_str(value.trim_end_matches(is_space));
            }
        }
        Ok(())
    }

    /// The rendered field, `Name: value`.
    pub fn to_line(&self) -> Result<String, HttpError> {
        let mut line = String::new();
        self.render(&mut line)?;
        Ok(line)
    }
}

fn is_field_char(c: char) -> bool {
    is_vchar(c) || is_space(c) || is_obs_text(c)
}

/// Which value grammar a header name selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    ContentLength,
    TransferEncoding,
    ContentEncoding,
    ContentType,
    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    Upgrade,
    Connection,
    Host,
    UserAgent,
    Server,
    Other,
}

const KINDS: [(&str, Kind); 13] = [
    ("content-length", Kind::ContentLength),
    ("transfer-encoding", Kind::TransferEncoding),
    ("content-encoding", Kind::ContentEncoding),
    ("content-type", Kind::ContentType),
    ("accept", Kind::Accept),
    ("accept-charset", Kind::AcceptCharset),
    ("accept-encoding", Kind::AcceptEncoding),
    ("accept-language", Kind::AcceptLanguage),
    ("upgrade", Kind::Upgrade),
    ("connection", Kind::Connection),
    ("host", Kind::Host),
    ("user-agent", Kind::UserAgent),
    ("server", Kind::Server),
];

impl Kind {
    fn of(name: &str) -> Self {
        KINDS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map_or(Kind::Other, |(_, kind)| *kind)
    }

    fn element(self) -> fn() -> ElementParser {
        match self {
            Kind::TransferEncoding => TransferCoding::parser,
            Kind::ContentEncoding | Kind::AcceptEncoding => ContentCoding::parser,
            Kind::Accept => MediaRange::parser,
            Kind::AcceptCharset => Charset::parser,
            Kind::AcceptLanguage => LanguageRange::parser,
            Kind::Upgrade => UpgradeProtocol::parser,
            _ => ElementParser::token,
        }
    }

    fn value_parser(self) -> ValueParser {
        match self {
            Kind::ContentLength => ValueParser::Length(LengthParser::new()),
            Kind::ContentType => ValueParser::ContentType(MediaType::parser()),
            Kind::UserAgent | Kind::Server => ValueParser::Products(ProductsParser::new()),
            Kind::Host | Kind::Other => ValueParser::Raw(RawParser::new()),
            _ => ValueParser::List(ListParser::new(self.element())),
        }
    }
}

/// Reads a decimal `Content-Length`.
#[derive(Debug, Clone, Copy)]
struct LengthParser {
    value: Option<u64>,
}

impl LengthParser {
    fn new() -> Self {
        Self { value: None }
    }
}

impl Parser for LengthParser {
    type Value = u64;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, u64> {
        loop {
            match input.head() {
                Some(c @ '0'..='9') => {
                    let digit = u64::from(c as u8 - b'0');
                    let Some(value) = self.value.unwrap_or(0).checked_mul(10).and_then(|v| v.checked_add(digit))
                    else {
                        return Parsed::Error(Diagnostic::message("content length out of range", input));
                    };
                    input.step();
                    self.value = Some(value);
                }
                None if input.is_empty() => return Parsed::Cont(self),
                _ => {
                    return match self.value {
                        Some(value) => Parsed::Done(value),
                        None => Parsed::Error(Diagnostic::expected("content length", input)),
                    };
                }
            }
        }
    }
}

/// Reads a field value verbatim up to the line end, dropping trailing
/// whitespace.
#[derive(Debug, Clone, Default)]
struct RawParser {
    text: String,
}

impl RawParser {
    fn new() -> Self {
        Self::default()
    }
}

impl Parser for RawParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            match input.head() {
                Some(c) if is_field_char(c) => {
                    input.step();
                    self.text.push(c);
                }
                None if input.is_empty() => return Parsed::Cont(self),
                _ if at_value_end(input) => {
                    let len = self.text.trim_end_matches(is_space).len();
                    self.text.truncate(len);
                    return Parsed::Done(self.text);
                }
                _ => return Parsed::Error(Diagnostic::unexpected(input)),
            }
        }
    }
}

enum ValueParser {
    Length(LengthParser),
    List(ListParser<ElementParser>),
    ContentType(ElementParser),
    Products(ProductsParser),
    Raw(RawParser),
}

enum Field {
    Name(TokenParser),
    Colon(String),
    Space(String),
    Value(String, Kind, ValueParser),
    Cr(Header),
    Lf(Header),
}

fn build(name: String, kind: Kind, value: Value) -> Header {
    match (kind, value) {
        (_, Value::Length(length)) => Header::ContentLength(length),
        (_, Value::ContentType(element)) => {
            Header::ContentType(intern_media_type(MediaType::from_element(element)))
        }
        (Kind::UserAgent, Value::Products(products)) => Header::UserAgent(products),
        (_, Value::Products(products)) => Header::Server(products),
        (Kind::Host, Value::Raw(value)) => Header::Host(value),
        (_, Value::Raw(value)) => Header::Raw {
            name: canonical_name(&name),
            value,
        },
        (kind, Value::List(elements)) => {
            let elements = elements.into_iter();
            match kind {
                Kind::TransferEncoding => {
                    Header::TransferEncoding(elements.map(TransferCoding::from_element).collect())
                }
                Kind::ContentEncoding => {
                    Header::ContentEncoding(elements.map(ContentCoding::from_element).collect())
                }
                Kind::AcceptEncoding => {
                    Header::AcceptEncoding(elements.map(ContentCoding::from_element).collect())
                }
                Kind::Accept => Header::Accept(elements.map(MediaRange::from_element).collect()),
                Kind::AcceptCharset => {
                    Header::AcceptCharset(elements.map(Charset::from_element).collect())
                }
                Kind::AcceptLanguage => {
                    Header::AcceptLanguage(elements.map(LanguageRange::from_element).collect())
                }
                Kind::Upgrade => {
                    Header::Upgrade(elements.map(UpgradeProtocol::from_element).collect())
                }
                _ => Header::Connection(elements.map(|element| element.name).collect()),
            }
        }
    }
}

enum Value {
    Length(u64),
    List(Vec<crate::values::Element>),
    ContentType(crate::values::Element),
    Products(Vec<Product>),
    Raw(String),
}

impl ValueParser {
    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Value> {
        match self {
            ValueParser::Length(parser) => parser.feed(input).map_cont(ValueParser::Length).map(Value::Length),
            ValueParser::List(parser) => parser.feed(input).map_cont(ValueParser::List).map(Value::List),
            ValueParser::ContentType(parser) => parser
                .feed(input)
                .map_cont(ValueParser::ContentType)
                .map(Value::ContentType),
            ValueParser::Products(parser) => parser
                .feed(input)
                .map_cont(ValueParser::Products)
                .map(Value::Products),
            ValueParser::Raw(parser) => parser.feed(input).map_cont(ValueParser::Raw).map(Value::Raw),
        }
    }
}

/// Reads one `name: value CRLF` header line.
///
/// # Example
///
/// ```ignore
/// let header = parse_all_bytes(HeaderParser::new(), b"Content-Length: 42\r\n")?;
/// assert_eq!(header, Header::ContentLength(42));
/// ```
pub struct HeaderParser {
    field: Field,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self {
            field: Field::Name(TokenParser::new()),
        }
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HeaderParser {
    type Value = Header;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Header> {
        let mut field = self.field;
        loop {
            field = match field {
                Field::Name(parser) => {
                    let name = resume!(parser.feed(input), |parser| HeaderParser {
                        field: Field::Name(parser),
                    });
                    Field::Colon(name)
                }
                Field::Colon(name) => match expect(':', input) {
                    None => return Parsed::Cont(HeaderParser { field: Field::Colon(name) }),
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Field::Space(name),
                },
                Field::Space(name) => {
                    if !skip_space(input) {
                        return Parsed::Cont(HeaderParser { field: Field::Space(name) });
                    }
                    let kind = Kind::of(&name);
                    Field::Value(name, kind, kind.value_parser())
                }
                Field::Value(name, kind, parser) => {
                    let value = resume!(parser.feed(input), |parser| HeaderParser {
                        field: Field::Value(name, kind, parser),
                    });
                    Field::Cr(build(name, kind, value))
                }
                Field::Cr(header) => {
                    if !skip_space(input) {
                        return Parsed::Cont(HeaderParser { field: Field::Cr(header) });
                    }
                    match expect('\r', input) {
                        None => return Parsed::Cont(HeaderParser { field: Field::Cr(header) }),
                        Some(Err(error)) => return Parsed::Error(error),
                        Some(Ok(())) => Field::Lf(header),
                    }
                }
                Field::Lf(header) => match expect('\n', input) {
                    None => return Parsed::Cont(HeaderParser { field: Field::Lf(header) }),
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => return Parsed::Done(header),
                },
            };
        }
    }
}

/// Fails a line parser that consumes more than `limit` code points.
pub(crate) struct Bounded<P> {
    parser: P,
    start: Option<usize>,
    limit: usize,
}

impl<P: Parser> Bounded<P> {
    pub(crate) fn new(parser: P, limit: usize) -> Self {
        Self {
            parser,
            start: None,
            limit,
        }
    }
}

impl<P: Parser> Parser for Bounded<P> {
    type Value = P::Value;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, P::Value> {
        let Bounded { parser, start, limit } = self;
        let start = start.unwrap_or(input.position().offset);
        let parsed = parser.feed(input);
        let consumed = input.position().offset - start;
        if consumed > limit {
            return Parsed::Error(Diagnostic::limit(Error::InputLimitExceeded { consumed, limit }, input));
        }
        parsed.map_cont(|parser| Bounded {
            parser,
            start: Some(start),
            limit,
        })
    }
}

/// An ordered list of header fields.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: Header) {
        self.0.push(header);
    }

    #[must_use]
    pub fn with(mut self, header: Header) -> Self {
        self.0.push(header);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.0.iter()
    }

    /// The first field named `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.0.iter().find(|header| header.name().eq_ignore_ascii_case(name))
    }

    pub fn host(&self) -> Option<&str> {
        self.0.iter().find_map(|header| match header {
            Header::Host(host) => Some(host.as_str()),
            _ => None,
        })
    }

    pub fn content_type(&self) -> Option<&MediaType> {
        self.0.iter().find_map(|header| match header {
            Header::ContentType(media_type) => Some(&**media_type),
            _ => None,
        })
    }

    /// Every transfer coding, across all `Transfer-Encoding` fields.
    pub fn transfer_codings(&self) -> impl Iterator<Item = &TransferCoding> {
        self.0.iter().flat_map(|header| match header {
            Header::TransferEncoding(codings) => codings.as_slice(),
            _ => &[],
        })
    }

    /// The agreed `Content-Length`, if any field gives one.
    pub fn content_length(&self) -> Result<Option<u64>, HttpError> {
        let mut lengths = self.0.iter().filter_map(|header| match header {
            Header::ContentLength(length) => Some(*length),
            _ => None,
        });
        let Some(first) = lengths.next() else {
            return Ok(None);
        };
        match lengths.find(|length| *length != first) {
            Some(second) => Err(HttpError::ConflictingLength { first, second }),
            None => Ok(Some(first)),
        }
    }

    /// How the message body is delimited.
    ///
    /// `Content-Length` and a final `chunked` transfer coding are mutually
    /// exclusive; with neither the body is empty.
    pub fn framing(&self) -> Result<Framing, HttpError> {
        for name in ["Host", "Content-Type"] {
            let count = self.0.iter().filter(|header| header.name() == name).count();
            if count > 1 {
                return Err(HttpError::DuplicateHeader(name.to_owned()));
            }
        }
        let length = self.content_length()?;
        let codings: Vec<_> = self.transfer_codings().collect();
        let Some((last, rest)) = codings.split_last() else {
            return Ok(length.map_or(Framing::Empty, Framing::Fixed));
        };
        if length.is_some() {
            return Err(HttpError::AmbiguousFraming);
        }
        if !last.is_chunked() {
            return Err(HttpError::UnsupportedCoding(last.name.to_string()));
        }
        if let Some(coding) = rest.first() {
            return Err(HttpError::UnsupportedCoding(coding.name.to_string()));
        }
        Ok(Framing::Chunked)
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<T: IntoIterator<Item = Header>>(iter: T) -> Self {
        Headers(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

enum Block {
    Line,
    Lf,
    Field(Bounded<HeaderParser>),
}

/// Reads header lines up to and including the empty line.
pub struct HeadersParser {
    headers: Headers,
    config: HttpConfig,
    block: Block,
}

impl HeadersParser {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            headers: Headers::new(),
            config,
            block: Block::Line,
        }
    }
}

impl Parser for HeadersParser {
    type Value = Headers;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Headers> {
        let HeadersParser {
            mut headers,
            config,
            mut block,
        } = self;
        loop {
            block = match block {
                Block::Line => match input.head() {
                    Some('\r') => {
                        input.step();
                        Block::Lf
                    }
                    None if input.is_empty() => {
                        return Parsed::Cont(HeadersParser {
                            headers,
                            config,
                            block: Block::Line,
                        });
                    }
                    _ if headers.len() >= config.max_headers => {
                        return Parsed::Error(Diagnostic::message("too many header fields", input));
                    }
                    _ => Block::Field(Bounded::new(HeaderParser::new(), config.max_line_len)),
                },
                Block::Lf => match expect('\n', input) {
                    None => {
                        return Parsed::Cont(HeadersParser {
                            headers,
                            config,
                            block: Block::Lf,
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => return Parsed::Done(headers),
                },
                Block::Field(parser) => {
                    let header = resume!(parser.feed(input), |parser| {
                        log::trace!("header field suspended at {}", input.position());
                        HeadersParser {
                            headers,
                            config,
                            block: Block::Field(parser),
                        }
                    });
                    headers.push(header);
                    Block::Line
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{Incremental, parse_all_bytes};

    use crate::params::Weight;

    fn header(bytes: &[u8]) -> Header {
        parse_all_bytes(HeaderParser::new(), bytes).unwrap()
    }

    #[test_case::test_case("content-type", "Content-Type"; "lowercase")]
    #[test_case::test_case("X-REQUEST-ID", "X-Request-Id"; "uppercase")]
    #[test_case::test_case("x--y", "X--Y"; "double dash")]
    fn test_canonical_name(name: &str, expected: &str) {
        assert_eq!(&*canonical_name(name), expected);
        assert_eq!(&*canonical_name(name), expected);
    }

    #[test]
    fn test_structured_headers() {
        assert_eq!(header(b"Content-Length: 42\r\n"), Header::ContentLength(42));
        assert_eq!(
            header(b"transfer-encoding: gzip, chunked \r\n"),
            Header::TransferEncoding(vec![TransferCoding::new("gzip"), TransferCoding::chunked()])
        );
        assert_eq!(
            header(b"Accept-Encoding: br;q=0.9\r\n"),
            Header::AcceptEncoding(vec![
                ContentCoding::new("br").with_weight(Weight::from_thousandths(900).unwrap())
            ])
        );
        assert_eq!(
            header(b"Connection: keep-alive, Upgrade\r\n"),
            Header::Connection(vec!["keep-alive".to_owned(), "Upgrade".to_owned()])
        );
        assert_eq!(header(b"Host: example.com:8080\r\n"), Header::Host("example.com:8080".to_owned()));
    }

    #[test]
    fn test_content_type() {
        let Header::ContentType(media_type) = header(b"Content-Type: text/plain;charset=utf-8\r\n") else {
            panic!("expected content type");
        };
        assert!(media_type.is("text", "plain"));
        assert_eq!(media_type.charset(), Some("utf-8"));
    }

    #[test]
    fn test_raw_header_trims_and_canonicalises() {
        assert_eq!(
            header(b"x-trace:   a b\t \r\n"),
            Header::Raw {
                name: Arc::from("X-Trace"),
                value: "a b".to_owned(),
            }
        );
        assert_eq!(header(b"X-Empty:\r\n"), Header::raw("x-empty", ""));
    }

    #[test_case::test_case(b"Name : v\r\n"; "space before colon")]
    #[test_case::test_case(b"Content-Length: x\r\n"; "length not a number")]
    #[test_case::test_case(b"Content-Length: 99999999999999999999\r\n"; "length overflow")]
    #[test_case::test_case(b"Accept: text\r\n"; "range without subtype")]
    #[test_case::test_case(b"X-A: 1\n"; "bare newline")]
    #[test_case::test_case(b"X-A: \x01\r\n"; "control character")]
    fn test_bad_header(bytes: &[u8]) {
        assert!(parse_all_bytes(HeaderParser::new(), bytes).is_err());
    }

    #[test]
    fn test_header_byte_by_byte() {
        let line = b"Accept: text/html;q=0.8, application/json\r\n";
        let mut parse = Incremental::new(HeaderParser::new());
        for byte in line {
            parse.feed_bytes(&[*byte]).unwrap();
        }
        assert_eq!(parse.finish().unwrap(), header(line));
    }

    #[test]
    fn test_render_round_trip() {
        let lines: [&[u8]; 5] = [
            b"Accept: text/html; q=0.8, */*\r\n",
            b"User-Agent: pullkit/0.1 (test; (nested)) curl\r\n",
            b"Upgrade: websocket, HTTP/2.0\r\n",
            b"Content-Type: multipart/form-data; boundary=\"a b\"\r\n",
            b"Accept-Language: en-US, fr; q=0.5\r\n",
        ];
        for line in lines {
            let parsed = header(line);
            let rendered = parsed.to_line().unwrap() + "\r\n";
            assert_eq!(rendered.as_bytes(), line);
        }
    }

    #[test]
    fn test_render_rejects_bad_values() {
        assert!(matches!(Header::raw("X-A", "a\r\nb").to_line(), Err(HttpError::InvalidValue(_))));
        assert!(matches!(
            Header::Raw {
                name: Arc::from("bad name"),
                value: String::new(),
            }
            .to_line(),
            Err(HttpError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_headers_block() {
        let headers = parse_all_bytes(
            HeadersParser::new(HttpConfig::default()),
            b"Host: a\r\nContent-Length: 3\r\n\r\n",
        )
        .unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.host(), Some("a"));
        assert_eq!(headers.framing().unwrap(), Framing::Fixed(3));
    }

    #[test]
    fn test_header_limits() {
        let config = HttpConfig::new().with_max_headers(1);
        assert!(parse_all_bytes(HeadersParser::new(config), b"A: 1\r\nB: 2\r\n\r\n").is_err());
        let config = HttpConfig::new().with_max_line_len(8);
        let error = parse_all_bytes(HeadersParser::new(config), b"A: 123456789\r\n\r\n").unwrap_err();
        assert!(matches!(
            error.kind(),
            pullkit_core::DiagnosticKind::Limit(Error::InputLimitExceeded { limit: 8, .. })
        ));
    }

    fn framing(headers: &[Header]) -> Result<Framing, HttpError> {
        headers.iter().cloned().collect::<Headers>().framing()
    }

    #[test]
    fn test_framing() {
        assert_eq!(framing(&[]).unwrap(), Framing::Empty);
        assert_eq!(framing(&[Header::ContentLength(5), Header::ContentLength(5)]).unwrap(), Framing::Fixed(5));
        assert_eq!(
            framing(&[Header::TransferEncoding(vec![TransferCoding::chunked()])]).unwrap(),
            Framing::Chunked
        );
    }

    #[test]
    fn test_conflicting_framing() {
        assert_eq!(
            framing(&[Header::ContentLength(5), Header::ContentLength(6)]),
            Err(HttpError::ConflictingLength { first: 5, second: 6 })
        );
        assert_eq!(
            framing(&[Header::ContentLength(5), Header::TransferEncoding(vec![TransferCoding::chunked()])]),
            Err(HttpError::AmbiguousFraming)
        );
        assert_eq!(
            framing(&[Header::TransferEncoding(vec![TransferCoding::new("gzip"), TransferCoding::chunked()])]),
            Err(HttpError::UnsupportedCoding("gzip".to_owned()))
        );
        assert_eq!(
            framing(&[Header::TransferEncoding(vec![TransferCoding::chunked(), TransferCoding::new("gzip")])]),
            Err(HttpError::UnsupportedCoding("gzip".to_owned()))
        );
        assert_eq!(
            framing(&[Header::Host("a".to_owned()), Header::Host("b".to_owned())]),
            Err(HttpError::DuplicateHeader("Host".to_owned()))
        );
    }
}
