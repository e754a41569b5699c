//! Request and response heads.

use core::fmt;

use pullkit_core::{Diagnostic, Input, Parsed, Parser, resume};

use crate::body::Framing;
use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::grammar::{TokenParser, expect, is_obs_text, is_space, is_vchar, write_token};
use crate::header::{Bounded, Header, Headers, HeadersParser};

/// Protocol version, `HTTP/major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_1_0: Version = Version { major: 1, minor: 0 };
    pub const HTTP_1_1: Version = Version { major: 1, minor: 1 };
}

impl Default for Version {
    fn default() -> Self {
        Version::HTTP_1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

const PREFIX: &str = "HTTP/";

#[derive(Debug, Clone, Copy)]
enum VersionParser {
    Prefix(usize),
    Major,
    Dot(u8),
    Minor(u8),
}

impl VersionParser {
    fn new() -> Self {
        VersionParser::Prefix(0)
    }
}

fn digit(c: Option<char>) -> Option<u8> {
    c.and_then(|c| c.to_digit(10)).map(|d| d as u8)
}

impl Parser for VersionParser {
    type Value = Version;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Version> {
        let mut state = self;
        loop {
            if input.head().is_none() && input.is_empty() {
                return Parsed::Cont(state);
            }
            let head = input.head();
            state = match state {
                VersionParser::Prefix(index) => match PREFIX[index..].chars().next() {
                    Some(expected) if head == Some(expected) => {
                        input.step();
                        VersionParser::Prefix(index + 1)
                    }
                    Some(expected) => return Parsed::Error(Diagnostic::expected_char(expected, input)),
                    None => VersionParser::Major,
                },
                VersionParser::Major => match digit(head) {
                    Some(major) => {
                        input.step();
                        VersionParser::Dot(major)
                    }
                    None => return Parsed::Error(Diagnostic::expected("major version", input)),
                },
                VersionParser::Dot(major) => match expect('.', input) {
                    Some(Err(error)) => return Parsed::Error(error),
                    _ => VersionParser::Minor(major),
                },
                VersionParser::Minor(major) => match digit(head) {
                    Some(minor) => {
                        input.step();
                        return Parsed::Done(Version { major, minor });
                    }
                    None => return Parsed::Error(Diagnostic::expected("minor version", input)),
                },
            };
        }
    }
}

/// A request method. Methods are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    Other(String),
}

impl Method {
    pub fn from_token(token: String) -> Self {
        match token.as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "PATCH" => Method::Patch,
            _ => Method::Other(token),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The start line and header fields of a request.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestHead {
    pub method: Method,
    /// The request target, kept as written.
    pub target: String,
    pub version: Version,
    pub headers: Headers,
}

impl RequestHead {
    pub fn new(method: Method, target: &str) -> Self {
        Self {
            method,
            target: target.to_owned(),
            version: Version::HTTP_1_1,
            headers: Headers::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    pub fn framing(&self) -> Result<Framing, HttpError> {
        self.headers.framing()
    }

    /// `method SP target SP version CRLF`.
    pub fn start_line(&self) -> Result<String, HttpError> {
        let mut line = String::new();
        write_token(&mut line, self.method.as_str())?;
        line.push(' ');
        if self.target.is_empty() || !self.target.chars().all(is_target_char) {
            return Err(HttpError::InvalidValue(self.target.clone()));
        }
        line.push_str(&self.target);
        line.push(' ');
        line.push_str(&self.version.to_string());
        line.push_str("\r\n");
        Ok(line)
    }
}

/// The status line and header fields of a response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
}

impl ResponseHead {
    pub fn new(status: u16, reason: &str) -> Self {
        Self {
            version: Version::HTTP_1_1,
            status,
            reason: reason.to_owned(),
            headers: Headers::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Informational, `204` and `304` responses never carry a body.
    pub fn framing(&self) -> Result<Framing, HttpError> {
        let framing = self.headers.framing()?;
        if (100..200).contains(&self.status) || self.status == 204 || self.status == 304 {
            return Ok(Framing::Empty);
        }
        Ok(framing)
    }

    /// `version SP status SP reason CRLF`.
    pub fn start_line(&self) -> Result<String, HttpError> {
        if !(100..1000).contains(&self.status) {
            return Err(HttpError::InvalidValue(self.status.to_string()));
        }
        if !self.reason.chars().all(|c| is_vchar(c) || is_space(c) || is_obs_text(c)) {
            return Err(HttpError::InvalidValue(self.reason.clone()));
        }
        Ok(format!("{} {} {}\r\n", self.version, self.status, self.reason))
    }
}

fn is_target_char(c: char) -> bool {
    is_vchar(c) || is_obs_text(c)
}

enum Request {
    Method(TokenParser),
    Space(Method),
    Target(Method, String),
    Version(Method, String, VersionParser),
    Cr(Method, String, Version),
    Lf(Method, String, Version),
}

/// Reads `method SP request-target SP HTTP-version CRLF`.
struct RequestLineParser {
    state: Request,
}

impl Parser for RequestLineParser {
    type Value = (Method, String, Version);

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Self::Value> {
        let mut state = self.state;
        loop {
            state = match state {
                Request::Method(parser) => {
                    let token = resume!(parser.feed(input), |parser| RequestLineParser {
                        state: Request::Method(parser),
                    });
                    Request::Space(Method::from_token(token))
                }
                Request::Space(method) => match expect(' ', input) {
                    None => return Parsed::Cont(RequestLineParser { state: Request::Space(method) }),
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Request::Target(method, String::new()),
                },
                Request::Target(method, mut target) => {
                    loop {
                        match input.head() {
                            Some(c) if is_target_char(c) => {
                                input.step();
                                target.push(c);
                            }
                            None if input.is_empty() => {
                                return Parsed::Cont(RequestLineParser {
                                    state: Request::Target(method, target),
                                });
                            }
                            Some(' ') if !target.is_empty() => {
                                input.step();
                                break;
                            }
                            _ => return Parsed::Error(Diagnostic::expected("request target", input)),
                        }
                    }
                    Request::Version(method, target, VersionParser::new())
                }
                Request::Version(method, target, parser) => {
                    let version = resume!(parser.feed(input), |parser| RequestLineParser {
                        state: Request::Version(method, target, parser),
                    });
                    Request::Cr(method, target, version)
                }
                Request::Cr(method, target, version) => match expect('\r', input) {
                    None => {
                        return Parsed::Cont(RequestLineParser {
                            state: Request::Cr(method, target, version),
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Request::Lf(method, target, version),
                },
                Request::Lf(method, target, version) => match expect('\n', input) {
                    None => {
                        return Parsed::Cont(RequestLineParser {
                            state: Request::Lf(method, target, version),
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => return Parsed::Done((method, target, version)),
                },
            };
        }
    }
}

enum Phase<L, T> {
    Line(Bounded<L>),
    Headers(T, HeadersParser),
}

/// Reads a request head: the request line and the header block.
///
/// The body is not read; select a decoder with [`RequestHead::framing`].
///
/// # Example
///
/// ```ignore
/// let head = parse_all_bytes(RequestParser::new(), b"GET / HTTP/1.1\r\nHost: a\r\n\r\n")?;
/// assert_eq!(head.method, Method::Get);
/// ```
pub struct RequestParser {
    config: HttpConfig,
    phase: Phase<RequestLineParser, (Method, String, Version)>,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Self {
        let line = RequestLineParser {
            state: Request::Method(TokenParser::new()),
        };
        Self {
            config,
            phase: Phase::Line(Bounded::new(line, config.max_line_len)),
        }
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for RequestParser {
    type Value = RequestHead;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, RequestHead> {
        let RequestParser { config, mut phase } = self;
        loop {
            phase = match phase {
                Phase::Line(parser) => {
                    let line = resume!(parser.feed(input), |parser| RequestParser {
                        config,
                        phase: Phase::Line(parser),
                    });
                    Phase::Headers(line, HeadersParser::new(config))
                }
                Phase::Headers(line, parser) => {
                    let headers = resume!(parser.feed(input), |parser| RequestParser {
                        config,
                        phase: Phase::Headers(line, parser),
                    });
                    let (method, target, version) = line;
                    log::trace!("request head parsed: {} {}", method, target);
                    return Parsed::Done(RequestHead {
                        method,
                        target,
                        version,
                        headers,
                    });
                }
            };
        }
    }
}

enum Status {
    Version(VersionParser),
    Space(Version),
    Code(Version, u16, usize),
    CodeSpace(Version, u16),
    Reason(Version, u16, String),
    Lf(Version, u16, String),
}

/// Reads `HTTP-version SP status-code SP reason-phrase CRLF`.
struct StatusLineParser {
    state: Status,
}

impl Parser for StatusLineParser {
    type Value = (Version, u16, String);

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Self::Value> {
        let mut state = self.state;
        loop {
            state = match state {
                Status::Version(parser) => {
                    let version = resume!(parser.feed(input), |parser| StatusLineParser {
                        state: Status::Version(parser),
                    });
                    Status::Space(version)
                }
                Status::Space(version) => match expect(' ', input) {
                    None => return Parsed::Cont(StatusLineParser { state: Status::Space(version) }),
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Status::Code(version, 0, 0),
                },
                Status::Code(version, code, 3) => Status::CodeSpace(version, code),
                Status::Code(version, code, count) => match digit(input.head()) {
                    Some(d) => {
                        input.step();
                        Status::Code(version, code * 10 + u16::from(d), count + 1)
                    }
                    None if input.is_empty() => {
                        return Parsed::Cont(StatusLineParser {
                            state: Status::Code(version, code, count),
                        });
                    }
                    None => return Parsed::Error(Diagnostic::expected("status code", input)),
                },
                Status::CodeSpace(version, code) => match expect(' ', input) {
                    None => {
                        return Parsed::Cont(StatusLineParser {
                            state: Status::CodeSpace(version, code),
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => Status::Reason(version, code, String::new()),
                },
                Status::Reason(version, code, mut reason) => loop {
                    match input.head() {
                        Some('\r') => {
                            input.step();
                            break Status::Lf(version, code, reason);
                        }
                        Some(c) if is_vchar(c) || is_space(c) || is_obs_text(c) => {
                            input.step();
                            reason.push(c);
                        }
                        None if input.is_empty() => {
                            return Parsed::Cont(StatusLineParser {
                                state: Status::Reason(version, code, reason),
                            });
                        }
                        _ => return Parsed::Error(Diagnostic::expected_char('\r', input)),
                    }
                },
                Status::Lf(version, code, reason) => match expect('\n', input) {
                    None => {
                        return Parsed::Cont(StatusLineParser {
                            state: Status::Lf(version, code, reason),
                        });
                    }
                    Some(Err(error)) => return Parsed::Error(error),
                    Some(Ok(())) => return Parsed::Done((version, code, reason)),
                },
            };
        }
    }
}

/// Reads a response head: the status line and the header block.
pub struct ResponseParser {
    config: HttpConfig,
    phase: Phase<StatusLineParser, (Version, u16, String)>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::with_config(HttpConfig::default())
    }

    pub fn with_config(config: HttpConfig) -> Self {
        let line = StatusLineParser {
            state: Status::Version(VersionParser::new()),
        };
        Self {
            config,
            phase: Phase::Line(Bounded::new(line, config.max_line_len)),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for ResponseParser {
    type Value = ResponseHead;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, ResponseHead> {
        let ResponseParser { config, mut phase } = self;
        loop {
            phase = match phase {
                Phase::Line(parser) => {
                    let line = resume!(parser.feed(input), |parser| ResponseParser {
                        config,
                        phase: Phase::Line(parser),
                    });
                    Phase::Headers(line, HeadersParser::new(config))
                }
                Phase::Headers(line, parser) => {
                    let headers = resume!(parser.feed(input), |parser| ResponseParser {
                        config,
                        phase: Phase::Headers(line, parser),
                    });
                    let (version, status, reason) = line;
                    return Parsed::Done(ResponseHead {
                        version,
                        status,
                        reason,
                        headers,
                    });
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{Incremental, parse_all_bytes};

    #[test_case::test_case(b"HTTP/1.1", Version::HTTP_1_1; "one one")]
    #[test_case::test_case(b"HTTP/1.0", Version::HTTP_1_0; "one zero")]
    #[test_case::test_case(b"HTTP/2.0", Version { major: 2, minor: 0 }; "two")]
    fn test_version(bytes: &[u8], expected: Version) {
        assert_eq!(parse_all_bytes(VersionParser::new(), bytes).unwrap(), expected);
    }

    #[test_case::test_case(b"http/1.1"; "lowercase")]
    #[test_case::test_case(b"HTTP/1"; "no minor")]
    #[test_case::test_case(b"HTTP/x.1"; "letter")]
    fn test_bad_version(bytes: &[u8]) {
        assert!(parse_all_bytes(VersionParser::new(), bytes).is_err());
    }

    #[test]
    fn test_request() {
        let head = parse_all_bytes(
            RequestParser::new(),
            b"POST /upload?x=1 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 4\r\n\r\n",
        )
        .unwrap();
        assert_eq!(head.method, Method::Post);
        assert_eq!(head.target, "/upload?x=1");
        assert_eq!(head.version, Version::HTTP_1_1);
        assert_eq!(head.headers.host(), Some("example.com"));
        assert_eq!(head.framing().unwrap(), Framing::Fixed(4));
    }

    #[test]
    fn test_extension_method() {
        let head = parse_all_bytes(RequestParser::new(), b"PURGE * HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(head.method, Method::Other("PURGE".to_owned()));
        assert_eq!(head.target, "*");
    }

    #[test_case::test_case(b"GET  / HTTP/1.1\r\n\r\n"; "double space")]
    #[test_case::test_case(b"GET / HTTP/1.1\n\r\n"; "bare newline")]
    #[test_case::test_case(b"GET /\r\n\r\n"; "no version")]
    #[test_case::test_case(b"G(T / HTTP/1.1\r\n\r\n"; "bad method")]
    fn test_bad_request_line(bytes: &[u8]) {
        assert!(parse_all_bytes(RequestParser::new(), bytes).is_err());
    }

    #[test]
    fn test_request_split_everywhere() {
        let bytes = b"GET /a HTTP/1.1\r\nAccept: */*\r\n\r\n";
        let whole = parse_all_bytes(RequestParser::new(), bytes).unwrap();
        for split in 1..bytes.len() {
            let mut parse = Incremental::new(RequestParser::new());
            parse.feed_bytes(&bytes[..split]).unwrap();
            parse.feed_bytes(&bytes[split..]).unwrap();
            assert_eq!(parse.finish().unwrap(), whole, "split at {}", split);
        }
    }

    #[test]
    fn test_response() {
        let head = parse_all_bytes(
            ResponseParser::new(),
            b"HTTP/1.1 404 Not Found\r\nServer: pullkit/0.1\r\n\r\n",
        )
        .unwrap();
        assert_eq!(head.status, 404);
        assert_eq!(head.reason, "Not Found");
        assert_eq!(head.headers.len(), 1);
    }

    #[test]
    fn test_response_empty_reason() {
        let head = parse_all_bytes(ResponseParser::new(), b"HTTP/1.1 200 \r\n\r\n").unwrap();
        assert_eq!(head.reason, "");
    }

    #[test]
    fn test_bodiless_statuses() {
        let head = ResponseHead::new(304, "Not Modified").with_header(Header::ContentLength(10));
        assert_eq!(head.framing().unwrap(), Framing::Empty);
        let head = ResponseHead::new(200, "OK").with_header(Header::ContentLength(10));
        assert_eq!(head.framing().unwrap(), Framing::Fixed(10));
    }

    #[test]
    fn test_request_line_limit() {
        let config = HttpConfig::new().with_max_line_len(10);
        assert!(parse_all_bytes(RequestParser::with_config(config), b"GET /very/long HTTP/1.1\r\n\r\n").is_err());
    }

    #[test]
    fn test_start_lines() {
        let request = RequestHead::new(Method::Get, "/index.html");
        assert_eq!(request.start_line().unwrap(), "GET /index.html HTTP/1.1\r\n");
        assert!(RequestHead::new(Method::Get, "/a b").start_line().is_err());
        assert!(RequestHead::new(Method::Other("BAD METHOD".to_owned()), "/").start_line().is_err());
        let response = ResponseHead::new(200, "OK");
        assert_eq!(response.start_line().unwrap(), "HTTP/1.1 200 OK\r\n");
        assert!(ResponseHead::new(42, "OK").start_line().is_err());
    }
}
