//! Framing conflicts surface as typed errors.

use pullkit_http::{HttpError, decode_request};

#[test_case::test_case(
    b"POST / HTTP/1.1\r\nContent-Length: 3\r\nContent-Length: 4\r\n\r\nabc",
    HttpError::ConflictingLength { first: 3, second: 4 };
    "two lengths"
)]
#[test_case::test_case(
    b"POST / HTTP/1.1\r\nContent-Length: 3\r\nTransfer-Encoding: chunked\r\n\r\n",
    HttpError::AmbiguousFraming;
    "length and chunked"
)]
#[test_case::test_case(
    b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n",
    HttpError::UnsupportedCoding("gzip".to_owned());
    "unchunked coding"
)]
#[test_case::test_case(
    b"GET / HTTP/1.1\r\nHost: a\r\nHost: b\r\n\r\n",
    HttpError::DuplicateHeader("Host".to_owned());
    "two hosts"
)]
fn test_conflicting_framing(bytes: &[u8], expected: HttpError) {
    assert_eq!(decode_request(bytes).unwrap_err(), expected);
}

#[test]
fn test_repeated_equal_lengths_are_accepted() {
    let (_, body) =
        decode_request(b"POST / HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nok").unwrap();
    assert_eq!(body.content, b"ok");
}

#[test]
fn test_syntax_error_position() {
    let error = decode_request(b"GET / HTTP/1.1\r\nHost a\r\n\r\n").unwrap_err();
    let position = error.position().unwrap();
    assert_eq!((position.line, position.column), (2, 5));
}
