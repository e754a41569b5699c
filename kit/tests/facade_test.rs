//! The facade exposes the engine and both grammars.

use pullkit::http::{Header, Method, RequestHead, decode_request, encode_request};
use pullkit::recon::{Value, parse, to_string};
use pullkit::{HashGenCacheMap, Incremental, parse_all};
use test_case::test_case;

#[test]
fn test_recon_through_facade() {
    let value: Value = parse("@event(id: 7) {title: [Launch @em[today]!]}").unwrap();
    let text = to_string(&value).unwrap();
    insta::assert_snapshot!(text, @"@event(id:7){title:[Launch @em[today]!]}");
    assert_eq!(parse(&text).unwrap(), value);
}

#[test]
fn test_engine_drivers_through_facade() {
    let whole = parse_all(pullkit::recon::BlockParser::<pullkit::recon::ValueModel>::new(), "{a:1}")
        .unwrap();
    let mut incremental =
        Incremental::new(pullkit::recon::BlockParser::<pullkit::recon::ValueModel>::new());
    incremental.feed("{a:").unwrap();
    incremental.feed("1}").unwrap();
    assert_eq!(incremental.finish().unwrap(), whole);
}

#[test_case(1; "one char")]
#[test_case(5; "five chars")]
#[test_case(64; "whole document")]
fn test_recon_chunks_through_facade(size: usize) {
    let text = "@point {x: 1, y: [two @b[parts]]}";
    let mut incremental =
        Incremental::new(pullkit::recon::BlockParser::<pullkit::recon::ValueModel>::new());
    for chunk in text.as_bytes().chunks(size) {
        incremental.feed(core::str::from_utf8(chunk).unwrap()).unwrap();
    }
    assert_eq!(incremental.finish().unwrap(), parse(text).unwrap());
}

#[test]
fn test_http_through_facade() {
    let head = RequestHead::new(Method::Post, "/")
        .with_header(Header::Host("a".to_owned()))
        .with_header(Header::ContentLength(2));
    let bytes = encode_request(&head, b"hi").unwrap();
    assert_eq!(bytes, b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 2\r\n\r\nhi");
    let (decoded, body) = decode_request(&bytes).unwrap();
    assert_eq!(decoded, head);
    assert_eq!(body.content, b"hi");
}

#[test]
fn test_cache_through_facade() {
    let cache: HashGenCacheMap<String, str> = HashGenCacheMap::new(16);
    let stored = cache.put("key".to_owned(), "value");
    assert_eq!(cache.get("key").as_deref(), Some(&*stored));
}
