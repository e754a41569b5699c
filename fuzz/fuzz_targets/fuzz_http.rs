#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pullkit::Incremental;
use pullkit::http::{RequestParser, ResponseParser, decode_request, decode_response, encode_request};

#[derive(Debug, Arbitrary)]
struct Message<'a> {
    bytes: &'a [u8],
    split: usize,
    response: bool,
}

fuzz_target!(|message: Message<'_>| {
    let bytes = message.bytes;
    let split = message.split % (bytes.len() + 1);

    if message.response {
        let _ = decode_response(bytes);
        let mut incremental = Incremental::new(ResponseParser::new());
        let _ = incremental
            .feed_bytes(&bytes[..split])
            .and_then(|()| incremental.feed_bytes(&bytes[split..]))
            .and_then(|()| incremental.finish());
        return;
    }

    if let Ok((head, body)) = decode_request(bytes) {
        // Anything accepted must be writable and read back the same.
        if let Ok(encoded) = encode_request(&head, &body.content) {
            let (again, body_again) = decode_request(&encoded).unwrap();
            assert_eq!(again.method, head.method);
            assert_eq!(again.target, head.target);
            assert_eq!(body_again.content, body.content);
        }
    }
    let mut incremental = Incremental::new(RequestParser::new());
    let _ = incremental
        .feed_bytes(&bytes[..split])
        .and_then(|()| incremental.feed_bytes(&bytes[split..]))
        .and_then(|()| incremental.finish());
});
