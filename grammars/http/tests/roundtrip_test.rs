//! Encoded messages decode back to what was encoded.

use pullkit_core::{ByteBuffer, Encoder, Written, encode_all};
use pullkit_http::{
    ChunkedEncoder, ContentCoding, Entity, FixedBodyEncoder, Header, MediaType, MessageEncoder,
    Method, Product, RequestHead, ResponseHead, TransferCoding, Weight, decode_request,
    decode_response, encode_request, encode_response,
};

fn request() -> RequestHead {
    RequestHead::new(Method::Post, "/api/v1/items?limit=10")
        .with_header(Header::Host("api.example".to_owned()))
        .with_header(Header::content_type(
            MediaType::new("application", "json").with_param("charset", "utf-8"),
        ))
        .with_header(Header::AcceptEncoding(vec![
            ContentCoding::new("gzip"),
            ContentCoding::new("identity").with_weight(Weight::new(0.1).unwrap()),
        ]))
        .with_header(Header::UserAgent(vec![
            Product::new("pullkit", Some("0.1")).with_comment("linux; x86_64"),
        ]))
}

#[test]
fn test_fixed_request() {
    let content = br#"{"name":"bolt"}"#;
    let head = request().with_header(Header::ContentLength(content.len() as u64));
    let bytes = encode_request(&head, content).unwrap();
    let (decoded, body) = decode_request(&bytes).unwrap();
    assert_eq!(decoded, head);
    assert_eq!(body.content, content);
}

#[test]
fn test_chunked_response() {
    let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let head = ResponseHead::new(200, "OK")
        .with_header(Header::TransferEncoding(vec![TransferCoding::chunked()]))
        .with_header(Header::Server(vec![Product::new("edge", None)]));
    let bytes = encode_response(&head, &content).unwrap();
    let (decoded, body) = decode_response(&bytes).unwrap();
    assert_eq!(decoded, head);
    assert_eq!(body.content, content);
}

#[test_case::test_case(0; "empty")]
#[test_case::test_case(1; "one")]
#[test_case::test_case(15; "one hex digit")]
#[test_case::test_case(16; "two hex digits")]
#[test_case::test_case(4095; "three hex digits")]
fn test_size_line_width(len: usize) {
    let content = vec![b'z'; len];
    let bytes = encode_all(ChunkedEncoder::new(FixedBodyEncoder::new(&content)), 1 << 16).unwrap();
    let digits = format!("{:x}", len);
    if len == 0 {
        assert_eq!(bytes, b"0\r\n\r\n");
    } else {
        assert!(bytes.starts_with(format!("{}\r\n", digits).as_bytes()));
        assert_eq!(bytes.len(), digits.len() + 2 + len + 2 + 5);
    }
}

#[test]
fn test_encoder_resumes_across_buffers() {
    let head = request().with_header(Header::TransferEncoding(vec![TransferCoding::chunked()]));
    let content = b"streamed through a tiny buffer";
    let entity = Entity::new(head.framing().unwrap(), content).unwrap();
    let mut state = MessageEncoder::request(&head, entity).unwrap();
    let mut buffer = ByteBuffer::with_capacity(24);
    let mut bytes = Vec::new();
    loop {
        match state.pull(&mut buffer) {
            Written::Cont(next) => {
                bytes.extend(buffer.take());
                state = next;
            }
            Written::Done(()) => {
                bytes.extend(buffer.take());
                break;
            }
            Written::Error(error) => panic!("{}", error),
        }
    }
    let (decoded, body) = decode_request(&bytes).unwrap();
    assert_eq!(decoded, head);
    assert_eq!(body.content, content);
}
