//! Feeding a document in pieces yields the same value as feeding it whole.

use pullkit_core::{Incremental, ParseConfig, StringOutput, Writer, Written, write_windowed};
use pullkit_recon::{BlockParser, ReconWriter, Value, ValueModel, parse, parse_with_config};

const DOCUMENT: &str = r#"@config(version: 2)
# services
{
  name: "edge proxy"
  ports: {80, 443}
  enabled: true; ratio: 0.75
  banner: [Welcome to @b[edge]!]
  route: $hosts.*[$weight >= 10]
  key: %AQIDBA==
}"#;

#[test]
fn test_byte_by_byte_matches_whole() {
    let mut parse_chars = Incremental::new(BlockParser::<ValueModel>::new());
    for c in "{a:1,b:2}".chars() {
        parse_chars.feed(c.encode_utf8(&mut [0; 4])).unwrap();
    }
    assert_eq!(parse_chars.finish().unwrap(), parse("{a:1,b:2}").unwrap());

    let mut parse_bytes = Incremental::new(BlockParser::<ValueModel>::new());
    for byte in DOCUMENT.as_bytes() {
        parse_bytes.feed_bytes(std::slice::from_ref(byte)).unwrap();
    }
    assert_eq!(parse_bytes.finish().unwrap(), parse(DOCUMENT).unwrap());
}

#[test_case::test_case(2; "two")]
#[test_case::test_case(7; "seven")]
#[test_case::test_case(64; "sixty four")]
fn test_chunked_matches_whole(size: usize) {
    let chars: Vec<char> = DOCUMENT.chars().collect();
    let mut incremental = Incremental::new(BlockParser::<ValueModel>::new());
    for chunk in chars.chunks(size) {
        incremental.feed(&chunk.iter().collect::<String>()).unwrap();
    }
    assert_eq!(incremental.finish().unwrap(), parse(DOCUMENT).unwrap());
}

#[test]
fn test_error_position_spans_chunks() {
    let mut incremental = Incremental::new(BlockParser::<ValueModel>::new());
    incremental.feed("{a:1,\n").unwrap();
    let error = incremental.feed(" b 2}").unwrap_err();
    assert_eq!(error.to_string(), "expected ',', ';' or newline but found '2' at 2:4");
}

#[test]
fn test_nesting_limit() {
    let config = ParseConfig::new().with_max_nesting_depth(8);
    let shallow = format!("{}1{}", "[".repeat(8), "]".repeat(8));
    assert!(parse_with_config(&shallow, config).is_ok());
    let deep = format!("{}1{}", "{".repeat(9), "}".repeat(9));
    assert!(parse_with_config(&deep, config).is_err());
}

#[test]
fn test_windowed_writer_matches_whole() {
    let value: Value = parse(DOCUMENT).unwrap();
    let whole = pullkit_recon::to_string(&value).unwrap();
    for window in [1, 3, 16] {
        assert_eq!(
            write_windowed(ReconWriter::<ValueModel>::block(&value), window).unwrap(),
            whole
        );
    }
}

#[test]
fn test_writer_suspends_on_full_output() {
    let value = parse("{a:1,b:2}").unwrap();
    let mut output = StringOutput::with_window(3);
    let state = ReconWriter::<ValueModel>::block(&value).pull(&mut output);
    assert!(state.is_cont());
    assert_eq!(output.take(), "a:1");
    let Written::Cont(writer) = state else {
        unreachable!()
    };
    let mut rest = StringOutput::new();
    assert!(writer.pull(&mut rest).is_done());
    assert_eq!(rest.into_string(), ",b:2");
}
