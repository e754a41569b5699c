#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pullkit::Incremental;
use pullkit::recon::{BlockParser, ValueModel, parse, to_string};

#[derive(Debug, Arbitrary)]
struct Document<'a> {
    text: &'a str,
    split: usize,
}

fuzz_target!(|document: Document<'_>| {
    let text = document.text;
    let whole = parse(text);

    // Splitting the input anywhere must not change the outcome.
    let mut split = document.split % (text.len() + 1);
    while !text.is_char_boundary(split) {
        split -= 1;
    }
    let mut incremental = Incremental::new(BlockParser::<ValueModel>::new());
    let chunked = incremental
        .feed(&text[..split])
        .and_then(|()| incremental.feed(&text[split..]))
        .and_then(|()| incremental.finish());
    assert_eq!(whole.is_ok(), chunked.is_ok());

    if let (Ok(value), Ok(chunked)) = (whole, chunked) {
        assert_eq!(value, chunked);
        if let Ok(written) = to_string(&value) {
            let _ = parse(&written);
        }
    }
});
