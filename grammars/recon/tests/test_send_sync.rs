use pullkit_recon::{BlockParser, MarkupParser, ReconWriter, SelectorParser, Value, ValueModel};

fn assert_send<T: Send>() {}
fn assert_sync<T: Sync>() {}

#[test]
fn parsers_and_writers_are_send() {
    assert_send::<BlockParser<ValueModel>>();
    assert_send::<MarkupParser<ValueModel>>();
    assert_send::<SelectorParser<ValueModel>>();
    assert_send::<ReconWriter<'static, ValueModel>>();
    assert_send::<Value>();
    assert_sync::<Value>();
}
