//! Values written as Recon read back as the same values.

use pullkit_recon::{InfixOp, Item, PrefixOp, Step, Value, parse, to_string};

fn reparse(value: &Value) -> Value {
    let text = to_string(value).unwrap();
    parse(&text).unwrap_or_else(|error| panic!("{} does not parse: {}", text, error))
}

#[test_case::test_case(r#"@foo(1,2){a:"x",b:[1 2 3]}"#; "golden record")]
#[test_case::test_case("a: 1\nb: [text @em[inline] more]"; "slots and markup")]
#[test_case::test_case("@html{@head{@title[Hi]},@body[Hello, @b[world]!]}"; "markup tree")]
#[test_case::test_case("$store.book[$price < 10].title"; "selector filter")]
#[test_case::test_case("x > 1 && !y ? f(1, 2) : -z"; "expressions")]
#[test_case::test_case("%AQIDBA==, 1.5, -2, 12345678901234567890"; "literals")]
#[test_case::test_case("@\"odd name\"(\"quoted\\ttext\")"; "quoted attribute")]
#[test_case::test_case("{}, {{}}, [], ''"; "empty forms")]
fn test_text_round_trip(text: &str) {
    let value = parse(text).unwrap();
    assert_eq!(reparse(&value), value);
}

#[test]
fn test_value_round_trip() {
    let values = [
        Value::record([Item::slot(Value::selector([Step::Children]), 1)]),
        Value::prefix(PrefixOp::Negative, Value::from(3)),
        Value::prefix(
            PrefixOp::Negative,
            Value::invoke(Value::from(1), Value::from(2)),
        ),
        Value::record([Value::text("a").into(), Value::text("b").into()]),
        Value::record([Value::record([Value::from(1).into()]).into()]),
        Value::from(0.1),
        Value::record([
            Item::attr("a", Value::Absent),
            Item::slot("k", Value::Extant),
        ]),
        Value::Data(Vec::new()),
        Value::text(""),
        Value::text("日本"),
        Value::record([Value::text("a@b").into(), Value::from(1).into()]),
        Value::infix(
            Value::text("a"),
            InfixOp::Divide,
            Value::infix(Value::text("b"), InfixOp::Times, Value::text("c")),
        ),
        Value::selector([
            Step::Children,
            Step::Keys,
            Step::Values,
            Step::Descendants,
            Step::Get(Value::from(2)),
        ]),
    ];
    for value in &values {
        assert_eq!(&reparse(value), value, "written as {:?}", to_string(value));
    }
}

#[test]
fn test_single_value_and_single_item_record_differ() {
    let one = Value::from(1);
    let record = Value::record([Value::from(1).into()]);
    assert_eq!(to_string(&one).unwrap(), "1");
    assert_eq!(to_string(&record).unwrap(), "{1}");
    assert_eq!(reparse(&one), one);
    assert_eq!(reparse(&record), record);
}

#[test]
fn test_extant_reads_back_absent() {
    assert_eq!(reparse(&Value::Extant), Value::Absent);
    let record = Value::record([Value::Extant.into(), Value::from(1).into()]);
    assert_eq!(
        reparse(&record),
        Value::record([Value::Absent.into(), Value::from(1).into()])
    );
}

#[test]
fn test_display_and_from_str() {
    let value: Value = "@point {x: 1, y: 2}".parse().unwrap();
    assert_eq!(value.to_string(), "@point{x:1,y:2}");
    assert_eq!(value.get("x"), Some(&Value::from(1)));
}
