//! `$` selectors.

use pullkit_core::{Builder, Diagnostic, Input, NestingGuard, ParseConfig, Parsed, Parser};

use super::expr::Expr;
use super::items::Items;
use super::{Frames, ItemBuilder, Nested, Output, Progress, close};
use crate::ident::{IdentParser, is_ident_start_char};
use crate::model::{ReconModel, Step};
use crate::operator::Token;
use crate::string::StringParser;
use crate::value::ValueModel;

enum Selector<M: ReconModel> {
    Dollar,
    Step { dotted: bool },
    Next,
    AttrName,
    AttrQuoted(StringParser),
    AttrIdent(IdentParser),
    Key(IdentParser),
    QuotedKey(StringParser),
    Star,
    StarColon,
    Colon,
    Index(Option<usize>),
    Bracket,
    BracketClose(M::Value),
}

/// A `$` followed by path steps.
///
/// | Syntax | Step |
/// |--------|------|
/// | `.name`, `."name"` | get by key |
/// | `.@name` | get attribute |
/// | `#n` | item by index |
/// | `[expr]` | filter, or get when `expr` is a plain value |
/// | `*` | children |
/// | `**` | descendants |
/// | `*:` | keys |
/// | `:*` | values |
///
/// A `:` that does not start `:*` ends the selector and is handed out as
/// a pending token, so `$a: 1` still reads as a slot.
pub(crate) struct SelectorSteps<M: ReconModel> {
    selector: M::Value,
    guard: NestingGuard,
    state: Selector<M>,
}

impl<M: ReconModel> SelectorSteps<M> {
    pub(crate) fn new(guard: NestingGuard) -> Self {
        Self {
            selector: M::selector(),
            guard,
            state: Selector::Dollar,
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let SelectorSteps {
            mut selector,
            guard,
            mut state,
        } = self;
        macro_rules! suspend {
            ($state:expr) => {
                SelectorSteps {
                    selector,
                    guard,
                    state: $state,
                }
            };
        }
        loop {
            if input.is_empty() {
                return Progress::Cont(suspend!(state));
            }
            let head = input.head();
            state = match state {
                Selector::Dollar => match head {
                    Some('$') => {
                        input.step();
                        Selector::Step { dotted: false }
                    }
                    _ => return Progress::Error(Diagnostic::expected_char('$', input)),
                },
                Selector::Step { dotted } => match head {
                    Some('@') => {
                        input.step();
                        Selector::AttrName
                    }
                    Some('"' | '\'') => Selector::QuotedKey(StringParser::new()),
                    Some(c) if is_ident_start_char(c) => Selector::Key(IdentParser::new()),
                    Some('*') => {
                        input.step();
                        Selector::Star
                    }
                    Some('#') if !dotted => {
                        input.step();
                        Selector::Index(None)
                    }
                    Some('[') if !dotted => {
                        input.step();
                        let inner = enter!(guard, input);
                        let child = Nested::Items(Items::new(ItemBuilder::value(), inner));
                        return Progress::Nest(suspend!(Selector::Bracket), child);
                    }
                    Some(':') if !dotted => {
                        input.step();
                        Selector::Colon
                    }
                    _ if dotted => {
                        return Progress::Error(Diagnostic::expected("selector step", input));
                    }
                    _ => return Progress::Done((selector, None)),
                },
                Selector::Next => match head {
                    Some('.') => {
                        input.step();
                        Selector::Step { dotted: true }
                    }
                    Some('#') => {
                        input.step();
                        Selector::Index(None)
                    }
                    Some('[') => {
                        input.step();
                        let inner = enter!(guard, input);
                        let child = Nested::Items(Items::new(ItemBuilder::value(), inner));
                        return Progress::Nest(suspend!(Selector::Bracket), child);
                    }
                    Some(':') => {
                        input.step();
                        Selector::Colon
                    }
                    _ => return Progress::Done((selector, None)),
                },
                Selector::AttrName => match head {
                    Some('"' | '\'') => Selector::AttrQuoted(StringParser::new()),
                    Some(c) if is_ident_start_char(c) => Selector::AttrIdent(IdentParser::new()),
                    _ => return Progress::Error(Diagnostic::expected("attribute name", input)),
                },
                Selector::AttrQuoted(parser) => {
                    let name =
                        feed!(parser.feed(input), |parser| suspend!(Selector::AttrQuoted(parser)));
                    selector = M::select(selector, Step::GetAttr(M::text(name)));
                    Selector::Next
                }
                Selector::AttrIdent(parser) => {
                    let name =
                        feed!(parser.feed(input), |parser| suspend!(Selector::AttrIdent(parser)));
                    selector = M::select(selector, Step::GetAttr(M::ident(name)));
                    Selector::Next
                }
                Selector::Key(parser) => {
                    let key = feed!(parser.feed(input), |parser| suspend!(Selector::Key(parser)));
                    selector = M::select(selector, Step::Get(M::ident(key)));
                    Selector::Next
                }
                Selector::QuotedKey(parser) => {
                    let key =
                        feed!(parser.feed(input), |parser| suspend!(Selector::QuotedKey(parser)));
                    selector = M::select(selector, Step::Get(M::text(key)));
                    Selector::Next
                }
                Selector::Star => match head {
                    Some('*') => {
                        input.step();
                        selector = M::select(selector, Step::Descendants);
                        Selector::Next
                    }
                    Some(':') => {
                        input.step();
                        Selector::StarColon
                    }
                    _ => {
                        selector = M::select(selector, Step::Children);
                        Selector::Next
                    }
                },
                Selector::StarColon => match head {
                    Some('*') => {
                        input.step();
                        selector = M::select(selector, Step::Children);
                        selector = M::select(selector, Step::Values);
                        Selector::Next
                    }
                    _ => {
                        selector = M::select(selector, Step::Keys);
                        Selector::Next
                    }
                },
                Selector::Colon => match head {
                    Some('*') => {
                        input.step();
                        selector = M::select(selector, Step::Values);
                        Selector::Next
                    }
                    _ => return Progress::Done((selector, Some(Token::Colon))),
                },
                Selector::Index(index) => match head.and_then(|c| c.to_digit(10)) {
                    Some(digit) => {
                        let next = index
                            .unwrap_or(0)
                            .checked_mul(10)
                            .and_then(|n| n.checked_add(digit as usize));
                        match next {
                            Some(next) => {
                                input.step();
                                Selector::Index(Some(next))
                            }
                            None => {
                                return Progress::Error(Diagnostic::message(
                                    "selector index out of range",
                                    input,
                                ));
                            }
                        }
                    }
                    None => match index {
                        Some(index) => {
                            selector = M::select(selector, Step::GetItem(index));
                            Selector::Next
                        }
                        None => return Progress::Error(Diagnostic::expected("digit", input)),
                    },
                },
                Selector::Bracket => {
                    let builder = nested!(resumed, Builder, input);
                    Selector::BracketClose(builder.bind())
                }
                Selector::BracketClose(value) => match close(']', input) {
                    Some(Ok(())) => {
                        let step = if M::is_expression(&value) {
                            Step::Filter(value)
                        } else {
                            Step::Get(value)
                        };
                        selector = M::select(selector, step);
                        Selector::Next
                    }
                    Some(Err(error)) => return Progress::Error(error),
                    None => return Progress::Cont(suspend!(Selector::BracketClose(value))),
                },
            };
        }
    }
}

/// Parses one selector on its own.
pub struct SelectorParser<M: ReconModel = ValueModel> {
    frames: Frames<M>,
}

impl<M: ReconModel> SelectorParser<M> {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self {
            frames: Frames::new(Nested::Selector(SelectorSteps::new(config.guard()))),
        }
    }
}

impl<M: ReconModel> Default for SelectorParser<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ReconModel> Parser for SelectorParser<M> {
    type Value = M::Value;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, M::Value> {
        match self.frames.feed(input) {
            Parsed::Cont(frames) => Parsed::Cont(SelectorParser { frames }),
            Parsed::Done(Output::Expr((selector, None))) => Parsed::Done(selector),
            Parsed::Done(Output::Expr((_, Some(_)))) => {
                Parsed::Error(Diagnostic::expected_char('*', input))
            }
            Parsed::Done(Output::Builder(_)) => {
                Parsed::Error(Diagnostic::expected("selector", input))
            }
            Parsed::Error(error) => Parsed::Error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use pullkit_core::parse_all;

    use super::*;
    use crate::model::InfixOp;
    use crate::parser::BlockParser;
    use crate::value::{Item, Value};

    fn selector(text: &str) -> Vec<Step<Value>> {
        match parse_all(SelectorParser::<ValueModel>::new(), text).unwrap() {
            Value::Selector(steps) => steps,
            other => panic!("expected a selector, got {:?}", other),
        }
    }

    #[test]
    fn test_identity() {
        assert!(selector("$").is_empty());
    }

    #[test]
    fn test_path_steps() {
        assert_eq!(
            selector("$a.@b.\"c d\"#2"),
            vec![
                Step::Get(Value::text("a")),
                Step::GetAttr(Value::text("b")),
                Step::Get(Value::text("c d")),
                Step::GetItem(2),
            ]
        );
    }

    #[test_case::test_case("$*", vec![Step::Children]; "children")]
    #[test_case::test_case("$**", vec![Step::Descendants]; "descendants")]
    #[test_case::test_case("$*:", vec![Step::Keys]; "keys")]
    #[test_case::test_case("$:*", vec![Step::Values]; "values")]
    #[test_case::test_case("$*:*", vec![Step::Children, Step::Values]; "children then values")]
    #[test_case::test_case("$a.*", vec![Step::Get(Value::text("a")), Step::Children]; "dotted children")]
    fn test_wildcards(text: &str, expected: Vec<Step<Value>>) {
        assert_eq!(selector(text), expected);
    }

    #[test]
    fn test_bracket_get_and_filter() {
        assert_eq!(selector("$[3]"), vec![Step::Get(Value::from(3))]);
        assert_eq!(
            selector("$*[$x > 1]"),
            vec![
                Step::Children,
                Step::Filter(Value::infix(
                    Value::selector([Step::Get(Value::text("x"))]),
                    InfixOp::Gt,
                    Value::from(1),
                )),
            ]
        );
    }

    #[test]
    fn test_selector_key_in_slot() {
        assert_eq!(
            parse_all(BlockParser::<ValueModel>::new(), "$a: 1").unwrap(),
            Value::record([Item::slot(Value::selector([Step::Get(Value::text("a"))]), 1)])
        );
    }

    #[test]
    fn test_dot_requires_step() {
        assert!(parse_all(SelectorParser::<ValueModel>::new(), "$a.").is_err());
        assert!(parse_all(SelectorParser::<ValueModel>::new(), "$#").is_err());
    }

    #[test]
    fn test_index_overflow() {
        let error =
            parse_all(SelectorParser::<ValueModel>::new(), "$#99999999999999999999999").unwrap_err();
        assert_eq!(error.to_string(), "selector index out of range at 1:22");
    }
}
