//! Bracketed markup: text interleaved with inline records.

use std::mem;

use pullkit_core::{Builder, Diagnostic, Input, NestingGuard, ParseConfig, Parsed, Parser};

use super::item::{AttrParser, RecordParser};
use super::{Frames, ItemBuilder, Nested, Output, Progress};
use crate::model::ReconModel;
use crate::value::ValueModel;

/// The character a `\c` escape inside markup text stands for.
pub(crate) fn unescape(c: char) -> Option<char> {
    match c {
        '"' | '$' | '\'' | '/' | '\\' | '@' | '[' | ']' | '{' | '}' => Some(c),
        _ => crate::string::unescape(c),
    }
}

/// The escape sequence a markup writer emits for `c`, if any.
pub(crate) fn escape(c: char) -> Option<&'static str> {
    match c {
        '\\' => Some("\\\\"),
        '@' => Some("\\@"),
        '[' => Some("\\["),
        ']' => Some("\\]"),
        '{' => Some("\\{"),
        '}' => Some("\\}"),
        _ => None,
    }
}

/// Adds pending text as a text item, reporting whether it added one.
fn flush<M: ReconModel>(text: &mut String, builder: &mut ItemBuilder<M>) -> bool {
    if text.is_empty() {
        return false;
    }
    builder.add(M::item(M::text(mem::take(text))));
    true
}

enum Markup<M: ReconModel> {
    Open(ItemBuilder<M>),
    Text(ItemBuilder<M>),
    Escape(ItemBuilder<M>),
    Inline(ItemBuilder<M>, InlineParser<M>),
    Spliced,
}

/// `[ ... ]` added to a builder handed in by the enclosing production.
///
/// Text runs become text items. `{items}` and nested `[...]` splice their
/// items into the same builder as nested frames; `@attr` starts an inline
/// record.
pub(crate) struct MarkupBody<M: ReconModel> {
    text: String,
    added: bool,
    guard: NestingGuard,
    state: Markup<M>,
}

impl<M: ReconModel> MarkupBody<M> {
    /// `guard` is the already entered level of the markup body.
    pub(crate) fn new(builder: ItemBuilder<M>, guard: NestingGuard) -> Self {
        Self {
            text: String::new(),
            added: false,
            guard,
            state: Markup::Open(builder),
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, ItemBuilder<M>, M> {
        let MarkupBody {
            mut text,
            mut added,
            guard,
            mut state,
        } = self;
        macro_rules! suspend {
            ($state:expr) => {
                MarkupBody {
                    text,
                    added,
                    guard,
                    state: $state,
                }
            };
        }
        loop {
            state = match state {
                Markup::Open(builder) => match input.head() {
                    Some('[') => {
                        input.step();
                        Markup::Text(builder)
                    }
                    None if input.is_empty() => return Progress::Cont(suspend!(Markup::Open(builder))),
                    _ => return Progress::Error(Diagnostic::expected_char('[', input)),
                },
                Markup::Text(mut builder) => match input.head() {
                    Some(']') => {
                        input.step();
                        added |= flush(&mut text, &mut builder);
                        if !added {
                            builder.add(M::item(M::text(String::new())));
                        }
                        return Progress::Done(builder);
                    }
                    Some('\\') => {
                        input.step();
                        Markup::Escape(builder)
                    }
                    Some('@') => {
                        added |= flush(&mut text, &mut builder);
                        let inner = enter!(guard, input);
                        Markup::Inline(builder, InlineParser::new(inner))
                    }
                    Some('{') => {
                        added |= flush(&mut text, &mut builder);
                        let inner = enter!(guard, input);
                        let child = Nested::Record(RecordParser::new(builder, inner));
                        return Progress::Nest(suspend!(Markup::Spliced), child);
                    }
                    Some('[') => {
                        added |= flush(&mut text, &mut builder);
                        let inner = enter!(guard, input);
                        let child = Nested::Markup(MarkupBody::new(builder, inner));
                        return Progress::Nest(suspend!(Markup::Spliced), child);
                    }
                    Some(c) => {
                        input.step();
                        text.push(c);
                        Markup::Text(builder)
                    }
                    None if input.is_empty() => return Progress::Cont(suspend!(Markup::Text(builder))),
                    None => return Progress::Error(Diagnostic::expected_char(']', input)),
                },
                Markup::Escape(builder) => match input.head().and_then(unescape) {
                    Some(c) => {
                        input.step();
                        text.push(c);
                        Markup::Text(builder)
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(suspend!(Markup::Escape(builder)));
                    }
                    None => return Progress::Error(Diagnostic::expected("escape character", input)),
                },
                Markup::Inline(mut builder, parser) => {
                    let value = pull!(parser.step(input, resumed), |parser| {
                        suspend!(Markup::Inline(builder, parser))
                    });
                    builder.add(M::item(value));
                    added = true;
                    Markup::Text(builder)
                }
                Markup::Spliced => {
                    let builder = nested!(resumed, Builder, input);
                    added = true;
                    Markup::Text(builder)
                }
            };
        }
    }
}

enum Inline<M: ReconModel> {
    Attr(ItemBuilder<M>, AttrParser<M>),
    Body(ItemBuilder<M>),
    Nested,
}

/// `@attr` inside markup, optionally followed directly by one `{record}`
/// or `[markup]` that completes the same inline record.
pub(crate) struct InlineParser<M: ReconModel> {
    guard: NestingGuard,
    state: Inline<M>,
}

impl<M: ReconModel> InlineParser<M> {
    fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Inline::Attr(ItemBuilder::value(), AttrParser::new(guard)),
        }
    }

    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, M::Value, M> {
        let InlineParser { guard, mut state } = self;
        loop {
            state = match state {
                Inline::Attr(mut builder, parser) => {
                    let (name, value) = pull!(parser.step(input, resumed), |parser| {
                        InlineParser {
                            guard,
                            state: Inline::Attr(builder, parser),
                        }
                    });
                    builder.add(M::attr(name, value));
                    Inline::Body(builder)
                }
                Inline::Body(builder) => match input.head() {
                    Some('{') => {
                        let inner = enter!(guard, input);
                        return Progress::Nest(
                            InlineParser {
                                guard,
                                state: Inline::Nested,
                            },
                            Nested::Record(RecordParser::new(builder, inner)),
                        );
                    }
                    Some('[') => {
                        let inner = enter!(guard, input);
                        return Progress::Nest(
                            InlineParser {
                                guard,
                                state: Inline::Nested,
                            },
                            Nested::Markup(MarkupBody::new(builder, inner)),
                        );
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(InlineParser {
                            guard,
                            state: Inline::Body(builder),
                        });
                    }
                    _ => return Progress::Done(builder.bind()),
                },
                Inline::Nested => {
                    let builder = nested!(resumed, Builder, input);
                    return Progress::Done(builder.bind());
                }
            };
        }
    }
}

/// Parses one bracketed markup value on its own.
///
/// # Example
///
/// ```ignore
/// let value = parse_all(MarkupParser::<ValueModel>::new(), "[Hello, @em[world]!]")?;
/// ```
pub struct MarkupParser<M: ReconModel = ValueModel> {
    frames: Frames<M>,
}

impl<M: ReconModel> MarkupParser<M> {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        let body = MarkupBody::new(ItemBuilder::value(), config.guard());
        Self {
            frames: Frames::new(Nested::Markup(body)),
        }
    }
}

impl<M: ReconModel> Default for MarkupParser<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ReconModel> Parser for MarkupParser<M> {
    type Value = M::Value;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, M::Value> {
        match self.frames.feed(input) {
            Parsed::Cont(frames) => Parsed::Cont(MarkupParser { frames }),
            Parsed::Done(Output::Builder(builder)) => Parsed::Done(builder.bind()),
            Parsed::Done(Output::Expr(_)) => Parsed::Error(Diagnostic::expected("markup", input)),
            Parsed::Error(error) => Parsed::Error(error),
        }
    }
}
