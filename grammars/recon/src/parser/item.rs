//! Block items: attributes, literals, records and markup run together.

use pullkit_core::{Builder, Diagnostic, Input, NestingGuard, Parser};

use super::expr::Expr;
use super::items::Items;
use super::markup::MarkupBody;
use super::selector::SelectorSteps;
use super::{ItemBuilder, Nested, Output, Progress, close, is_space};
use crate::data::DataParser;
use crate::ident::{IdentParser, is_ident_start_char};
use crate::model::ReconModel;
use crate::number::NumberParser;
use crate::string::StringParser;

enum Piece<M: ReconModel> {
    Next,
    Attr(AttrParser<M>),
    Nested,
    Ident(IdentParser),
    Text(StringParser),
    Number(NumberParser),
    Data(DataParser),
    Selector(SelectorSteps<M>),
}

/// One block item: any run of attributes, at most one literal, records
/// and markup, with only spaces between them.
///
/// A lone literal or record yields itself. Anything else accumulates
/// into a value builder, so `@a 1` is a two-item record while `{1}`
/// stays a one-item record. Records and markup run as nested frames.
pub(crate) struct BlockItemParser<M: ReconModel> {
    builder: Option<ItemBuilder<M>>,
    literal: Option<M::Value>,
    open: bool,
    guard: NestingGuard,
    piece: Piece<M>,
}

impl<M: ReconModel> BlockItemParser<M> {
    pub(crate) fn new(guard: NestingGuard) -> Self {
        Self {
            builder: None,
            literal: None,
            open: true,
            guard,
            piece: Piece::Next,
        }
    }

    /// Resumes after a `-` that starts a number literal.
    pub(crate) fn negative(guard: NestingGuard) -> Self {
        Self {
            piece: Piece::Number(NumberParser::negative()),
            ..Self::new(guard)
        }
    }
}

fn builder_mut<'a, M: ReconModel>(
    builder: &'a mut Option<ItemBuilder<M>>,
    literal: &mut Option<M::Value>,
) -> &'a mut ItemBuilder<M> {
    builder.get_or_insert_with(|| {
        let mut builder = ItemBuilder::value();
        if let Some(value) = literal.take() {
            builder.add(M::item(value));
        }
        builder
    })
}

fn take_builder<M: ReconModel>(
    builder: &mut Option<ItemBuilder<M>>,
    literal: &mut Option<M::Value>,
    record: bool,
) -> ItemBuilder<M> {
    match (builder.take(), literal.take()) {
        (Some(builder), _) => builder,
        (None, Some(value)) => {
            let mut builder = ItemBuilder::value();
            builder.add(M::item(value));
            builder
        }
        (None, None) if record => ItemBuilder::record(),
        (None, None) => ItemBuilder::value(),
    }
}

fn push_literal<M: ReconModel>(
    builder: &mut Option<ItemBuilder<M>>,
    literal: &mut Option<M::Value>,
    value: M::Value,
) {
    match builder {
        Some(builder) => builder.add(M::item(value)),
        None => *literal = Some(value),
    }
}

impl<M: ReconModel> BlockItemParser<M> {
    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let BlockItemParser {
            mut builder,
            mut literal,
            mut open,
            guard,
            mut piece,
        } = self;
        macro_rules! suspend {
            ($piece:expr) => {
                BlockItemParser {
                    builder,
                    literal,
                    open,
                    guard,
                    piece: $piece,
                }
            };
        }
        let token = loop {
            piece = match piece {
                Piece::Next => match input.head() {
                    Some(c) if is_space(c) => {
                        input.step();
                        Piece::Next
                    }
                    Some('@') => Piece::Attr(AttrParser::new(guard)),
                    Some('{') => {
                        let inner = enter!(guard, input);
                        let target = take_builder(&mut builder, &mut literal, true);
                        open = false;
                        let child = Nested::Record(RecordParser::new(target, inner));
                        return Progress::Nest(suspend!(Piece::Nested), child);
                    }
                    Some('[') => {
                        let inner = enter!(guard, input);
                        let target = take_builder(&mut builder, &mut literal, false);
                        open = false;
                        let child = Nested::Markup(MarkupBody::new(target, inner));
                        return Progress::Nest(suspend!(Piece::Nested), child);
                    }
                    Some('"' | '\'') if open => Piece::Text(StringParser::new()),
                    Some('0'..='9' | '-') if open => Piece::Number(NumberParser::new()),
                    Some('%') if open => Piece::Data(DataParser::new()),
                    Some('$') if open => Piece::Selector(SelectorSteps::new(guard)),
                    Some(c) if open && is_ident_start_char(c) => Piece::Ident(IdentParser::new()),
                    None if input.is_empty() => return Progress::Cont(suspend!(Piece::Next)),
                    _ => break None,
                },
                Piece::Attr(parser) => {
                    let (name, value) = pull!(parser.step(input, resumed), |parser| {
                        suspend!(Piece::Attr(parser))
                    });
                    builder_mut(&mut builder, &mut literal).add(M::attr(name, value));
                    Piece::Next
                }
                Piece::Nested => {
                    builder = Some(nested!(resumed, Builder, input));
                    Piece::Next
                }
                Piece::Ident(parser) => {
                    let ident =
                        feed!(parser.feed(input), |parser| suspend!(Piece::Ident(parser)));
                    let value = match ident.as_str() {
                        "true" => M::bool(true),
                        "false" => M::bool(false),
                        _ => M::ident(ident),
                    };
                    push_literal(&mut builder, &mut literal, value);
                    open = false;
                    Piece::Next
                }
                Piece::Text(parser) => {
                    let text =
                        feed!(parser.feed(input), |parser| suspend!(Piece::Text(parser)));
                    push_literal(&mut builder, &mut literal, M::text(text));
                    open = false;
                    Piece::Next
                }
                Piece::Number(parser) => {
                    let num =
                        feed!(parser.feed(input), |parser| suspend!(Piece::Number(parser)));
                    push_literal(&mut builder, &mut literal, M::num(num));
                    open = false;
                    Piece::Next
                }
                Piece::Data(parser) => {
                    let bytes =
                        feed!(parser.feed(input), |parser| suspend!(Piece::Data(parser)));
                    push_literal(&mut builder, &mut literal, M::data(bytes));
                    open = false;
                    Piece::Next
                }
                Piece::Selector(parser) => {
                    let (selector, token) = pull!(parser.step(input, resumed), |parser| {
                        suspend!(Piece::Selector(parser))
                    });
                    push_literal(&mut builder, &mut literal, selector);
                    open = false;
                    if token.is_some() {
                        break token;
                    }
                    Piece::Next
                }
            };
        };
        let value = match (builder, literal) {
            (Some(builder), _) => builder.bind(),
            (None, Some(value)) => value,
            (None, None) => M::absent(),
        };
        Progress::Done((value, token))
    }
}

enum Attr<M: ReconModel> {
    At,
    Name,
    Quoted(StringParser),
    Ident(IdentParser),
    Params(String),
    Value(String),
    Close(String, M::Value),
}

/// `@name` with an optional `(block)` directly after the name.
///
/// An attribute without parentheses has the value extant; `@a()` has the
/// value absent. The parenthesized block runs as a nested frame.
pub(crate) struct AttrParser<M: ReconModel> {
    guard: NestingGuard,
    state: Attr<M>,
}

impl<M: ReconModel> AttrParser<M> {
    pub(crate) fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Attr::At,
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, (String, M::Value), M> {
        let AttrParser { guard, mut state } = self;
        loop {
            if input.is_empty() {
                return Progress::Cont(AttrParser { guard, state });
            }
            state = match state {
                Attr::At => match input.head() {
                    Some('@') => {
                        input.step();
                        Attr::Name
                    }
                    _ => return Progress::Error(Diagnostic::expected_char('@', input)),
                },
                Attr::Name => match input.head() {
                    Some('"' | '\'') => Attr::Quoted(StringParser::new()),
                    Some(c) if is_ident_start_char(c) => Attr::Ident(IdentParser::new()),
                    _ => return Progress::Error(Diagnostic::expected("attribute name", input)),
                },
                Attr::Quoted(parser) => Attr::Params(feed!(parser.feed(input), |parser| {
                    AttrParser {
                        guard,
                        state: Attr::Quoted(parser),
                    }
                })),
                Attr::Ident(parser) => Attr::Params(feed!(parser.feed(input), |parser| {
                    AttrParser {
                        guard,
                        state: Attr::Ident(parser),
                    }
                })),
                Attr::Params(name) => match input.head() {
                    Some('(') => {
                        input.step();
                        let inner = enter!(guard, input);
                        return Progress::Nest(
                            AttrParser {
                                guard,
                                state: Attr::Value(name),
                            },
                            Nested::Items(Items::new(ItemBuilder::value(), inner)),
                        );
                    }
                    _ => return Progress::Done((name, M::extant())),
                },
                Attr::Value(name) => {
                    let builder = nested!(resumed, Builder, input);
                    Attr::Close(name, builder.bind())
                }
                Attr::Close(name, value) => match close(')', input) {
                    Some(Ok(())) => return Progress::Done((name, value)),
                    Some(Err(error)) => return Progress::Error(error),
                    None => {
                        return Progress::Cont(AttrParser {
                            guard,
                            state: Attr::Close(name, value),
                        });
                    }
                },
            };
        }
    }
}

enum Record<M: ReconModel> {
    Open(ItemBuilder<M>, NestingGuard),
    Items(Items<M>),
    Close(ItemBuilder<M>),
}

/// `{items}`, added to a builder handed in by the enclosing production.
pub(crate) struct RecordParser<M: ReconModel> {
    state: Record<M>,
}

impl<M: ReconModel> RecordParser<M> {
    /// `guard` is the already entered level of the record body.
    pub(crate) fn new(builder: ItemBuilder<M>, guard: NestingGuard) -> Self {
        Self {
            state: Record::Open(builder, guard),
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, ItemBuilder<M>, M> {
        let mut state = self.state;
        loop {
            state = match state {
                Record::Open(builder, guard) => match close('{', input) {
                    Some(Ok(())) => Record::Items(Items::new(builder, guard)),
                    Some(Err(error)) => return Progress::Error(error),
                    None => {
                        return Progress::Cont(RecordParser {
                            state: Record::Open(builder, guard),
                        });
                    }
                },
                Record::Items(items) => Record::Close(pull!(items.step(input, resumed), |items| {
                    RecordParser {
                        state: Record::Items(items),
                    }
                })),
                Record::Close(builder) => match close('}', input) {
                    Some(Ok(())) => return Progress::Done(builder),
                    Some(Err(error)) => return Progress::Error(error),
                    None => {
                        return Progress::Cont(RecordParser {
                            state: Record::Close(builder),
                        });
                    }
                },
            };
        }
    }
}
