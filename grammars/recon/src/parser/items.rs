//! Separated item lists.

use pullkit_core::{Builder, Diagnostic, Input, NestingGuard};

use super::expr::ConditionalParser;
use super::{ItemBuilder, Output, Progress, is_closer, is_newline, is_space};
use crate::model::ReconModel;
use crate::operator::Token;

enum State<M: ReconModel> {
    Start,
    Comment,
    Key(Box<ConditionalParser<M>>),
    SlotStart(M::Value),
    SlotValue(M::Value, Box<ConditionalParser<M>>),
    Separator,
}

fn ends_slot(c: char) -> bool {
    matches!(c, ',' | ';' | '#') || is_newline(c) || is_closer(c)
}

/// Items separated by `,`, `;` or newlines, up to a closing bracket or the
/// end of input.
///
/// The closer itself is left for the enclosing production. Values are
/// added as value items; `key: value` adds a slot, and a key with nothing
/// after its colon binds to extant.
pub(crate) struct Items<M: ReconModel> {
    builder: ItemBuilder<M>,
    guard: NestingGuard,
    state: State<M>,
}

impl<M: ReconModel> Items<M> {
    pub(crate) fn new(builder: ItemBuilder<M>, guard: NestingGuard) -> Self {
        Self {
            builder,
            guard,
            state: State::Start,
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, ItemBuilder<M>, M> {
        let Items {
            mut builder,
            guard,
            mut state,
        } = self;
        loop {
            state = match state {
                State::Start => match input.head() {
                    Some(c) if is_space(c) || is_newline(c) => {
                        input.step();
                        State::Start
                    }
                    Some('#') => {
                        input.step();
                        State::Comment
                    }
                    Some(c) if is_closer(c) => return Progress::Done(builder),
                    Some(_) => State::Key(Box::new(ConditionalParser::new(guard))),
                    None if input.is_empty() => {
                        return Progress::Cont(Items {
                            builder,
                            guard,
                            state: State::Start,
                        });
                    }
                    None if input.is_error() => return Progress::Error(Diagnostic::unexpected(input)),
                    None => return Progress::Done(builder),
                },
                State::Comment => match input.head() {
                    Some(c) if !is_newline(c) => {
                        input.step();
                        State::Comment
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(Items {
                            builder,
                            guard,
                            state: State::Comment,
                        });
                    }
                    _ => State::Start,
                },
                State::Key(parser) => {
                    let (key, token) = pull!((*parser).step(input, resumed), |parser| Items {
                        builder,
                        guard,
                        state: State::Key(Box::new(parser)),
                    });
                    match token {
                        None => {
                            builder.add(M::item(key));
                            State::Separator
                        }
                        Some(Token::Colon) => State::SlotStart(key),
                        Some(_) => return Progress::Error(Diagnostic::expected("item", input)),
                    }
                }
                State::SlotStart(key) => match input.head() {
                    Some(c) if is_space(c) => {
                        input.step();
                        State::SlotStart(key)
                    }
                    Some(c) if ends_slot(c) => {
                        builder.add(M::slot(key, M::extant()));
                        State::Separator
                    }
                    Some(_) => State::SlotValue(key, Box::new(ConditionalParser::new(guard))),
                    None if input.is_empty() => {
                        return Progress::Cont(Items {
                            builder,
                            guard,
                            state: State::SlotStart(key),
                        });
                    }
                    None if input.is_error() => return Progress::Error(Diagnostic::unexpected(input)),
                    None => {
                        builder.add(M::slot(key, M::extant()));
                        State::Separator
                    }
                },
                State::SlotValue(key, parser) => {
                    let (value, token) = pull!((*parser).step(input, resumed), |parser| Items {
                        builder,
                        guard,
                        state: State::SlotValue(key, Box::new(parser)),
                    });
                    if token.is_some() {
                        return Progress::Error(Diagnostic::message("unexpected ':' in slot value", input));
                    }
                    builder.add(M::slot(key, value));
                    State::Separator
                }
                State::Separator => match input.head() {
                    Some(c) if is_space(c) => {
                        input.step();
                        State::Separator
                    }
                    Some(',' | ';') => {
                        input.step();
                        State::Start
                    }
                    Some(c) if is_newline(c) || c == '#' => State::Start,
                    Some(c) if is_closer(c) => return Progress::Done(builder),
                    Some(_) => {
                        return Progress::Error(Diagnostic::expected("',', ';' or newline", input));
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(Items {
                            builder,
                            guard,
                            state: State::Separator,
                        });
                    }
                    None if input.is_error() => return Progress::Error(Diagnostic::unexpected(input)),
                    None => return Progress::Done(builder),
                },
            };
        }
    }
}
