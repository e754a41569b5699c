//! Resumable Recon parsers.
//!
//! Every grammar production is its own state machine. A production that
//! needs a sub-production holds it in a variant and resumes it from the
//! top of `step`, so arbitrarily split input never re-reads a code point.
//!
//! Expression levels return the value they parsed together with the
//! operator token that ended it, if any. The enclosing level either
//! consumes that token or hands it further out; an item list finally
//! turns a pending `:` into a slot.
//!
//! Brackets, groups, prefix operands and conditional branches do not
//! nest on the call stack. The production that opens one returns
//! [`Progress::Nest`] with the child; [`Frames`] keeps the suspended parent on
//! a heap stack, runs the child on its own and resumes the parent with
//! the child's [`Output`]. Each `step` call therefore spans a single
//! nesting level however deep the document goes.

use pullkit_core::{Builder, Diagnostic, Input, ParseConfig, Parsed, Parser};

use crate::model::ReconModel;
use crate::value::ValueModel;

/// Enters one nesting level, failing the enclosing `step` past the limit.
macro_rules! enter {
    ($guard:expr, $input:expr) => {
        match $guard.enter() {
            Ok(guard) => guard,
            Err(error) => {
                return $crate::parser::Progress::Error(pullkit_core::Diagnostic::limit(
                    error, $input,
                ));
            }
        }
    };
}

/// Unwraps a finished sub-step, or suspends the enclosing parser.
///
/// A sub-step that nests suspends the enclosing parser the same way and
/// passes the child out.
macro_rules! pull {
    ($step:expr, |$cont:pat_param| $suspend:expr) => {
        match $step {
            $crate::parser::Progress::Done(value) => value,
            $crate::parser::Progress::Cont($cont) => return $crate::parser::Progress::Cont($suspend),
            $crate::parser::Progress::Nest($cont, child) => {
                return $crate::parser::Progress::Nest($suspend, child);
            }
            $crate::parser::Progress::Error(error) => return $crate::parser::Progress::Error(error),
        }
    };
}

/// `pull!` for a plain [`Parser`] sub-parse, which never nests.
macro_rules! feed {
    ($parsed:expr, |$cont:pat_param| $suspend:expr) => {
        match $parsed {
            pullkit_core::Parsed::Done(value) => value,
            pullkit_core::Parsed::Cont($cont) => return $crate::parser::Progress::Cont($suspend),
            pullkit_core::Parsed::Error(error) => return $crate::parser::Progress::Error(error),
        }
    };
}

/// Takes the output a waiting state was resumed with.
macro_rules! nested {
    ($resumed:expr, $variant:ident, $input:expr) => {
        match $resumed.take() {
            Some($crate::parser::Output::$variant(value)) => value,
            _ => {
                return $crate::parser::Progress::Error(pullkit_core::Diagnostic::message(
                    "nested production resumed without its result",
                    $input,
                ));
            }
        }
    };
}

mod expr;
mod item;
mod items;
mod markup;
mod selector;

pub(crate) use markup::escape as escape_markup;
pub use markup::MarkupParser;
pub use selector::SelectorParser;

use expr::{ConditionalParser, Expr, PrefixParser};
use item::RecordParser;
use items::Items;
use markup::MarkupBody;
use selector::SelectorSteps;

/// Outcome of one `step` of a production.
pub(crate) enum Progress<S, T, M: ReconModel> {
    /// The input ran dry.
    Cont(S),
    /// The production finished.
    Done(T),
    /// The production opened a nested one and waits for its [`Output`].
    Nest(S, Nested<M>),
    Error(Diagnostic),
}

impl<S, T, M: ReconModel> Progress<S, T, M> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Progress<S, U, M> {
        match self {
            Progress::Cont(state) => Progress::Cont(state),
            Progress::Done(value) => Progress::Done(f(value)),
            Progress::Nest(state, child) => Progress::Nest(state, child),
            Progress::Error(error) => Progress::Error(error),
        }
    }

    fn map_state<R>(self, f: impl FnOnce(S) -> R) -> Progress<R, T, M> {
        match self {
            Progress::Cont(state) => Progress::Cont(f(state)),
            Progress::Done(value) => Progress::Done(value),
            Progress::Nest(state, child) => Progress::Nest(f(state), child),
            Progress::Error(error) => Progress::Error(error),
        }
    }
}

/// A production run on its own frame.
pub(crate) enum Nested<M: ReconModel> {
    Items(Items<M>),
    Record(RecordParser<M>),
    Markup(MarkupBody<M>),
    Conditional(ConditionalParser<M>),
    Prefix(PrefixParser<M>),
    Selector(SelectorSteps<M>),
}

/// What a finished frame hands back to the frame below it.
pub(crate) enum Output<M: ReconModel> {
    Builder(ItemBuilder<M>),
    Expr(Expr<M>),
}

impl<M: ReconModel> Nested<M> {
    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Output<M>, M> {
        match self {
            Nested::Items(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Items)
                .map(Output::Builder),
            Nested::Record(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Record)
                .map(Output::Builder),
            Nested::Markup(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Markup)
                .map(Output::Builder),
            Nested::Conditional(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Conditional)
                .map(Output::Expr),
            Nested::Prefix(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Prefix)
                .map(Output::Expr),
            Nested::Selector(parser) => parser
                .step(input, resumed)
                .map_state(Nested::Selector)
                .map(Output::Expr),
        }
    }
}

/// Runs nested productions off a heap stack of suspended frames.
///
/// The top frame is stepped; a frame that nests is pushed down and its
/// child stepped next, and a finished child resumes the frame below with
/// its output. A suspended `Frames` keeps the whole stack.
pub(crate) struct Frames<M: ReconModel> {
    top: Nested<M>,
    below: Vec<Nested<M>>,
    resumed: Option<Output<M>>,
}

impl<M: ReconModel> Frames<M> {
    pub(crate) fn new(root: Nested<M>) -> Self {
        Self {
            top: root,
            below: Vec::new(),
            resumed: None,
        }
    }

    /// Frames currently suspended under the top one.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.below.len()
    }
}

impl<M: ReconModel> Parser for Frames<M> {
    type Value = Output<M>;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Output<M>> {
        let Frames {
            mut top,
            mut below,
            mut resumed,
        } = self;
        loop {
            match top.step(input, &mut resumed) {
                Progress::Cont(top) => {
                    return Parsed::Cont(Frames {
                        top,
                        below,
                        resumed,
                    });
                }
                Progress::Nest(parent, child) => {
                    below.push(parent);
                    top = child;
                }
                Progress::Done(output) => match below.pop() {
                    Some(parent) => {
                        resumed = Some(output);
                        top = parent;
                    }
                    None => return Parsed::Done(output),
                },
                Progress::Error(error) => return Parsed::Error(error),
            }
        }
    }
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

fn is_closer(c: char) -> bool {
    matches!(c, '}' | ')' | ']')
}

/// A model builder that either collapses a lone value or always yields a
/// record.
pub(crate) enum ItemBuilder<M: ReconModel> {
    Value(M::ValueBuilder),
    Record(M::RecordBuilder),
}

impl<M: ReconModel> ItemBuilder<M> {
    pub(crate) fn value() -> Self {
        ItemBuilder::Value(M::value_builder())
    }

    pub(crate) fn record() -> Self {
        ItemBuilder::Record(M::record_builder())
    }
}

impl<M: ReconModel> Builder<M::Item> for ItemBuilder<M> {
    type Output = M::Value;

    fn add(&mut self, item: M::Item) {
        match self {
            ItemBuilder::Value(builder) => builder.add(item),
            ItemBuilder::Record(builder) => builder.add(item),
        }
    }

    fn bind(self) -> M::Value {
        match self {
            ItemBuilder::Value(builder) => builder.bind(),
            ItemBuilder::Record(builder) => builder.bind(),
        }
    }
}

/// Parses a block: a separated item list with no enclosing brackets.
///
/// A block holding a single value item yields that value; otherwise it
/// yields a record of its items, and an empty block yields absent.
///
/// # Example
///
/// ```ignore
/// let value = parse_all(BlockParser::<ValueModel>::new(), "a: 1, b: 2")?;
/// ```
pub struct BlockParser<M: ReconModel = ValueModel> {
    frames: Frames<M>,
}

impl<M: ReconModel> BlockParser<M> {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default())
    }

    pub fn with_config(config: ParseConfig) -> Self {
        Self {
            frames: Frames::new(Nested::Items(Items::new(ItemBuilder::value(), config.guard()))),
        }
    }
}

impl<M: ReconModel> Default for BlockParser<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ReconModel> Parser for BlockParser<M> {
    type Value = M::Value;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, M::Value> {
        match self.frames.feed(input) {
            Parsed::Cont(frames) => {
                log::trace!("block suspended at {}", input.position());
                Parsed::Cont(BlockParser { frames })
            }
            Parsed::Done(Output::Builder(builder)) => Parsed::Done(builder.bind()),
            Parsed::Done(Output::Expr(_)) => Parsed::Error(Diagnostic::expected("block", input)),
            Parsed::Error(error) => Parsed::Error(error),
        }
    }
}

/// Starts a block parse over `input`.
pub fn parse_block<M: ReconModel, I: Input + ?Sized>(
    input: &mut I,
) -> Parsed<BlockParser<M>, M::Value> {
    BlockParser::new().feed(input)
}

/// Starts a bracketed markup parse over `input`.
pub fn parse_markup<M: ReconModel, I: Input + ?Sized>(
    input: &mut I,
) -> Parsed<MarkupParser<M>, M::Value> {
    MarkupParser::new().feed(input)
}

/// Starts a `$` selector parse over `input`.
pub fn parse_selector<M: ReconModel, I: Input + ?Sized>(
    input: &mut I,
) -> Parsed<SelectorParser<M>, M::Value> {
    SelectorParser::new().feed(input)
}

/// Consumes the `expected` closer; `None` while more input is needed.
fn close<I: Input + ?Sized>(expected: char, input: &mut I) -> Option<Result<(), Diagnostic>> {
    match input.head() {
        Some(c) if c == expected => {
            input.step();
            Some(Ok(()))
        }
        None if input.is_empty() => None,
        _ => Some(Err(Diagnostic::expected_char(expected, input))),
    }
}

#[cfg(test)]
mod tests {
    use pullkit_core::{ParseConfig, StrInput, parse_all};

    use super::*;
    use crate::model::PrefixOp;
    use crate::value::{Item, Value};

    fn frames() -> Frames<ValueModel> {
        let guard = ParseConfig::default().guard();
        Frames::new(Nested::Items(Items::new(ItemBuilder::value(), guard)))
    }

    #[test]
    fn test_each_opened_bracket_is_a_frame() {
        let mut input = StrInput::new("{(a: [x @b{$[").partial(true);
        let Parsed::Cont(frames) = frames().feed(&mut input) else {
            panic!("expected a suspended parse");
        };
        assert_eq!(frames.depth(), 5);

        let mut rest = StrInput::new("1]}]), 2}");
        let Parsed::Done(Output::Builder(builder)) = frames.feed(&mut rest) else {
            panic!("expected a finished block");
        };
        let expected = parse_all(BlockParser::<ValueModel>::new(), "{(a: [x @b{$[1]}]), 2}");
        assert_eq!(builder.bind(), expected.unwrap());
    }

    #[test]
    fn test_closed_brackets_pop_their_frames() {
        let mut input = StrInput::new("{a: (1)} [b] ").partial(true);
        let Parsed::Cont(frames) = frames().feed(&mut input) else {
            panic!("expected a suspended parse");
        };
        assert_eq!(frames.depth(), 0);
    }

    #[test]
    fn test_prefix_operands_resume_through_frames() {
        let value = parse_all(BlockParser::<ValueModel>::new(), "!-~x").unwrap();
        let expected = Value::prefix(
            PrefixOp::Not,
            Value::prefix(
                PrefixOp::Negative,
                Value::prefix(PrefixOp::BitNot, Value::text("x")),
            ),
        );
        assert_eq!(value, expected);
        let negated = Value::prefix(PrefixOp::Not, Value::text("b"));
        assert_eq!(
            parse_all(BlockParser::<ValueModel>::new(), "{a: !b}").unwrap(),
            Value::record([Item::slot("a", negated)])
        );
    }
}
