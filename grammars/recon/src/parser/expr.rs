//! Operator expressions.
//!
//! One parser per precedence level, loosest first. Each level parses its
//! tighter operands and keeps folding while the operator that ended the
//! last operand belongs to it. Binary levels fold left; the conditional
//! folds right through its else branch.

use pullkit_core::{Builder, Diagnostic, Input, NestingGuard, Parser};

use super::item::BlockItemParser;
use super::items::Items;
use super::{ItemBuilder, Nested, Output, Progress, close, is_space};
use crate::model::{InfixOp, Precedence, PrefixOp, ReconModel};
use crate::operator::{OperatorScanner, Token};

/// A parsed operand and the operator token that ended it.
pub(crate) type Expr<M> = (<M as ReconModel>::Value, Option<Token>);

enum Conditional<M: ReconModel> {
    Cond(BinaryParser<M>),
    Then(M::Value),
    Else(M::Value, M::Value),
}

/// `cond ? then : else`, or just the `||` level when no `?` follows.
///
/// Both branches run as nested frames.
pub(crate) struct ConditionalParser<M: ReconModel> {
    guard: NestingGuard,
    state: Conditional<M>,
}

impl<M: ReconModel> ConditionalParser<M> {
    pub(crate) fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Conditional::Cond(BinaryParser::new(Precedence::Or, guard)),
        }
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let ConditionalParser { guard, state } = self;
        match state {
            Conditional::Cond(parser) => {
                let (cond, token) = pull!(parser.step(input, resumed), |parser| {
                    ConditionalParser {
                        guard,
                        state: Conditional::Cond(parser),
                    }
                });
                if token != Some(Token::Question) {
                    return Progress::Done((cond, token));
                }
                let inner = enter!(guard, input);
                Progress::Nest(
                    ConditionalParser {
                        guard,
                        state: Conditional::Then(cond),
                    },
                    Nested::Conditional(ConditionalParser::new(inner)),
                )
            }
            Conditional::Then(cond) => {
                let (then, token) = nested!(resumed, Expr, input);
                if token != Some(Token::Colon) {
                    return Progress::Error(Diagnostic::expected_char(':', input));
                }
                let inner = enter!(guard, input);
                Progress::Nest(
                    ConditionalParser {
                        guard,
                        state: Conditional::Else(cond, then),
                    },
                    Nested::Conditional(ConditionalParser::new(inner)),
                )
            }
            Conditional::Else(cond, then) => {
                let (otherwise, token) = nested!(resumed, Expr, input);
                Progress::Done((M::conditional(cond, then, otherwise), token))
            }
        }
    }
}

enum Operand<M: ReconModel> {
    Binary(Box<BinaryParser<M>>),
    Prefix(PrefixParser<M>),
}

impl<M: ReconModel> Operand<M> {
    fn new(level: Precedence, guard: NestingGuard) -> Self {
        match level.tighter() {
            Some(tighter) => Operand::Binary(Box::new(BinaryParser::new(tighter, guard))),
            None => Operand::Prefix(PrefixParser::new(guard)),
        }
    }

    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        match self {
            Operand::Binary(parser) => (*parser)
                .step(input, resumed)
                .map_state(|parser| Operand::Binary(Box::new(parser))),
            Operand::Prefix(parser) => parser.step(input, resumed).map_state(Operand::Prefix),
        }
    }
}

enum Binary<M: ReconModel> {
    Lhs(Operand<M>),
    Rhs(M::Value, InfixOp, Operand<M>),
}

/// A left-associative chain of operators at one precedence level.
pub(crate) struct BinaryParser<M: ReconModel> {
    level: Precedence,
    guard: NestingGuard,
    state: Binary<M>,
}

impl<M: ReconModel> BinaryParser<M> {
    fn new(level: Precedence, guard: NestingGuard) -> Self {
        Self {
            level,
            guard,
            state: Binary::Lhs(Operand::new(level, guard)),
        }
    }

    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let BinaryParser {
            level,
            guard,
            mut state,
        } = self;
        loop {
            let (lhs, token) = match state {
                Binary::Lhs(operand) => pull!(operand.step(input, resumed), |operand| {
                    BinaryParser {
                        level,
                        guard,
                        state: Binary::Lhs(operand),
                    }
                }),
                Binary::Rhs(lhs, op, operand) => {
                    let (rhs, token) = pull!(operand.step(input, resumed), |operand| {
                        BinaryParser {
                            level,
                            guard,
                            state: Binary::Rhs(lhs, op, operand),
                        }
                    });
                    (M::infix(lhs, op, rhs), token)
                }
            };
            state = match token {
                Some(Token::Infix(op)) if op.precedence() == level => {
                    Binary::Rhs(lhs, op, Operand::new(level, guard))
                }
                _ => return Progress::Done((lhs, token)),
            };
        }
    }
}

enum Prefix<M: ReconModel> {
    Start,
    Minus,
    Operand(PrefixOp),
    Invoke(InvokeParser<M>),
}

/// `!`, `~`, `-` and `+` applied to an operand.
///
/// A `-` directly followed by a digit starts a negative number literal
/// rather than a negation. The operand of an operator runs as a nested
/// frame.
pub(crate) struct PrefixParser<M: ReconModel> {
    guard: NestingGuard,
    state: Prefix<M>,
}

impl<M: ReconModel> PrefixParser<M> {
    fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Prefix::Start,
        }
    }

    fn operand<I: Input + ?Sized>(
        guard: NestingGuard,
        op: PrefixOp,
        input: &mut I,
    ) -> Progress<Self, Expr<M>, M> {
        let inner = enter!(guard, input);
        Progress::Nest(
            PrefixParser {
                guard,
                state: Prefix::Operand(op),
            },
            Nested::Prefix(PrefixParser::new(inner)),
        )
    }

    pub(crate) fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let PrefixParser { guard, mut state } = self;
        loop {
            state = match state {
                Prefix::Start => match input.head() {
                    Some(c) if is_space(c) => {
                        input.step();
                        Prefix::Start
                    }
                    Some('-') => {
                        input.step();
                        Prefix::Minus
                    }
                    Some(c) => match PrefixOp::from_char(c) {
                        Some(op) => {
                            input.step();
                            return Self::operand(guard, op, input);
                        }
                        None => Prefix::Invoke(InvokeParser::new(guard)),
                    },
                    None if input.is_empty() => {
                        return Progress::Cont(PrefixParser {
                            guard,
                            state: Prefix::Start,
                        });
                    }
                    None => Prefix::Invoke(InvokeParser::new(guard)),
                },
                Prefix::Minus => match input.head() {
                    Some('0'..='9') => Prefix::Invoke(InvokeParser::negative(guard)),
                    None if input.is_empty() => {
                        return Progress::Cont(PrefixParser {
                            guard,
                            state: Prefix::Minus,
                        });
                    }
                    _ => return Self::operand(guard, PrefixOp::Negative, input),
                },
                Prefix::Operand(op) => {
                    let (operand, token) = nested!(resumed, Expr, input);
                    if !M::is_distinct(&operand) {
                        return Progress::Error(Diagnostic::expected("value", input));
                    }
                    return Progress::Done((M::prefix(op, operand), token));
                }
                Prefix::Invoke(parser) => {
                    return parser.step(input, resumed).map_state(|parser| PrefixParser {
                        guard,
                        state: Prefix::Invoke(parser),
                    });
                }
            };
        }
    }
}

enum Invoke<M: ReconModel> {
    Primary(PrimaryParser<M>),
    Call(M::Value),
    Args(M::Value),
    Close(M::Value, M::Value),
    Scan(M::Value, OperatorScanner),
}

/// A primary followed by any number of `(args)` applications, then the
/// operator that ends the operand.
pub(crate) struct InvokeParser<M: ReconModel> {
    guard: NestingGuard,
    state: Invoke<M>,
}

impl<M: ReconModel> InvokeParser<M> {
    fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Invoke::Primary(PrimaryParser::new(guard)),
        }
    }

    /// Resumes after a `-` that turned out to start a number.
    fn negative(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Invoke::Primary(PrimaryParser::negative(guard)),
        }
    }

    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let InvokeParser { guard, mut state } = self;
        loop {
            state = match state {
                Invoke::Primary(parser) => {
                    let (value, token) = pull!(parser.step(input, resumed), |parser| {
                        InvokeParser {
                            guard,
                            state: Invoke::Primary(parser),
                        }
                    });
                    if token.is_some() {
                        return Progress::Done((value, token));
                    }
                    Invoke::Call(value)
                }
                Invoke::Call(function) => match input.head() {
                    Some('(') => {
                        input.step();
                        let inner = enter!(guard, input);
                        return Progress::Nest(
                            InvokeParser {
                                guard,
                                state: Invoke::Args(function),
                            },
                            Nested::Items(Items::new(ItemBuilder::value(), inner)),
                        );
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(InvokeParser {
                            guard,
                            state: Invoke::Call(function),
                        });
                    }
                    _ => Invoke::Scan(function, OperatorScanner::new()),
                },
                Invoke::Args(function) => {
                    let args = nested!(resumed, Builder, input);
                    Invoke::Close(function, args.bind())
                }
                Invoke::Close(function, args) => match close(')', input) {
                    Some(Ok(())) => Invoke::Call(M::invoke(function, args)),
                    Some(Err(error)) => return Progress::Error(error),
                    None => {
                        return Progress::Cont(InvokeParser {
                            guard,
                            state: Invoke::Close(function, args),
                        });
                    }
                },
                Invoke::Scan(value, scanner) => {
                    let token = feed!(scanner.feed(input), |scanner| InvokeParser {
                        guard,
                        state: Invoke::Scan(value, scanner),
                    });
                    return Progress::Done((value, token));
                }
            };
        }
    }
}

enum Primary<M: ReconModel> {
    Start,
    Group,
    Close(M::Value),
    Item(BlockItemParser<M>),
}

/// A parenthesized group or a block item.
pub(crate) struct PrimaryParser<M: ReconModel> {
    guard: NestingGuard,
    state: Primary<M>,
}

impl<M: ReconModel> PrimaryParser<M> {
    fn new(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Primary::Start,
        }
    }

    fn negative(guard: NestingGuard) -> Self {
        Self {
            guard,
            state: Primary::Item(BlockItemParser::negative(guard)),
        }
    }

    fn step<I: Input + ?Sized>(
        self,
        input: &mut I,
        resumed: &mut Option<Output<M>>,
    ) -> Progress<Self, Expr<M>, M> {
        let PrimaryParser { guard, mut state } = self;
        loop {
            state = match state {
                Primary::Start => match input.head() {
                    Some('(') => {
                        input.step();
                        let inner = enter!(guard, input);
                        return Progress::Nest(
                            PrimaryParser {
                                guard,
                                state: Primary::Group,
                            },
                            Nested::Items(Items::new(ItemBuilder::value(), inner)),
                        );
                    }
                    None if input.is_empty() => {
                        return Progress::Cont(PrimaryParser {
                            guard,
                            state: Primary::Start,
                        });
                    }
                    _ => Primary::Item(BlockItemParser::new(guard)),
                },
                Primary::Group => Primary::Close(nested!(resumed, Builder, input).bind()),
                Primary::Close(value) => match close(')', input) {
                    Some(Ok(())) => return Progress::Done((value, None)),
                    Some(Err(error)) => return Progress::Error(error),
                    None => {
                        return Progress::Cont(PrimaryParser {
                            guard,
                            state: Primary::Close(value),
                        });
                    }
                },
                Primary::Item(parser) => {
                    return parser.step(input, resumed).map_state(|parser| PrimaryParser {
                        guard,
                        state: Primary::Item(parser),
                    });
                }
            };
        }
    }
}
