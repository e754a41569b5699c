//! The capabilities a data model offers the Recon grammar.
//!
//! Parsers and writers never name a concrete tree type. They construct
//! values through the associated functions of [`ReconModel`] and inspect
//! them through [`ItemView`] and [`ValueView`], so any tree representation
//! that implements the trait can be read and written. [`ValueModel`](crate::ValueModel)
//! is the reference implementation.

use core::fmt;

use pullkit_core::Builder;

use crate::number::Num;

/// Unary operators, written before their operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixOp {
    Not,
    BitNot,
    Negative,
    Positive,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::BitNot => "~",
            PrefixOp::Negative => "-",
            PrefixOp::Positive => "+",
        }
    }

    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            '!' => Some(PrefixOp::Not),
            '~' => Some(PrefixOp::BitNot),
            '-' => Some(PrefixOp::Negative),
            '+' => Some(PrefixOp::Positive),
            _ => None,
        }
    }
}

/// Binary operators, left-associative within their precedence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfixOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Or => "||",
            InfixOp::And => "&&",
            InfixOp::BitOr => "|",
            InfixOp::BitXor => "^",
            InfixOp::BitAnd => "&",
            InfixOp::Lt => "<",
            InfixOp::Le => "<=",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::Ge => ">=",
            InfixOp::Gt => ">",
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Times => "*",
            InfixOp::Divide => "/",
            InfixOp::Modulo => "%",
        }
    }

    pub fn precedence(self) -> Precedence {
        match self {
            InfixOp::Or => Precedence::Or,
            InfixOp::And => Precedence::And,
            InfixOp::BitOr => Precedence::BitOr,
            InfixOp::BitXor => Precedence::BitXor,
            InfixOp::BitAnd => Precedence::BitAnd,
            InfixOp::Lt | InfixOp::Le | InfixOp::Eq | InfixOp::Ne | InfixOp::Ge | InfixOp::Gt => {
                Precedence::Comparison
            }
            InfixOp::Plus | InfixOp::Minus => Precedence::Additive,
            InfixOp::Times | InfixOp::Divide | InfixOp::Modulo => Precedence::Multiplicative,
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Binding strength of an expression, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Conditional,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Comparison,
    Additive,
    Multiplicative,
    Prefix,
    Invoke,
    Primary,
}

impl Precedence {
    /// The next tighter binary level, or `None` below multiplicative.
    pub(crate) fn tighter(self) -> Option<Self> {
        match self {
            Precedence::Conditional => Some(Precedence::Or),
            Precedence::Or => Some(Precedence::And),
            Precedence::And => Some(Precedence::BitOr),
            Precedence::BitOr => Some(Precedence::BitXor),
            Precedence::BitXor => Some(Precedence::BitAnd),
            Precedence::BitAnd => Some(Precedence::Comparison),
            Precedence::Comparison => Some(Precedence::Additive),
            Precedence::Additive => Some(Precedence::Multiplicative),
            _ => None,
        }
    }
}

/// One step of a selector path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Step<V> {
    /// `$key`, `.key` or `$[value]`
    Get(V),
    /// `$@name`
    GetAttr(V),
    /// `$#3`
    GetItem(usize),
    /// `$*`
    Children,
    /// `$**`
    Descendants,
    /// `$*:`
    Keys,
    /// `$:*`
    Values,
    /// `$[predicate]`
    Filter(V),
}

/// A borrowed view of one record item.
pub enum ItemView<'a, M: ReconModel> {
    Attr(&'a str, &'a M::Value),
    Slot(&'a M::Value, &'a M::Value),
    Value(&'a M::Value),
}

/// A borrowed view of one value.
pub enum ValueView<'a, M: ReconModel> {
    Absent,
    Extant,
    Record(&'a [M::Item]),
    Text(&'a str),
    Data(&'a [u8]),
    Num(&'a Num),
    Bool(bool),
    Selector(&'a [Step<M::Value>]),
    Conditional(&'a M::Value, &'a M::Value, &'a M::Value),
    Infix(&'a M::Value, InfixOp, &'a M::Value),
    Prefix(PrefixOp, &'a M::Value),
    Invoke(&'a M::Value, &'a M::Value),
}

impl<M: ReconModel> Clone for ItemView<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ReconModel> Copy for ItemView<'_, M> {}

impl<M: ReconModel> Clone for ValueView<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ReconModel> Copy for ValueView<'_, M> {}

impl<M: ReconModel> ValueView<'_, M> {
    /// How tightly this value binds when written inside an expression.
    pub fn precedence(&self) -> Precedence {
        match self {
            ValueView::Conditional(..) => Precedence::Conditional,
            ValueView::Infix(_, op, _) => op.precedence(),
            ValueView::Prefix(..) => Precedence::Prefix,
            ValueView::Invoke(..) => Precedence::Invoke,
            _ => Precedence::Primary,
        }
    }
}

/// A tree representation the Recon grammar can build into and write from.
pub trait ReconModel: Sized {
    type Item;
    type Value;

    /// Collapses a lone value item to that value, an empty build to absent,
    /// and anything else to a record.
    type ValueBuilder: Builder<Self::Item, Output = Self::Value>;
    /// Always binds to a record.
    type RecordBuilder: Builder<Self::Item, Output = Self::Value>;

    fn value_builder() -> Self::ValueBuilder;
    fn record_builder() -> Self::RecordBuilder;

    fn attr(name: String, value: Self::Value) -> Self::Item;
    fn slot(key: Self::Value, value: Self::Value) -> Self::Item;
    fn item(value: Self::Value) -> Self::Item;

    fn absent() -> Self::Value;
    fn extant() -> Self::Value;
    fn text(text: String) -> Self::Value;

    /// Text read as an identifier. Models may intern these.
    fn ident(text: String) -> Self::Value {
        Self::text(text)
    }

    fn data(bytes: Vec<u8>) -> Self::Value;
    fn num(num: Num) -> Self::Value;
    fn bool(value: bool) -> Self::Value;

    /// The identity selector, `$`.
    fn selector() -> Self::Value;
    fn select(selector: Self::Value, step: Step<Self::Value>) -> Self::Value;
    fn conditional(cond: Self::Value, then: Self::Value, otherwise: Self::Value) -> Self::Value;
    fn infix(lhs: Self::Value, op: InfixOp, rhs: Self::Value) -> Self::Value;
    fn prefix(op: PrefixOp, operand: Self::Value) -> Self::Value;
    fn invoke(function: Self::Value, args: Self::Value) -> Self::Value;

    fn view_item(item: &Self::Item) -> ItemView<'_, Self>;
    fn view_value(value: &Self::Value) -> ValueView<'_, Self>;

    /// Anything but absent, extant and the identity selector.
    fn is_distinct(value: &Self::Value) -> bool {
        match Self::view_value(value) {
            ValueView::Absent | ValueView::Extant => false,
            ValueView::Selector(steps) => !steps.is_empty(),
            _ => true,
        }
    }

    /// Selectors and operator applications.
    fn is_expression(value: &Self::Value) -> bool {
        matches!(
            Self::view_value(value),
            ValueView::Selector(_)
                | ValueView::Conditional(..)
                | ValueView::Infix(..)
                | ValueView::Prefix(..)
                | ValueView::Invoke(..)
        )
    }
}
