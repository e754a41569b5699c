//! The reference Recon data model.

use core::fmt;
use core::mem;
use core::str::FromStr;
use std::sync::{Arc, OnceLock};

use pullkit_core::{Builder, HashGenCacheSet};

use crate::error::ReconError;
use crate::model::{InfixOp, ItemView, PrefixOp, ReconModel, Step, ValueView};
use crate::number::Num;

/// A Recon value.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Absent,
    Extant,
    Record(Vec<Item>),
    Text(Arc<str>),
    Data(Vec<u8>),
    Num(Num),
    Bool(bool),
    /// A selector path; empty is the identity selector `$`.
    Selector(Vec<Step<Value>>),
    Operator(Box<Operator>),
}

/// An operator application.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operator {
    Conditional(Value, Value, Value),
    Infix(Value, InfixOp, Value),
    Prefix(PrefixOp, Value),
    Invoke(Value, Value),
}

impl Operator {
    /// Moves operands that are themselves operators onto `pending`.
    fn detach(&mut self, pending: &mut Vec<Box<Operator>>) {
        let mut take = |value: &mut Value| {
            if matches!(value, Value::Operator(_)) {
                if let Value::Operator(operator) = mem::take(value) {
                    pending.push(operator);
                }
            }
        };
        match self {
            Operator::Conditional(cond, then, otherwise) => {
                take(cond);
                take(then);
                take(otherwise);
            }
            Operator::Infix(lhs, _, rhs) => {
                take(lhs);
                take(rhs);
            }
            Operator::Prefix(_, operand) => take(operand),
            Operator::Invoke(function, args) => {
                take(function);
                take(args);
            }
        }
    }
}

/// Operator chains such as `1 + 1 + ... + 1` grow one level per operator,
/// so they are torn down from a heap stack rather than by recursion.
impl Drop for Operator {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach(&mut pending);
        while let Some(mut operator) = pending.pop() {
            operator.detach(&mut pending);
        }
    }
}

/// One member of a record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Item {
    Attr(Arc<str>, Value),
    Slot(Value, Value),
    Value(Value),
}

static NAMES: OnceLock<HashGenCacheSet<str>> = OnceLock::new();

/// The shared copy of an identifier or attribute name.
pub fn intern(name: &str) -> Arc<str> {
    NAMES
        .get_or_init(|| HashGenCacheSet::new(1024))
        .intern(name)
}

impl Value {
    pub fn text(text: &str) -> Self {
        Value::Text(Arc::from(text))
    }

    pub fn record(items: impl IntoIterator<Item = Item>) -> Self {
        Value::Record(items.into_iter().collect())
    }

    pub fn selector(steps: impl IntoIterator<Item = Step<Value>>) -> Self {
        Value::Selector(steps.into_iter().collect())
    }

    pub fn conditional(cond: Value, then: Value, otherwise: Value) -> Self {
        Value::Operator(Box::new(Operator::Conditional(cond, then, otherwise)))
    }

    pub fn infix(lhs: Value, op: InfixOp, rhs: Value) -> Self {
        Value::Operator(Box::new(Operator::Infix(lhs, op, rhs)))
    }

    pub fn prefix(op: PrefixOp, operand: Value) -> Self {
        Value::Operator(Box::new(Operator::Prefix(op, operand)))
    }

    pub fn invoke(function: Value, args: Value) -> Self {
        Value::Operator(Box::new(Operator::Invoke(function, args)))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Item] {
        match self {
            Value::Record(items) => items,
            _ => &[],
        }
    }

    /// The value of the first attribute or slot named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items().iter().find_map(|item| match item {
            Item::Attr(name, value) if &**name == key => Some(value),
            Item::Slot(Value::Text(name), value) if &**name == key => Some(value),
            _ => None,
        })
    }
}

impl Item {
    pub fn attr(name: &str, value: Value) -> Self {
        Item::Attr(intern(name), value)
    }

    pub fn slot(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Item::Slot(key.into(), value.into())
    }

    pub fn is_attr(&self) -> bool {
        matches!(self, Item::Attr(..))
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Value(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::text(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(Arc::from(text))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Num(Num::I32(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Num(Num::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(Num::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Num> for Value {
    fn from(num: Num) -> Self {
        Value::Num(num)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for Value {
    type Err = ReconError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        crate::parse(text)
    }
}

/// Builds a [`Value`], collapsing a lone value item to that value.
#[derive(Debug, Clone, Default)]
pub struct ValueBuilder {
    items: Vec<Item>,
}

impl Builder<Item> for ValueBuilder {
    type Output = Value;

    fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    fn bind(mut self) -> Value {
        match self.items.len() {
            0 => Value::Absent,
            1 if matches!(self.items[0], Item::Value(_)) => match self.items.pop() {
                Some(Item::Value(value)) => value,
                _ => Value::Absent,
            },
            _ => Value::Record(self.items),
        }
    }
}

/// Builds a [`Value::Record`], whatever it holds.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    items: Vec<Item>,
}

impl Builder<Item> for RecordBuilder {
    type Output = Value;

    fn add(&mut self, item: Item) {
        self.items.push(item);
    }

    fn bind(self) -> Value {
        Value::Record(self.items)
    }
}

/// [`ReconModel`] over [`Value`] and [`Item`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueModel;

impl ReconModel for ValueModel {
    type Item = Item;
    type Value = Value;
    type ValueBuilder = ValueBuilder;
    type RecordBuilder = RecordBuilder;

    fn value_builder() -> ValueBuilder {
        ValueBuilder::default()
    }

    fn record_builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    fn attr(name: String, value: Value) -> Item {
        Item::Attr(intern(&name), value)
    }

    fn slot(key: Value, value: Value) -> Item {
        Item::Slot(key, value)
    }

    fn item(value: Value) -> Item {
        Item::Value(value)
    }

    fn absent() -> Value {
        Value::Absent
    }

    fn extant() -> Value {
        Value::Extant
    }

    fn text(text: String) -> Value {
        Value::from(text)
    }

    fn ident(text: String) -> Value {
        Value::Text(intern(&text))
    }

    fn data(bytes: Vec<u8>) -> Value {
        Value::Data(bytes)
    }

    fn num(num: Num) -> Value {
        Value::Num(num)
    }

    fn bool(value: bool) -> Value {
        Value::Bool(value)
    }

    fn selector() -> Value {
        Value::Selector(Vec::new())
    }

    fn select(selector: Value, step: Step<Value>) -> Value {
        match selector {
            Value::Selector(mut steps) => {
                steps.push(step);
                Value::Selector(steps)
            }
            _ => Value::Selector(vec![step]),
        }
    }

    fn conditional(cond: Value, then: Value, otherwise: Value) -> Value {
        Value::conditional(cond, then, otherwise)
    }

    fn infix(lhs: Value, op: InfixOp, rhs: Value) -> Value {
        Value::infix(lhs, op, rhs)
    }

    fn prefix(op: PrefixOp, operand: Value) -> Value {
        Value::prefix(op, operand)
    }

    fn invoke(function: Value, args: Value) -> Value {
        Value::invoke(function, args)
    }

    fn view_item(item: &Item) -> ItemView<'_, Self> {
        match item {
            Item::Attr(name, value) => ItemView::Attr(name, value),
            Item::Slot(key, value) => ItemView::Slot(key, value),
            Item::Value(value) => ItemView::Value(value),
        }
    }

    fn view_value(value: &Value) -> ValueView<'_, Self> {
        match value {
            Value::Absent => ValueView::Absent,
            Value::Extant => ValueView::Extant,
            Value::Record(items) => ValueView::Record(items),
            Value::Text(text) => ValueView::Text(text),
            Value::Data(bytes) => ValueView::Data(bytes),
            Value::Num(num) => ValueView::Num(num),
            Value::Bool(value) => ValueView::Bool(*value),
            Value::Selector(steps) => ValueView::Selector(steps),
            Value::Operator(operator) => match &**operator {
                Operator::Conditional(cond, then, otherwise) => {
                    ValueView::Conditional(cond, then, otherwise)
                }
                Operator::Infix(lhs, op, rhs) => ValueView::Infix(lhs, *op, rhs),
                Operator::Prefix(op, operand) => ValueView::Prefix(*op, operand),
                Operator::Invoke(function, args) => ValueView::Invoke(function, args),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_builder_collapses_single_value() {
        let mut builder = ValueModel::value_builder();
        builder.add(Item::Value(Value::from(1)));
        assert_eq!(builder.bind(), Value::from(1));
    }

    #[test]
    fn test_value_builder_keeps_single_attr() {
        let mut builder = ValueModel::value_builder();
        builder.add(Item::attr("a", Value::Extant));
        assert_eq!(builder.bind(), Value::record([Item::attr("a", Value::Extant)]));
    }

    #[test]
    fn test_record_builder_never_collapses() {
        let mut builder = ValueModel::record_builder();
        builder.add(Item::Value(Value::from(1)));
        assert_eq!(builder.bind(), Value::record([Item::from(Value::from(1))]));
        assert_eq!(ValueModel::record_builder().bind(), Value::record([]));
        assert_eq!(ValueModel::value_builder().bind(), Value::Absent);
    }

    #[test]
    fn test_identifiers_are_interned() {
        let a = ValueModel::ident("shared".to_owned());
        let b = ValueModel::ident("shared".to_owned());
        match (a, b) {
            (Value::Text(a), Value::Text(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_distinct_and_expression() {
        assert!(!ValueModel::is_distinct(&Value::Absent));
        assert!(!ValueModel::is_distinct(&Value::selector([])));
        assert!(ValueModel::is_distinct(&Value::selector([Step::Children])));
        assert!(ValueModel::is_expression(&Value::selector([])));
        assert!(!ValueModel::is_expression(&Value::from(3)));
    }

    #[test]
    fn test_long_operator_chain_drops() {
        let mut chain = Value::from(1);
        for n in 0..200_000 {
            let op = if n % 2 == 0 { InfixOp::Plus } else { InfixOp::Times };
            chain = Value::infix(chain, op, Value::prefix(PrefixOp::Negative, Value::from(n)));
        }
        drop(chain);

        let mut calls = Value::text("f");
        for _ in 0..200_000 {
            calls = Value::invoke(calls, Value::Absent);
        }
        drop(calls);
    }

    #[test]
    fn test_get_by_key() {
        let record = Value::record([Item::attr("a", Value::from(1)), Item::slot("b", 2)]);
        assert_eq!(record.get("a"), Some(&Value::from(1)));
        assert_eq!(record.get("b"), Some(&Value::from(2)));
        assert_eq!(record.get("c"), None);
    }
}
