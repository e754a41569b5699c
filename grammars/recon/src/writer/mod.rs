//! Resumable Recon writers.
//!
//! A [`ReconWriter`] walks a value with an explicit task stack instead of
//! recursion, so it can stop on any code point when the output fills up
//! and pick up again on the next pull.

use std::borrow::Cow;

use pullkit_core::{Output, TextWriter, Writer, Written};

use crate::data;
use crate::ident::is_ident;
use crate::model::{ItemView, Precedence, PrefixOp, ReconModel, Step, ValueView};
use crate::value::ValueModel;

mod form;

use form::{
    ends_with_children, is_bare_text, is_block_safe, is_markup_form, is_markup_safe,
    is_primitive, leads_with_number,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoting {
    String,
    Markup,
}

impl Quoting {
    fn escape(self, c: char) -> Option<&'static str> {
        match self {
            Quoting::String => crate::string::escape(c),
            Quoting::Markup => crate::parser::escape_markup(c),
        }
    }
}

enum Task<'a, M: ReconModel> {
    Text(Cow<'a, str>),
    Escaped(&'a str, Quoting),
    Block(&'a M::Value),
    Value(&'a M::Value),
    Operand(&'a M::Value, Precedence, bool),
    Item(&'a M::Item),
    Items(&'a [M::Item]),
    Attributed(&'a [M::Item], bool),
    Attr(&'a str, &'a M::Value),
    Name(&'a str),
    Markup(&'a [M::Item]),
    Steps(&'a [Step<M::Value>], bool),
}

fn lit<'a, M: ReconModel>(text: &'static str) -> Task<'a, M> {
    Task::Text(Cow::Borrowed(text))
}

/// Writes a value as Recon text.
///
/// [`block`](Self::block) writes the top-level form, where a record of
/// several plain items is a bare comma list and absent is empty text.
/// [`value`](Self::value) always writes a self-delimiting value.
///
/// # Example
///
/// ```ignore
/// let text = write_all(ReconWriter::<ValueModel>::block(&value))?;
/// ```
pub struct ReconWriter<'a, M: ReconModel = ValueModel> {
    text: Option<TextWriter<'a>>,
    tasks: Vec<Task<'a, M>>,
}

impl<'a, M: ReconModel> ReconWriter<'a, M> {
    pub fn block(value: &'a M::Value) -> Self {
        Self {
            text: None,
            tasks: vec![Task::Block(value)],
        }
    }

    pub fn value(value: &'a M::Value) -> Self {
        Self {
            text: None,
            tasks: vec![Task::Value(value)],
        }
    }

    /// Pushes `tasks` so that the first of them runs next.
    fn schedule<const N: usize>(&mut self, tasks: [Task<'a, M>; N]) {
        self.tasks.extend(tasks.into_iter().rev());
    }

    fn expand(&mut self, task: Task<'a, M>) {
        match task {
            Task::Text(text) => self.text = Some(TextWriter::new(text)),
            Task::Escaped(text, quoting) => self.escaped(text, quoting),
            Task::Block(value) => self.block_form(value),
            Task::Value(value) => self.value_form(value),
            Task::Operand(value, precedence, strict) => {
                let own = M::view_value(value).precedence();
                if own < precedence || (strict && own == precedence) {
                    self.schedule([lit("("), Task::Value(value), lit(")")]);
                } else {
                    self.value_form(value);
                }
            }
            Task::Item(item) => self.item(item),
            Task::Items(items) => {
                if let Some((first, rest)) = items.split_first() {
                    if rest.is_empty() {
                        self.schedule([Task::Item(first)]);
                    } else {
                        self.schedule([Task::Item(first), lit(","), Task::Items(rest)]);
                    }
                }
            }
            Task::Attributed(items, leading) => self.attributed(items, leading),
            Task::Attr(name, value) => match M::view_value(value) {
                ValueView::Extant => self.schedule([lit("@"), Task::Name(name)]),
                _ => self.schedule([
                    lit("@"),
                    Task::Name(name),
                    lit("("),
                    Task::Block(value),
                    lit(")"),
                ]),
            },
            Task::Name(name) if is_ident(name) => self.text = Some(TextWriter::new(name)),
            Task::Name(name) => self.quoted(name),
            Task::Markup(items) => self.markup(items),
            Task::Steps(steps, first) => self.steps(steps, first),
        }
    }

    fn escaped(&mut self, text: &'a str, quoting: Quoting) {
        let found = text
            .char_indices()
            .find_map(|(at, c)| quoting.escape(c).map(|escape| (at, c, escape)));
        match found {
            None => self.text = Some(TextWriter::new(text)),
            Some((at, c, escape)) => {
                self.schedule([lit(escape), Task::Escaped(&text[at + c.len_utf8()..], quoting)]);
                if at > 0 {
                    self.text = Some(TextWriter::new(&text[..at]));
                }
            }
        }
    }

    fn quoted(&mut self, text: &'a str) {
        self.schedule([lit("\""), Task::Escaped(text, Quoting::String), lit("\"")]);
    }

    fn block_form(&mut self, value: &'a M::Value) {
        match M::view_value(value) {
            ValueView::Absent | ValueView::Extant => {}
            ValueView::Record(items)
                if items.len() > 1
                    && is_block_safe::<M>(items)
                    && !is_markup_form::<M>(items, 2) =>
            {
                self.schedule([Task::Items(items)]);
            }
            _ => self.value_form(value),
        }
    }

    fn value_form(&mut self, value: &'a M::Value) {
        match M::view_value(value) {
            ValueView::Absent | ValueView::Extant => self.schedule([lit("()")]),
            ValueView::Text(text) if is_bare_text(text) => {
                self.text = Some(TextWriter::new(text));
            }
            ValueView::Text(text) => self.quoted(text),
            ValueView::Num(num) => self.text = Some(TextWriter::new(num.to_string())),
            ValueView::Bool(true) => self.schedule([lit("true")]),
            ValueView::Bool(false) => self.schedule([lit("false")]),
            ValueView::Data(bytes) => {
                self.text = Some(TextWriter::new(format!("%{}", data::encode(bytes))));
            }
            ValueView::Selector(steps) => self.schedule([lit("$"), Task::Steps(steps, true)]),
            ValueView::Record(items) => self.record(items),
            ValueView::Conditional(cond, then, otherwise) => self.schedule([
                Task::Operand(cond, Precedence::Conditional, true),
                lit(" ? "),
                Task::Operand(then, Precedence::Conditional, false),
                lit(" : "),
                Task::Operand(otherwise, Precedence::Conditional, false),
            ]),
            ValueView::Infix(lhs, op, rhs) => {
                let level = op.precedence();
                self.schedule([
                    Task::Operand(lhs, level, false),
                    lit(" "),
                    lit(op.symbol()),
                    lit(" "),
                    Task::Operand(rhs, level, true),
                ]);
            }
            ValueView::Prefix(op, operand) => {
                if op == PrefixOp::Negative && leads_with_number::<M>(operand) {
                    self.schedule([lit(op.symbol()), lit("("), Task::Value(operand), lit(")")]);
                } else {
                    self.schedule([
                        lit(op.symbol()),
                        Task::Operand(operand, Precedence::Prefix, false),
                    ]);
                }
            }
            ValueView::Invoke(function, args) => self.schedule([
                Task::Operand(function, Precedence::Invoke, false),
                lit("("),
                Task::Block(args),
                lit(")"),
            ]),
        }
    }

    fn record(&mut self, items: &'a [M::Item]) {
        if items.is_empty() {
            self.schedule([lit("{}")]);
        } else if !is_block_safe::<M>(items) {
            self.attributed(items, true);
        } else if is_markup_form::<M>(items, 2) {
            self.schedule([lit("["), Task::Markup(items), lit("]")]);
        } else {
            self.schedule([lit("{"), Task::Items(items), lit("}")]);
        }
    }

    fn item(&mut self, item: &'a M::Item) {
        match M::view_item(item) {
            ItemView::Attr(name, value) => self.expand(Task::Attr(name, value)),
            ItemView::Value(value) => self.value_form(value),
            ItemView::Slot(key, value) => {
                if !matches!(M::view_value(value), ValueView::Extant) {
                    self.schedule([Task::Value(value)]);
                }
                if ends_with_children::<M>(key) {
                    self.schedule([lit("("), Task::Value(key), lit("):")]);
                } else {
                    self.schedule([Task::Value(key), lit(":")]);
                }
            }
        }
    }

    /// Attributes are written in place; the runs of other items between
    /// them are bracketed so they stay attached to the same record.
    fn attributed(&mut self, items: &'a [M::Item], leading: bool) {
        let Some((first, rest)) = items.split_first() else {
            return;
        };
        if let ItemView::Attr(name, value) = M::view_item(first) {
            self.schedule([Task::Attr(name, value), Task::Attributed(rest, leading)]);
            return;
        }
        let end = items
            .iter()
            .position(|item| matches!(M::view_item(item), ItemView::Attr(..)))
            .unwrap_or(items.len());
        let (run, rest) = items.split_at(end);
        if !rest.is_empty() {
            self.schedule([Task::Attributed(rest, false)]);
        }
        match run {
            [item] if leading && rest.is_empty() && is_primitive::<M>(item) => {
                self.schedule([lit(" "), Task::Item(item)]);
            }
            _ if is_markup_form::<M>(run, 1) => {
                self.schedule([lit("["), Task::Markup(run), lit("]")]);
            }
            _ => self.schedule([lit("{"), Task::Items(run), lit("}")]),
        }
    }

    fn markup(&mut self, items: &'a [M::Item]) {
        let Some((first, rest)) = items.split_first() else {
            return;
        };
        if !rest.is_empty() {
            self.schedule([Task::Markup(rest)]);
        }
        if let ItemView::Value(value) = M::view_item(first) {
            match M::view_value(value) {
                ValueView::Text(text) => return self.escaped(text, Quoting::Markup),
                ValueView::Record(inner) if is_markup_safe::<M>(inner) => {
                    return self.inline(inner);
                }
                _ => {}
            }
        }
        self.schedule([lit("{"), Task::Item(first), lit("}")]);
    }

    fn inline(&mut self, items: &'a [M::Item]) {
        let Some((head, body)) = items.split_first() else {
            return;
        };
        let ItemView::Attr(name, value) = M::view_item(head) else {
            return;
        };
        if body.is_empty() {
            self.schedule([Task::Attr(name, value), lit("{}")]);
        } else if is_markup_form::<M>(body, 1) {
            self.schedule([Task::Attr(name, value), lit("["), Task::Markup(body), lit("]")]);
        } else {
            self.schedule([Task::Attr(name, value), lit("{"), Task::Items(body), lit("}")]);
        }
    }

    fn steps(&mut self, steps: &'a [Step<M::Value>], first: bool) {
        let Some((step, rest)) = steps.split_first() else {
            return;
        };
        if !rest.is_empty() {
            self.schedule([Task::Steps(rest, false)]);
        }
        let dot = if first { "" } else { "." };
        match step {
            Step::Get(key) => match M::view_value(key) {
                ValueView::Text(text) if is_ident(text) => {
                    self.schedule([lit(dot), Task::Text(Cow::Borrowed(text))]);
                }
                ValueView::Text(text) => {
                    self.quoted(text);
                    self.schedule([lit(dot)]);
                }
                _ => self.schedule([lit("["), Task::Block(key), lit("]")]),
            },
            Step::GetAttr(name) => {
                let name = match M::view_value(name) {
                    ValueView::Text(text) => text,
                    _ => "",
                };
                self.schedule([lit(dot), lit("@"), Task::Name(name)]);
            }
            Step::GetItem(index) => self.text = Some(TextWriter::new(format!("#{}", index))),
            Step::Children => self.schedule([lit(dot), lit("*")]),
            Step::Descendants => self.schedule([lit(dot), lit("**")]),
            Step::Keys => self.schedule([lit(dot), lit("*:")]),
            Step::Values => self.schedule([lit(":*")]),
            Step::Filter(predicate) => self.schedule([lit("["), Task::Block(predicate), lit("]")]),
        }
    }
}

impl<M: ReconModel> Writer for ReconWriter<'_, M> {
    type Value = ();

    fn pull<O: Output + ?Sized>(mut self, output: &mut O) -> Written<Self, ()> {
        loop {
            if let Some(text) = self.text.take() {
                match text.pull(output) {
                    Written::Done(()) => {}
                    Written::Cont(text) => {
                        self.text = Some(text);
                        log::trace!("recon writer suspended with {} tasks", self.tasks.len());
                        return Written::Cont(self);
                    }
                    Written::Error(error) => return Written::Error(error),
                }
            }
            match self.tasks.pop() {
                Some(task) => self.expand(task),
                None => return Written::Done(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pullkit_core::{write_all, write_windowed};

    use super::*;
    use crate::model::InfixOp;
    use crate::value::{Item, Value};

    fn block(value: &Value) -> String {
        write_all(ReconWriter::<ValueModel>::block(value)).unwrap()
    }

    fn value(value: &Value) -> String {
        write_all(ReconWriter::<ValueModel>::value(value)).unwrap()
    }

    #[test]
    fn test_golden_record() {
        let record = Value::record([
            Item::attr(
                "foo",
                Value::record([Value::from(1).into(), Value::from(2).into()]),
            ),
            Item::slot("a", "x"),
            Item::slot("b", "1 2 3"),
        ]);
        insta::assert_snapshot!(block(&record), @r#"@foo(1,2){a:x,b:"1 2 3"}"#);
    }

    #[test]
    fn test_primitives() {
        assert_eq!(block(&Value::text("plain")), "plain");
        assert_eq!(block(&Value::text("true")), r#""true""#);
        assert_eq!(block(&Value::text("a\"b\n")), r#""a\"b\n""#);
        assert_eq!(block(&Value::from(-3)), "-3");
        assert_eq!(block(&Value::Bool(false)), "false");
        assert_eq!(block(&Value::Data(vec![1, 2])), "%AQI=");
        assert_eq!(block(&Value::Absent), "");
        assert_eq!(value(&Value::Absent), "()");
    }

    #[test]
    fn test_block_and_value_forms() {
        let pair = Value::record([Item::slot("a", 1), Item::slot("b", 2)]);
        assert_eq!(block(&pair), "a:1,b:2");
        assert_eq!(value(&pair), "{a:1,b:2}");
        let single = Value::record([Value::from(1).into()]);
        assert_eq!(block(&single), "{1}");
        assert_eq!(block(&Value::record([])), "{}");
    }

    #[test]
    fn test_attribute_with_literal() {
        let point = Value::record([Item::attr("point", Value::Extant), Value::from(3).into()]);
        assert_eq!(block(&point), "@point 3");
        let quoted = Value::record([Item::attr("a b", Value::Absent)]);
        assert_eq!(block(&quoted), r#"@"a b"()"#);
    }

    #[test]
    fn test_markup() {
        let markup = Value::record([
            Value::text("Hello, ").into(),
            Value::record([
                Item::attr("em", Value::Extant),
                Value::text("world").into(),
            ])
            .into(),
            Value::text("! [sic]").into(),
        ]);
        insta::assert_snapshot!(block(&markup), @r"[Hello, @em[world]! \[sic\]]");
    }

    #[test]
    fn test_operators() {
        let expr = Value::infix(
            Value::infix(Value::from(1), InfixOp::Plus, Value::from(2)),
            InfixOp::Times,
            Value::prefix(PrefixOp::Negative, Value::from(3)),
        );
        assert_eq!(block(&expr), "(1 + 2) * -(3)");
        let right = Value::infix(
            Value::text("a"),
            InfixOp::Minus,
            Value::infix(Value::text("b"), InfixOp::Minus, Value::text("c")),
        );
        assert_eq!(block(&right), "a - (b - c)");
        let cond = Value::conditional(
            Value::conditional(Value::text("a"), Value::text("b"), Value::text("c")),
            Value::text("d"),
            Value::text("e"),
        );
        assert_eq!(block(&cond), "(a ? b : c) ? d : e");
    }

    #[test]
    fn test_invoke_and_selector() {
        let call = Value::invoke(
            Value::selector([Step::Get(Value::text("f"))]),
            Value::record([Value::from(1).into(), Value::from(2).into()]),
        );
        assert_eq!(block(&call), "$f(1,2)");
        let selector = Value::selector([
            Step::Get(Value::text("a")),
            Step::GetAttr(Value::text("b")),
            Step::GetItem(0),
            Step::Children,
            Step::Keys,
            Step::Values,
            Step::Filter(Value::infix(Value::selector([]), InfixOp::Gt, Value::from(1))),
        ]);
        assert_eq!(block(&selector), "$a.@b#0.*.*::*[$ > 1]");
    }

    #[test]
    fn test_windowed_output_matches() {
        let record = Value::record([
            Item::attr("a", Value::from(1)),
            Item::slot("text", "with \"quotes\""),
            Value::record([Value::text("x").into(), Value::from(2).into()]).into(),
        ]);
        let windowed = write_windowed(ReconWriter::<ValueModel>::block(&record), 1).unwrap();
        assert_eq!(windowed, block(&record));
    }
}
