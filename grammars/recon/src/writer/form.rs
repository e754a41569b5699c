//! Which textual form a record takes.

use crate::ident::is_ident;
use crate::model::{ItemView, ReconModel, Step, ValueView};

fn is_attr<M: ReconModel>(item: &M::Item) -> bool {
    matches!(M::view_item(item), ItemView::Attr(..))
}

fn text_item<'a, M: ReconModel>(item: &'a M::Item) -> Option<&'a str>
where
    M::Item: 'a,
    M::Value: 'a,
{
    match M::view_item(item) {
        ItemView::Value(value) => match M::view_value(value) {
            ValueView::Text(text) => Some(text),
            _ => None,
        },
        _ => None,
    }
}

/// No item is an attribute.
pub(crate) fn is_block_safe<M: ReconModel>(items: &[M::Item]) -> bool {
    !items.iter().any(is_attr::<M>)
}

/// Exactly one attribute, and it comes first.
pub(crate) fn is_markup_safe<M: ReconModel>(items: &[M::Item]) -> bool {
    match items.split_first() {
        Some((head, rest)) => is_attr::<M>(head) && is_block_safe::<M>(rest),
        None => false,
    }
}

/// The items read back identically from `[...]` markup: at least `min`
/// of them, led by non-empty text, with no attributes, empty texts or two
/// texts in a row.
pub(crate) fn is_markup_form<M: ReconModel>(items: &[M::Item], min: usize) -> bool {
    let leads_with_text = items
        .first()
        .and_then(text_item::<M>)
        .is_some_and(|text| !text.is_empty());
    if items.len() < min || !leads_with_text {
        return false;
    }
    let mut previous_text = false;
    for item in items {
        if is_attr::<M>(item) {
            return false;
        }
        let text = text_item::<M>(item);
        if text.is_some_and(str::is_empty) || (previous_text && text.is_some()) {
            return false;
        }
        previous_text = text.is_some();
    }
    true
}

/// A literal that may follow attributes on the same line.
pub(crate) fn is_primitive<M: ReconModel>(item: &M::Item) -> bool {
    match M::view_item(item) {
        ItemView::Value(value) => matches!(
            M::view_value(value),
            ValueView::Text(_) | ValueView::Num(_) | ValueView::Bool(_) | ValueView::Data(_)
        ),
        _ => false,
    }
}

/// Text written bare reads back as the same text, not a boolean.
pub(crate) fn is_bare_text(text: &str) -> bool {
    is_ident(text) && text != "true" && text != "false"
}

/// A slot key selector whose trailing `*` would swallow the slot colon.
pub(crate) fn ends_with_children<M: ReconModel>(value: &M::Value) -> bool {
    match M::view_value(value) {
        ValueView::Selector(steps) => matches!(steps.last(), Some(Step::Children)),
        _ => false,
    }
}

/// The written value starts with a digit, so a `-` before it would read
/// as part of a number.
pub(crate) fn leads_with_number<M: ReconModel>(value: &M::Value) -> bool {
    match M::view_value(value) {
        ValueView::Num(_) => true,
        ValueView::Invoke(function, _) => leads_with_number::<M>(function),
        _ => false,
    }
}
