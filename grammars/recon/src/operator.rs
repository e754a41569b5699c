//! Operator tokens between operands.

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

use crate::model::InfixOp;

/// An operator read after an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Question,
    Colon,
    Infix(InfixOp),
}

/// Skips spaces, then reads the longest operator at the cursor.
///
/// Yields `None` without consuming anything but spaces when the next code
/// point does not start an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperatorScanner {
    Spaces,
    After(char),
}

impl OperatorScanner {
    pub(crate) fn new() -> Self {
        OperatorScanner::Spaces
    }
}

fn single(c: char) -> Option<Token> {
    Some(match c {
        '?' => Token::Question,
        ':' => Token::Colon,
        '^' => Token::Infix(InfixOp::BitXor),
        '+' => Token::Infix(InfixOp::Plus),
        '-' => Token::Infix(InfixOp::Minus),
        '*' => Token::Infix(InfixOp::Times),
        '/' => Token::Infix(InfixOp::Divide),
        '%' => Token::Infix(InfixOp::Modulo),
        _ => return None,
    })
}

fn pair(first: char, second: char) -> Option<InfixOp> {
    match (first, second) {
        ('|', '|') => Some(InfixOp::Or),
        ('&', '&') => Some(InfixOp::And),
        ('<', '=') => Some(InfixOp::Le),
        ('>', '=') => Some(InfixOp::Ge),
        ('=', '=') => Some(InfixOp::Eq),
        ('!', '=') => Some(InfixOp::Ne),
        _ => None,
    }
}

impl Parser for OperatorScanner {
    type Value = Option<Token>;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Option<Token>> {
        let mut state = self;
        loop {
            state = match state {
                OperatorScanner::Spaces => match input.head() {
                    Some(' ' | '\t') => {
                        input.step();
                        OperatorScanner::Spaces
                    }
                    Some(c @ ('|' | '&' | '<' | '>' | '=' | '!')) => {
                        input.step();
                        OperatorScanner::After(c)
                    }
                    Some(c) => {
                        let token = single(c);
                        if token.is_some() {
                            input.step();
                        }
                        return Parsed::Done(token);
                    }
                    None if input.is_empty() => return Parsed::Cont(OperatorScanner::Spaces),
                    None if input.is_error() => return Parsed::Error(Diagnostic::unexpected(input)),
                    None => return Parsed::Done(None),
                },
                OperatorScanner::After(first) => {
                    if let Some(op) = input.head().and_then(|second| pair(first, second)) {
                        input.step();
                        return Parsed::Done(Some(Token::Infix(op)));
                    }
                    if input.is_empty() {
                        return Parsed::Cont(OperatorScanner::After(first));
                    }
                    return match first {
                        '|' => Parsed::Done(Some(Token::Infix(InfixOp::BitOr))),
                        '&' => Parsed::Done(Some(Token::Infix(InfixOp::BitAnd))),
                        '<' => Parsed::Done(Some(Token::Infix(InfixOp::Lt))),
                        '>' => Parsed::Done(Some(Token::Infix(InfixOp::Gt))),
                        _ => Parsed::Error(Diagnostic::expected_char('=', input)),
                    };
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{StrInput, parse_all};

    #[test_case::test_case(" + ", Some(Token::Infix(InfixOp::Plus)); "plus with spaces")]
    #[test_case::test_case("&&", Some(Token::Infix(InfixOp::And)); "and")]
    #[test_case::test_case("&", Some(Token::Infix(InfixOp::BitAnd)); "bit and at end")]
    #[test_case::test_case("<=", Some(Token::Infix(InfixOp::Le)); "less or equal")]
    #[test_case::test_case("!=", Some(Token::Infix(InfixOp::Ne)); "not equal")]
    #[test_case::test_case("?", Some(Token::Question); "question")]
    #[test_case::test_case("", None; "nothing")]
    fn test_scan(text: &str, expected: Option<Token>) {
        let mut input = StrInput::new(text);
        assert_eq!(OperatorScanner::new().feed(&mut input), Parsed::Done(expected));
    }

    #[test]
    fn test_scan_leaves_non_operator() {
        let mut input = StrInput::new("  ,");
        assert_eq!(OperatorScanner::new().feed(&mut input), Parsed::Done(None));
        assert_eq!(input.head(), Some(','));
    }

    #[test]
    fn test_pair_split_across_chunks() {
        let mut first = StrInput::new("|").partial(true);
        let state = OperatorScanner::new().feed(&mut first);
        assert!(state.is_cont());
        let mut second = StrInput::new("|x");
        assert_eq!(state.feed(&mut second), Parsed::Done(Some(Token::Infix(InfixOp::Or))));
    }

    #[test]
    fn test_lone_equals() {
        assert!(parse_all(OperatorScanner::new(), "=a").is_err());
    }
}
