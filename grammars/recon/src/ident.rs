//! Identifiers.
//!
//! The classification follows XML names: letters and `_` start an
//! identifier; digits, `-`, combining marks and a few punctuation code
//! points may continue one.

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

pub fn is_ident_start_char(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c)
        || matches!(c,
            '-'
            | '0'..='9'
            | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

/// Whether `text` reads back as a single identifier.
pub fn is_ident(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start_char) && chars.all(is_ident_char)
}

/// Reads one identifier into a `String`.
#[derive(Debug, Clone, Default)]
pub struct IdentParser {
    text: String,
}

impl IdentParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for IdentParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            match input.head() {
                Some(c) if self.text.is_empty() && !is_ident_start_char(c) => {
                    return Parsed::Error(Diagnostic::expected("identifier", input));
                }
                Some(c) if is_ident_char(c) => {
                    input.step();
                    self.text.push(c);
                }
                None if input.is_empty() => return Parsed::Cont(self),
                None if input.is_error() => return Parsed::Error(Diagnostic::unexpected(input)),
                _ if self.text.is_empty() => {
                    return Parsed::Error(Diagnostic::expected("identifier", input));
                }
                _ => return Parsed::Done(self.text),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{StrInput, parse_all};

    #[test_case::test_case("a", true; "letter")]
    #[test_case::test_case("snake_case-and-dash", true; "continuation chars")]
    #[test_case::test_case("日本", true; "wide letters")]
    #[test_case::test_case("9lives", false; "digit start")]
    #[test_case::test_case("", false; "empty")]
    #[test_case::test_case("a b", false; "space")]
    fn test_is_ident(text: &str, expected: bool) {
        assert_eq!(is_ident(text), expected);
    }

    #[test]
    fn test_ident_stops_at_operator() {
        let mut input = StrInput::new("foo+1");
        assert!(matches!(IdentParser::new().feed(&mut input), Parsed::Done(ref s) if s == "foo"));
        assert_eq!(input.head(), Some('+'));
    }

    #[test]
    fn test_ident_requires_start_char() {
        assert!(parse_all(IdentParser::new(), "-a").is_err());
    }
}
