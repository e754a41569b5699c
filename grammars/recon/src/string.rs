//! Quoted strings.

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Open,
    Body(char),
    Escape(char),
}

/// Reads a `"..."` or `'...'` string, resolving backslash escapes.
#[derive(Debug, Clone)]
pub struct StringParser {
    text: String,
    stage: Stage,
}

impl StringParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            stage: Stage::Open,
        }
    }
}

impl Default for StringParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The character a `\c` escape in a quoted string stands for.
pub(crate) fn unescape(c: char) -> Option<char> {
    match c {
        'b' => Some('\u{8}'),
        'f' => Some('\u{C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '"' | '\'' | '\\' | '/' => Some(c),
        _ => None,
    }
}

/// The escape sequence a quoted string writer emits for `c`, if any.
pub(crate) fn escape(c: char) -> Option<&'static str> {
    match c {
        '"' => Some("\\\""),
        '\\' => Some("\\\\"),
        '\u{8}' => Some("\\b"),
        '\u{C}' => Some("\\f"),
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\t' => Some("\\t"),
        _ => None,
    }
}

impl Parser for StringParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            let Some(c) = input.head() else {
                if input.is_empty() {
                    return Parsed::Cont(self);
                }
                return Parsed::Error(match self.stage {
                    Stage::Open => Diagnostic::expected("string", input),
                    Stage::Body(quote) => Diagnostic::expected_char(quote, input),
                    Stage::Escape(_) => Diagnostic::expected("escape character", input),
                });
            };
            self.stage = match self.stage {
                Stage::Open if c == '"' || c == '\'' => Stage::Body(c),
                Stage::Open => return Parsed::Error(Diagnostic::expected("string", input)),
                Stage::Body(quote) if c == quote => {
                    input.step();
                    return Parsed::Done(self.text);
                }
                Stage::Body(quote) if c == '\\' => Stage::Escape(quote),
                Stage::Body(quote) => {
                    self.text.push(c);
                    Stage::Body(quote)
                }
                Stage::Escape(quote) => match unescape(c) {
                    Some(c) => {
                        self.text.push(c);
                        Stage::Body(quote)
                    }
                    None => return Parsed::Error(Diagnostic::expected("escape character", input)),
                },
            };
            input.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::parse_all;

    #[test_case::test_case(r#""hello""#, "hello"; "double quoted")]
    #[test_case::test_case("'it'", "it"; "single quoted")]
    #[test_case::test_case(r#""a\"b\\c\/d""#, "a\"b\\c/d"; "quote escapes")]
    #[test_case::test_case(r#""\b\f\n\r\t""#, "\u{8}\u{c}\n\r\t"; "control escapes")]
    #[test_case::test_case(r#"'say "hi"'"#, "say \"hi\""; "other quote is literal")]
    fn test_string(text: &str, expected: &str) {
        assert_eq!(parse_all(StringParser::new(), text).unwrap(), expected);
    }

    #[test]
    fn test_unterminated_string() {
        let error = parse_all(StringParser::new(), "\"abc").unwrap_err();
        assert_eq!(error.to_string(), "expected '\"' but found end of input at 1:5");
    }

    #[test]
    fn test_unknown_escape() {
        assert!(parse_all(StringParser::new(), r#""\q""#).is_err());
    }
}
