//! Token, quoted-string and comment primitives.
//!
//! Character classes follow RFC 7230 section 3.2.6. Octets arrive as
//! ISO-8859-1 code points, so `obs-text` is `U+0080..=U+00FF`.

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

use crate::error::HttpError;

pub fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
        )
}

pub fn is_token(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_tchar)
}

pub fn is_vchar(c: char) -> bool {
    ('\u{21}'..='\u{7e}').contains(&c)
}

pub fn is_obs_text(c: char) -> bool {
    ('\u{80}'..='\u{ff}').contains(&c)
}

/// Optional whitespace: SP or HTAB.
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_qdtext(c: char) -> bool {
    is_space(c) || (is_vchar(c) && c != '"' && c != '\\') || is_obs_text(c)
}

fn is_ctext(c: char) -> bool {
    is_space(c) || (is_vchar(c) && !matches!(c, '(' | ')' | '\\')) || is_obs_text(c)
}

/// Characters allowed after a backslash.
fn is_quotable(c: char) -> bool {
    is_space(c) || is_vchar(c) || is_obs_text(c)
}

/// Skips optional whitespace; `false` while more input is needed.
pub(crate) fn skip_space<I: Input + ?Sized>(input: &mut I) -> bool {
    while input.head().is_some_and(is_space) {
        input.step();
    }
    !input.is_empty()
}

/// Consumes `expected`; `None` while more input is needed.
pub(crate) fn expect<I: Input + ?Sized>(
    expected: char,
    input: &mut I,
) -> Option<Result<(), Diagnostic>> {
    match input.head() {
        Some(c) if c == expected => {
            input.step();
            Some(Ok(()))
        }
        None if input.is_empty() => None,
        _ => Some(Err(Diagnostic::expected_char(expected, input))),
    }
}

/// Reads a non-empty run of token characters.
#[derive(Debug, Clone, Default)]
pub struct TokenParser {
    text: String,
}

impl TokenParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for TokenParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            match input.head() {
                Some(c) if is_tchar(c) => {
                    input.step();
                    self.text.push(c);
                }
                None if input.is_empty() => return Parsed::Cont(self),
                _ if self.text.is_empty() => {
                    return Parsed::Error(Diagnostic::expected("token", input));
                }
                _ => return Parsed::Done(self.text),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoted {
    Open,
    Body,
    Escape,
}

/// Reads a `"..."` quoted string, resolving quoted pairs.
#[derive(Debug, Clone)]
pub struct QuotedParser {
    text: String,
    stage: Quoted,
}

impl QuotedParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            stage: Quoted::Open,
        }
    }
}

impl Default for QuotedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for QuotedParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            let Some(c) = input.head() else {
                if input.is_empty() {
                    return Parsed::Cont(self);
                }
                return Parsed::Error(match self.stage {
                    Quoted::Open | Quoted::Body => Diagnostic::expected_char('"', input),
                    Quoted::Escape => Diagnostic::expected("quoted character", input),
                });
            };
            self.stage = match self.stage {
                Quoted::Open if c == '"' => Quoted::Body,
                Quoted::Open => return Parsed::Error(Diagnostic::expected_char('"', input)),
                Quoted::Body if c == '"' => {
                    input.step();
                    return Parsed::Done(self.text);
                }
                Quoted::Body if c == '\\' => Quoted::Escape,
                Quoted::Body if is_qdtext(c) => {
                    self.text.push(c);
                    Quoted::Body
                }
                Quoted::Body => return Parsed::Error(Diagnostic::unexpected(input)),
                Quoted::Escape if is_quotable(c) => {
                    self.text.push(c);
                    Quoted::Body
                }
                Quoted::Escape => {
                    return Parsed::Error(Diagnostic::expected("quoted character", input));
                }
            };
            input.step();
        }
    }
}

/// Reads a parenthesised comment.
///
/// Nested comments are kept verbatim, parentheses included; quoted pairs
/// are resolved at every level.
#[derive(Debug, Clone)]
pub struct CommentParser {
    text: String,
    level: usize,
    escape: bool,
}

impl CommentParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            level: 0,
            escape: false,
        }
    }
}

impl Default for CommentParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for CommentParser {
    type Value = String;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, String> {
        loop {
            let Some(c) = input.head() else {
                if input.is_empty() {
                    return Parsed::Cont(self);
                }
                return Parsed::Error(Diagnostic::expected_char(')', input));
            };
            match c {
                _ if self.escape => {
                    if !is_quotable(c) {
                        return Parsed::Error(Diagnostic::expected("quoted character", input));
                    }
                    self.escape = false;
                    self.text.push(c);
                }
                '(' if self.level == 0 => self.level = 1,
                _ if self.level == 0 => {
                    return Parsed::Error(Diagnostic::expected_char('(', input));
                }
                '(' => {
                    self.level += 1;
                    self.text.push(c);
                }
                ')' if self.level == 1 => {
                    input.step();
                    return Parsed::Done(self.text);
                }
                ')' => {
                    self.level -= 1;
                    self.text.push(c);
                }
                '\\' => self.escape = true,
                _ if is_ctext(c) => self.text.push(c),
                _ => return Parsed::Error(Diagnostic::unexpected(input)),
            }
            input.step();
        }
    }
}

/// Appends `text`, which must be a token.
pub(crate) fn write_token(line: &mut String, text: &str) -> Result<(), HttpError> {
    if !is_token(text) {
        return Err(HttpError::InvalidToken(text.to_owned()));
    }
    line.push_str(text);
    Ok(())
}

/// Appends `text` as a token when it is one, else as a quoted string.
pub(crate) fn write_word(line: &mut String, text: &str) -> Result<(), HttpError> {
    if is_token(text) {
        line.push_str(text);
        return Ok(());
    }
    if !text.chars().all(is_quotable) {
        return Err(HttpError::InvalidQuoted(text.to_owned()));
    }
    line.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            line.push('\\');
        }
        line.push(c);
    }
    line.push('"');
    Ok(())
}

/// Appends `text` as a comment, escaping unbalanced parentheses.
pub(crate) fn write_comment(line: &mut String, text: &str) -> Result<(), HttpError> {
    if !text.chars().all(is_quotable) {
        return Err(HttpError::InvalidComment(text.to_owned()));
    }
    let mut depth = 0usize;
    let balanced = text.chars().all(|c| {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return false,
            ')' => depth -= 1,
            _ => {}
        }
        true
    }) && depth == 0;
    line.push('(');
    for c in text.chars() {
        if c == '\\' || (!balanced && (c == '(' || c == ')')) {
            line.push('\\');
        }
        line.push(c);
    }
    line.push(')');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{BytesInput, parse_all, parse_all_bytes};

    #[test_case::test_case("gzip", true; "plain")]
    #[test_case::test_case("x-custom_1.0~", true; "punctuation")]
    #[test_case::test_case("a b", false; "space")]
    #[test_case::test_case("a/b", false; "slash")]
    #[test_case::test_case("", false; "empty")]
    fn test_is_token(text: &str, expected: bool) {
        assert_eq!(is_token(text), expected);
    }

    #[test]
    fn test_token_stops_at_separator() {
        let mut input = BytesInput::new(b"text/html");
        assert!(matches!(TokenParser::new().feed(&mut input), Parsed::Done(ref t) if t == "text"));
        assert_eq!(input.head(), Some('/'));
    }

    #[test]
    fn test_empty_token() {
        let error = parse_all(TokenParser::new(), ";").unwrap_err();
        assert_eq!(error.to_string(), "expected token but found ';' at 1:1");
    }

    #[test_case::test_case(r#""abc""#, "abc"; "plain")]
    #[test_case::test_case(r#""a \"b\" \\c""#, r#"a "b" \c"#; "quoted pairs")]
    #[test_case::test_case(r#""""#, ""; "empty")]
    fn test_quoted(text: &str, expected: &str) {
        assert_eq!(parse_all(QuotedParser::new(), text).unwrap(), expected);
    }

    #[test]
    fn test_quoted_obs_text() {
        assert_eq!(parse_all_bytes(QuotedParser::new(), b"\"caf\xe9\"").unwrap(), "caf\u{e9}");
    }

    #[test]
    fn test_quoted_rejects_control() {
        assert!(parse_all(QuotedParser::new(), "\"a\u{1}\"").is_err());
        assert!(parse_all(QuotedParser::new(), "\"abc").is_err());
    }

    #[test_case::test_case("(linux)", "linux"; "plain")]
    #[test_case::test_case("(X11; (nested) x)", "X11; (nested) x"; "nested")]
    #[test_case::test_case(r"(a \) b)", "a ) b"; "escaped paren")]
    fn test_comment(text: &str, expected: &str) {
        assert_eq!(parse_all(CommentParser::new(), text).unwrap(), expected);
    }

    #[test]
    fn test_unclosed_nested_comment() {
        let error = parse_all(CommentParser::new(), "(a (b)").unwrap_err();
        assert_eq!(error.to_string(), "expected ')' but found end of input at 1:7");
    }

    #[test]
    fn test_write_word() {
        let mut line = String::new();
        write_word(&mut line, "utf-8").unwrap();
        line.push(' ');
        write_word(&mut line, "say \"hi\"").unwrap();
        assert_eq!(line, r#"utf-8 "say \"hi\"""#);
        assert!(matches!(write_word(&mut line, "a\nb"), Err(HttpError::InvalidQuoted(_))));
    }

    #[test]
    fn test_write_token_and_comment() {
        let mut line = String::new();
        assert!(matches!(write_token(&mut line, "a b"), Err(HttpError::InvalidToken(_))));
        write_comment(&mut line, "a (b) c").unwrap();
        write_comment(&mut line, "a ) b").unwrap();
        assert_eq!(line, r"(a (b) c)(a \) b)");
        assert!(matches!(write_comment(&mut line, "\u{7f}"), Err(HttpError::InvalidComment(_))));
    }
}
