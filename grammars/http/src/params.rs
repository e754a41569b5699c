//! Quality weights and `;name=value` parameter lists.

use core::fmt;

use pullkit_core::{Diagnostic, Input, Parsed, Parser, resume};

use crate::error::HttpError;
use crate::grammar::{QuotedParser, TokenParser, expect, skip_space, write_token, write_word};

/// A `q` weight in thousandths, `0..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weight(u16);

impl Weight {
    pub const MAX: Weight = Weight(1000);

    pub fn new(value: f32) -> Result<Self, HttpError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(HttpError::InvalidWeight(value));
        }
        Ok(Weight((value * 1000.0).round() as u16))
    }

    pub fn from_thousandths(value: u16) -> Option<Self> {
        (value <= 1000).then_some(Weight(value))
    }

    pub fn thousandths(self) -> u16 {
        self.0
    }

    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 1000.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Weight::MAX
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => f.write_str("1"),
            0 => f.write_str("0"),
            value => {
                let digits = format!("{:03}", value);
                write!(f, "0.{}", digits.trim_end_matches('0'))
            }
        }
    }
}

/// Reads a qvalue: `0`, `1`, or either with up to three decimals.
#[derive(Debug, Clone, Copy)]
pub(crate) enum WeightParser {
    Unit,
    Point(u16),
    Decimals { value: u16, scale: u16 },
}

impl WeightParser {
    pub(crate) fn new() -> Self {
        WeightParser::Unit
    }
}

impl Parser for WeightParser {
    type Value = Weight;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Weight> {
        let mut state = self;
        loop {
            let head = input.head();
            if head.is_none() && input.is_empty() {
                return Parsed::Cont(state);
            }
            state = match (state, head) {
                (WeightParser::Unit, Some(c @ ('0' | '1'))) => {
                    input.step();
                    WeightParser::Point(if c == '1' { 1000 } else { 0 })
                }
                (WeightParser::Unit, _) => return Parsed::Error(Diagnostic::expected("weight", input)),
                (WeightParser::Point(value), Some('.')) => {
                    input.step();
                    WeightParser::Decimals { value, scale: 100 }
                }
                (WeightParser::Point(value), _) => return Parsed::Done(Weight(value)),
                (WeightParser::Decimals { value, scale }, Some(c @ '0'..='9')) if scale > 0 => {
                    let digit = u16::from(c as u8 - b'0');
                    if value == 1000 && digit != 0 {
                        return Parsed::Error(Diagnostic::message("weight above 1", input));
                    }
                    input.step();
                    WeightParser::Decimals {
                        value: value + digit * scale,
                        scale: scale / 10,
                    }
                }
                (WeightParser::Decimals { value, .. }, _) => return Parsed::Done(Weight(value)),
            };
        }
    }
}

/// Parameters following a header value element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    /// Name and value pairs in order. Names keep their case.
    pub list: Vec<(String, String)>,
    /// The `q` weight, for list elements that take one.
    pub weight: Option<Weight>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty() && self.weight.is_none()
    }

    /// The value of the first parameter named `name`, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.list.push((name.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Appends `;name=value` pairs and then `;q=weight`.
    pub(crate) fn render(&self, line: &mut String) -> Result<(), HttpError> {
        for (name, value) in &self.list {
            line.push_str("; ");
            write_token(line, name)?;
            if !value.is_empty() {
                line.push('=');
                write_word(line, value)?;
            }
        }
        if let Some(weight) = self.weight {
            line.push_str("; q=");
            line.push_str(&weight.to_string());
        }
        Ok(())
    }
}

/// How a parameter list treats `q` and missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParamMode {
    Plain,
    /// `q` is read as a weight.
    Weighted,
    /// Values are optional, as in chunk extensions.
    Extension,
}

enum State {
    Start,
    NameStart,
    Name(TokenParser),
    Equals(String),
    Open(String),
    Token(String, TokenParser),
    Quoted(String, QuotedParser),
    Weight(WeightParser),
}

/// Reads `*( OWS ";" OWS name "=" value )`.
///
/// Stops before the first code point after optional whitespace that is not
/// a `;`, having consumed that whitespace.
pub(crate) struct ParamsParser {
    params: Params,
    mode: ParamMode,
    state: State,
}

impl ParamsParser {
    pub(crate) fn new(mode: ParamMode) -> Self {
        Self {
            params: Params::new(),
            mode,
            state: State::Start,
        }
    }
}

impl Parser for ParamsParser {
    type Value = Params;

    fn feed<I: Input + ?Sized>(self, input: &mut I) -> Parsed<Self, Params> {
        let ParamsParser {
            mut params,
            mode,
            mut state,
        } = self;
        loop {
            state = match state {
                State::Start => {
                    if !skip_space(input) {
                        return Parsed::Cont(ParamsParser {
                            params,
                            mode,
                            state: State::Start,
                        });
                    }
                    if input.head() != Some(';') {
                        return Parsed::Done(params);
                    }
                    input.step();
                    State::NameStart
                }
                State::NameStart => {
                    if !skip_space(input) {
                        return Parsed::Cont(ParamsParser {
                            params,
                            mode,
                            state: State::NameStart,
                        });
                    }
                    State::Name(TokenParser::new())
                }
                State::Name(parser) => {
                    let name = resume!(parser.feed(input), |parser| ParamsParser {
                        params,
                        mode,
                        state: State::Name(parser),
                    });
                    State::Equals(name)
                }
                State::Equals(name) => {
                    if mode == ParamMode::Extension {
                        if !skip_space(input) {
                            return Parsed::Cont(ParamsParser {
                                params,
                                mode,
                                state: State::Equals(name),
                            });
                        }
                        if input.head() != Some('=') {
                            params.list.push((name, String::new()));
                            State::Start
                        } else {
                            input.step();
                            State::Open(name)
                        }
                    } else {
                        match expect('=', input) {
                            None => {
                                return Parsed::Cont(ParamsParser {
                                    params,
                                    mode,
                                    state: State::Equals(name),
                                });
                            }
                            Some(Err(error)) => return Parsed::Error(error),
                            Some(Ok(()))
                                if mode == ParamMode::Weighted && name.eq_ignore_ascii_case("q") =>
                            {
                                State::Weight(WeightParser::new())
                            }
                            Some(Ok(())) => State::Open(name),
                        }
                    }
                }
                State::Open(name) => {
                    if mode == ParamMode::Extension && !skip_space(input) {
                        return Parsed::Cont(ParamsParser {
                            params,
                            mode,
                            state: State::Open(name),
                        });
                    }
                    match input.head() {
                        Some('"') => State::Quoted(name, QuotedParser::new()),
                        Some(_) => State::Token(name, TokenParser::new()),
                        None if input.is_empty() => {
                            return Parsed::Cont(ParamsParser {
                                params,
                                mode,
                                state: State::Open(name),
                            });
                        }
                        None => return Parsed::Error(Diagnostic::expected("parameter value", input)),
                    }
                }
                State::Token(name, parser) => {
                    let value = resume!(parser.feed(input), |parser| ParamsParser {
                        params,
                        mode,
                        state: State::Token(name, parser),
                    });
                    params.list.push((name, value));
                    State::Start
                }
                State::Quoted(name, parser) => {
                    let value = resume!(parser.feed(input), |parser| ParamsParser {
                        params,
                        mode,
                        state: State::Quoted(name, parser),
                    });
                    params.list.push((name, value));
                    State::Start
                }
                State::Weight(parser) => {
                    let weight = resume!(parser.feed(input), |parser| ParamsParser {
                        params,
                        mode,
                        state: State::Weight(parser),
                    });
                    params.weight = Some(weight);
                    State::Start
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pullkit_core::{Incremental, parse_all};

    #[test_case::test_case("1", 1000; "one")]
    #[test_case::test_case("0", 0; "zero")]
    #[test_case::test_case("0.5", 500; "half")]
    #[test_case::test_case("0.125", 125; "three decimals")]
    #[test_case::test_case("1.000", 1000; "padded one")]
    #[test_case::test_case("0.", 0; "bare point")]
    fn test_weight(text: &str, thousandths: u16) {
        assert_eq!(parse_all(WeightParser::new(), text).unwrap().thousandths(), thousandths);
    }

    #[test_case::test_case("1.5"; "above one")]
    #[test_case::test_case("2"; "two")]
    #[test_case::test_case("0.1234"; "four decimals")]
    fn test_bad_weight(text: &str) {
        assert!(parse_all(WeightParser::new(), text).is_err());
    }

    #[test_case::test_case(1000, "1"; "one")]
    #[test_case::test_case(0, "0"; "zero")]
    #[test_case::test_case(500, "0.5"; "half")]
    #[test_case::test_case(25, "0.025"; "small")]
    fn test_weight_display(thousandths: u16, text: &str) {
        assert_eq!(Weight::from_thousandths(thousandths).unwrap().to_string(), text);
    }

    #[test]
    fn test_weight_new() {
        assert_eq!(Weight::new(0.8).unwrap().thousandths(), 800);
        assert!(matches!(Weight::new(1.5), Err(HttpError::InvalidWeight(_))));
        assert_eq!(Weight::from_thousandths(1001), None);
    }

    #[test]
    fn test_params() {
        let params = parse_all(
            ParamsParser::new(ParamMode::Weighted),
            r#" ; charset=utf-8 ;title="a b";q=0.7"#,
        )
        .unwrap();
        assert_eq!(params.get("Charset"), Some("utf-8"));
        assert_eq!(params.get("title"), Some("a b"));
        assert_eq!(params.weight, Weight::from_thousandths(700));
    }

    #[test]
    fn test_q_is_plain_without_weights() {
        let params = parse_all(ParamsParser::new(ParamMode::Plain), ";q=x").unwrap();
        assert_eq!(params.get("q"), Some("x"));
        assert_eq!(params.weight, None);
    }

    #[test]
    fn test_extension_without_value() {
        let params = parse_all(ParamsParser::new(ParamMode::Extension), ";last ; name = v").unwrap();
        assert_eq!(params.list, vec![("last".to_owned(), String::new()), ("name".to_owned(), "v".to_owned())]);
    }

    #[test]
    fn test_params_split_across_chunks() {
        let mut parse = Incremental::new(ParamsParser::new(ParamMode::Weighted));
        for chunk in [";", " cha", "rset=\"ut", "f-8\"; q", "=0.", "3"] {
            parse.feed(chunk).unwrap();
        }
        let params = parse.finish().unwrap();
        assert_eq!(params.get("charset"), Some("utf-8"));
        assert_eq!(params.weight, Weight::from_thousandths(300));
    }

    #[test]
    fn test_render() {
        let mut line = String::from("text/plain");
        let params = Params::new()
            .with("charset", "utf-8")
            .with("title", "a b")
            .with_weight(Weight::from_thousandths(500).unwrap());
        params.render(&mut line).unwrap();
        assert_eq!(line, r#"text/plain; charset=utf-8; title="a b"; q=0.5"#);
    }
}
