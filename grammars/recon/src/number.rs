//! Numeric literals.

use core::fmt;

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

/// A Recon number, stored in the narrowest representation that holds it
/// exactly.
///
/// Equality is numeric: `Num::I32(1) == Num::I64(1)` and
/// `Num::F32(0.5) == Num::F64(0.5)`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Num {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Integers beyond `i64`, kept as their decimal digits.
    BigInt(String),
}

impl Num {
    /// Narrows decimal integer text to `i32`, then `i64`, then a big integer.
    pub fn from_integer(text: &str) -> Self {
        if let Ok(value) = text.parse::<i32>() {
            Num::I32(value)
        } else if let Ok(value) = text.parse::<i64>() {
            Num::I64(value)
        } else {
            Num::BigInt(normalize_big(text))
        }
    }

    /// Narrows to `f32` when the value survives the round trip unchanged.
    pub fn from_float(value: f64) -> Self {
        let narrow = value as f32;
        if f64::from(narrow) == value {
            Num::F32(narrow)
        } else {
            Num::F64(value)
        }
    }

    fn from_unsigned(value: u128, negative: bool) -> Self {
        let signed = if negative {
            0i128.checked_sub_unsigned(value)
        } else {
            i128::try_from(value).ok()
        };
        match signed {
            Some(value) => match (i32::try_from(value), i64::try_from(value)) {
                (Ok(value), _) => Num::I32(value),
                (_, Ok(value)) => Num::I64(value),
                _ => Num::BigInt(value.to_string()),
            },
            None if negative => Num::BigInt(format!("-{}", value)),
            None => Num::BigInt(value.to_string()),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Num::I32(_) | Num::I64(_) | Num::BigInt(_))
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Num::I32(value) => f64::from(*value),
            Num::I64(value) => *value as f64,
            Num::F32(value) => f64::from(*value),
            Num::F64(value) => *value,
            Num::BigInt(digits) => digits.parse().unwrap_or(f64::NAN),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Num::I32(value) => Some(i64::from(*value)),
            Num::I64(value) => Some(*value),
            _ => None,
        }
    }
}

fn normalize_big(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text),
    };
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_owned()
    } else {
        format!("{}{}", sign, digits)
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Num::BigInt(a), Num::BigInt(b)) => a == b,
            (Num::BigInt(_), _) | (_, Num::BigInt(_)) => false,
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => self.as_f64() == other.as_f64(),
            },
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::I32(value) => write!(f, "{}", value),
            Num::I64(value) => write!(f, "{}", value),
            // widened so that reading the digits back narrows to the same f32
            Num::F32(value) => write!(f, "{:?}", f64::from(*value)),
            Num::F64(value) => write!(f, "{:?}", value),
            Num::BigInt(digits) => f.write_str(digits),
        }
    }
}

impl From<i32> for Num {
    fn from(value: i32) -> Self {
        Num::I32(value)
    }
}

impl From<i64> for Num {
    fn from(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(value) => Num::I32(value),
            Err(_) => Num::I64(value),
        }
    }
}

impl From<f64> for Num {
    fn from(value: f64) -> Self {
        Num::from_float(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Sign,
    Leading,
    Zero,
    Integral,
    FractionStart,
    Fraction,
    ExponentSign,
    ExponentStart,
    Exponent,
    HexStart,
    Hex,
}

/// Reads `-?digits(.digits)?([eE][+-]?digits)?` or `-?0x` hex digits.
#[derive(Debug, Clone)]
pub struct NumberParser {
    text: String,
    stage: Stage,
}

impl NumberParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            stage: Stage::Sign,
        }
    }

    /// Resumes after a `-` that a caller already consumed.
    pub fn negative() -> Self {
        Self {
            text: String::from("-"),
            stage: Stage::Leading,
        }
    }

    fn finish<I: Input + ?Sized>(self, input: &I) -> Parsed<Self, Num> {
        match self.stage {
            Stage::Zero | Stage::Integral => Parsed::Done(Num::from_integer(&self.text)),
            Stage::Fraction | Stage::Exponent => match self.text.parse::<f64>() {
                Ok(value) => Parsed::Done(Num::from_float(value)),
                Err(_) => Parsed::Error(Diagnostic::message("malformed number", input)),
            },
            Stage::Hex => {
                let (negative, digits) = match self.text.strip_prefix('-') {
                    Some(digits) => (true, digits),
                    None => (false, self.text.as_str()),
                };
                match u128::from_str_radix(digits, 16) {
                    Ok(value) => Parsed::Done(Num::from_unsigned(value, negative)),
                    Err(_) => Parsed::Error(Diagnostic::message("hex literal too large", input)),
                }
            }
            Stage::HexStart => Parsed::Error(Diagnostic::expected("hex digit", input)),
            _ => Parsed::Error(Diagnostic::expected("digit", input)),
        }
    }
}

impl Default for NumberParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for NumberParser {
    type Value = Num;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, Num> {
        loop {
            let Some(c) = input.head() else {
                if input.is_empty() {
                    return Parsed::Cont(self);
                }
                if input.is_error() {
                    return Parsed::Error(Diagnostic::unexpected(input));
                }
                return self.finish(input);
            };
            let next = match (self.stage, c) {
                (Stage::Sign, '-') => Stage::Leading,
                (Stage::Sign | Stage::Leading, '0') => Stage::Zero,
                (Stage::Sign | Stage::Leading, '1'..='9') => Stage::Integral,
                (Stage::Sign | Stage::Leading, _) => {
                    return Parsed::Error(Diagnostic::expected("digit", input));
                }
                (Stage::Zero, 'x') => {
                    input.step();
                    self.stage = Stage::HexStart;
                    continue;
                }
                (Stage::Zero | Stage::Integral, '0'..='9') => Stage::Integral,
                (Stage::Zero | Stage::Integral, '.') => Stage::FractionStart,
                (Stage::Zero | Stage::Integral | Stage::Fraction, 'e' | 'E') => Stage::ExponentSign,
                (Stage::FractionStart | Stage::Fraction, '0'..='9') => Stage::Fraction,
                (Stage::ExponentSign, '+' | '-') => Stage::ExponentStart,
                (Stage::ExponentSign | Stage::ExponentStart | Stage::Exponent, '0'..='9') => {
                    Stage::Exponent
                }
                (Stage::FractionStart | Stage::ExponentSign | Stage::ExponentStart, _) => {
                    return Parsed::Error(Diagnostic::expected("digit", input));
                }
                (Stage::HexStart | Stage::Hex, c) if c.is_ascii_hexdigit() => Stage::Hex,
                (Stage::HexStart, _) => {
                    return Parsed::Error(Diagnostic::expected("hex digit", input));
                }
                _ => return self.finish(input),
            };
            input.step();
            self.text.push(c);
            self.stage = next;
        }
    }
}
