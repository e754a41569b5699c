//! `%`-prefixed base-64 binary literals.

use pullkit_core::{Diagnostic, Input, Parsed, Parser};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn decode_digit(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '+' => Some(62),
        '/' => Some(63),
        _ => None,
    }
}

/// Base-64 text for `bytes`, padded with `=`.
pub fn encode(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let digits = [b0 >> 2, (b0 & 0x03) << 4 | b1 >> 4, (b1 & 0x0f) << 2 | b2 >> 6, b2 & 0x3f];
        for (i, digit) in digits.into_iter().enumerate() {
            if i <= chunk.len() {
                text.push(char::from(ALPHABET[usize::from(digit)]));
            } else {
                text.push('=');
            }
        }
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Percent,
    Digits,
    Padding,
}

/// Reads `%` followed by base-64 digits into bytes.
#[derive(Debug, Clone)]
pub struct DataParser {
    bytes: Vec<u8>,
    quantum: [u8; 4],
    len: usize,
    stage: Stage,
}

impl DataParser {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            quantum: [0; 4],
            len: 0,
            stage: Stage::Percent,
        }
    }

    fn flush(&mut self) {
        let [a, b, c, d] = self.quantum;
        let decoded = [a << 2 | b >> 4, b << 4 | c >> 2, c << 6 | d];
        let count = self.len.saturating_sub(1);
        self.bytes.extend_from_slice(&decoded[..count]);
        self.quantum = [0; 4];
        self.len = 0;
    }
}

impl Default for DataParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for DataParser {
    type Value = Vec<u8>;

    fn feed<I: Input + ?Sized>(mut self, input: &mut I) -> Parsed<Self, Vec<u8>> {
        loop {
            let head = input.head();
            if head.is_none() && input.is_empty() {
                return Parsed::Cont(self);
            }
            match (self.stage, head) {
                (Stage::Percent, Some('%')) => {
                    input.step();
                    self.stage = Stage::Digits;
                }
                (Stage::Percent, _) => return Parsed::Error(Diagnostic::expected_char('%', input)),
                (Stage::Digits, Some(c)) if decode_digit(c).is_some() => {
                    input.step();
                    self.quantum[self.len] = decode_digit(c).unwrap_or(0);
                    self.len += 1;
                    if self.len == 4 {
                        self.flush();
                    }
                }
                (Stage::Digits, Some('=')) if self.len == 2 => {
                    input.step();
                    self.stage = Stage::Padding;
                }
                (Stage::Digits, Some('=')) if self.len == 3 => {
                    input.step();
                    self.flush();
                    return Parsed::Done(self.bytes);
                }
                (Stage::Digits, _) if self.len == 0 && !input.is_error() => {
                    return Parsed::Done(self.bytes);
                }
                (Stage::Digits, _) => {
                    return Parsed::Error(Diagnostic::expected("base-64 digit", input));
                }
                (Stage::Padding, Some('=')) => {
                    input.step();
                    self.flush();
                    return Parsed::Done(self.bytes);
                }
                (Stage::Padding, _) => return Parsed::Error(Diagnostic::expected_char('=', input)),
            }
        }
    }
}
