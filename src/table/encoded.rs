//! Parsing and encoding of list cells stored as bracketed text, e.g. `[20.5, 21.0]` or
//! `['Hotel Oasis', 'Le Petit Pont']`.
//!
//! This is how dataframe tools write a list that ends up in a CSV column. Only flat
//! lists of numbers and quoted strings are accepted; anything else is a [`ParseError`].

use std::fmt;
use thiserror::Error;

/// A single element of a parsed list cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ListValue {
    Number(f64),
    Text(String),
}

impl ListValue {
    /// Numeric view of the value. Text is trimmed and a decimal comma is accepted
    /// (`"8,5"` becomes `8.5`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ListValue::Number(n) => Some(*n),
            ListValue::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ListValue::Number(n) => n.to_string(),
            ListValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected '{expected}' at position {position}, found '{found}'")]
    Expected {
        expected: char,
        found: char,
        position: usize,
    },

    #[error("Unexpected '{found}' at position {position}")]
    UnexpectedToken { found: char, position: usize },

    #[error("Unexpected end of input at position {0}")]
    UnexpectedEnd(usize),

    #[error("Unterminated string starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid number '{text}' at position {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("Unexpected input after closing bracket at position {0}")]
    TrailingInput(usize),
}

/// The textual form of a list cell as it is persisted in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct EncodedList(String);

impl EncodedList {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<Vec<ListValue>, ParseError> {
        parse_list(&self.0)
    }

    pub fn from_floats(values: &[f64]) -> Self {
        Self::join(values.iter().map(|v| format!("{v:?}")))
    }

    pub fn from_integers(values: &[i64]) -> Self {
        Self::join(values.iter().map(|v| v.to_string()))
    }

    pub fn from_texts<S: AsRef<str>>(values: &[S]) -> Self {
        Self::join(values.iter().map(|v| quote(v.as_ref())))
    }

    fn join(items: impl Iterator<Item = String>) -> Self {
        Self(format!("[{}]", items.collect::<Vec<_>>().join(", ")))
    }
}

impl fmt::Display for EncodedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EncodedList {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for EncodedList {
    fn from(text: String) -> Self {
        Self(text)
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Parses a bracketed list such as `[1, 2.5, 'a']`.
///
/// A trailing comma before the closing bracket is allowed, nested lists are not.
pub fn parse_list(text: &str) -> Result<Vec<ListValue>, ParseError> {
    let mut cursor = Cursor { text, pos: 0 };
    let mut values = Vec::new();

    cursor.skip_whitespace();
    cursor.expect('[')?;
    cursor.skip_whitespace();

    if !cursor.eat(']') {
        loop {
            values.push(cursor.value()?);
            cursor.skip_whitespace();
            let position = cursor.pos;
            match cursor.bump() {
                Some(',') => {
                    cursor.skip_whitespace();
                    if cursor.eat(']') {
                        break;
                    }
                }
                Some(']') => break,
                Some(found) => {
                    return Err(ParseError::Expected {
                        expected: ']',
                        found,
                        position,
                    })
                }
                None => return Err(ParseError::UnexpectedEnd(position)),
            }
        }
    }

    cursor.skip_whitespace();
    if cursor.pos < text.len() {
        return Err(ParseError::TrailingInput(cursor.pos));
    }
    Ok(values)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        let position = self.pos;
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(found) => Err(ParseError::Expected {
                expected,
                found,
                position,
            }),
            None => Err(ParseError::UnexpectedEnd(position)),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn value(&mut self) -> Result<ListValue, ParseError> {
        match self.peek() {
            Some('\'' | '"') => self.string().map(ListValue::Text),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                position: self.pos,
            }),
            None => Err(ParseError::UnexpectedEnd(self.pos)),
        }
    }

    fn number(&mut self) -> Result<ListValue, ParseError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.bump();
        }
        let text = &self.text[start..self.pos];
        text.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ListValue::Number)
            .ok_or_else(|| ParseError::InvalidNumber {
                text: text.to_string(),
                position: start,
            })
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let quote = self.bump().ok_or(ParseError::UnexpectedEnd(start))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    None => return Err(ParseError::UnterminatedString(start)),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    // Unknown escapes are kept verbatim.
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }
}
