//! Structured cell literals.
//!
//! List and mapping cells in the inventory export are written as
//! Python-style literals: `['Basic', 'EX']`,
//! `{'standard': 'Legal', 'expanded': None}`, `[{'type': 'Fire', 'value': '×2'}]`.
//! This module parses that syntax into [`Value`]s and renders values back
//! into it, so a filtered inventory written to CSV can be read again.
//!
//! Supported grammar: single or double quoted strings with backslash
//! escapes, integers, floats, `True`/`False`/`None`, lists, tuples (read as
//! lists) and dicts with string keys. Trailing commas are accepted. Containers
//! nested deeper than [`MAX_NESTING`] are rejected.

use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;

use crate::data::{Value, format_number};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        depth: 0,
    };
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

pub fn write_literal(out: &mut String, value: &Value) {
    match value {
        Value::Missing => out.push_str("None"),
        Value::Boolean(true) => out.push_str("True"),
        Value::Boolean(false) => out.push_str("False"),
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::String(s) => write_quoted(out, s),
        Value::Date(_) => write_quoted(out, &value.as_display()),
        Value::List(items) => {
            out.push('[');
            out.push_str(&items.iter().map(Value::to_literal).join(", "));
            out.push(']');
        }
        Value::Mapping(entries) => {
            out.push('{');
            let mut first = true;
            for (key, val) in entries {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                write_quoted(out, key);
                out.push_str(": ");
                write_literal(out, val);
            }
            out.push('}');
        }
    }
}

fn write_quoted(out: &mut String, text: &str) {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

/// Deepest list/tuple/dict nesting accepted in one cell.
pub const MAX_NESTING: usize = 256;

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(self.error(format!("expected '{expected}', found '{ch}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    /// Runs `parse` one container level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, LiteralError>,
    ) -> Result<T, LiteralError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            Some('[') => {
                self.bump();
                let (items, _) = self.nested(|parser| parser.parse_sequence(']'))?;
                Ok(Value::List(items))
            }
            Some('(') => {
                self.bump();
                let (mut items, saw_comma) = self.nested(|parser| parser.parse_sequence(')'))?;
                // `(x)` is just a parenthesised value, `(x,)` is a tuple
                if items.len() == 1 && !saw_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::List(items))
                }
            }
            Some('{') => {
                self.bump();
                self.nested(Self::parse_mapping)
            }
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                self.parse_string(quote).map(Value::String)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_sequence(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, saw_comma));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    saw_comma = true;
                }
                Some(c) if c == close => {}
                _ => return Err(self.error(format!("expected ',' or '{close}'"))),
            }
        }
    }

    fn parse_mapping(&mut self) -> Result<Value, LiteralError> {
        let mut entries = IndexMap::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Mapping(entries));
            }
            let key_offset = self.pos;
            let key = match self.parse_value()? {
                Value::String(key) => key,
                other => {
                    return Err(LiteralError {
                        offset: key_offset,
                        message: format!("mapping keys must be strings, found {}", other.kind()),
                    });
                }
            };
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            entries.insert(key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, LiteralError> {
        let mut text = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(self.error("unterminated string"));
            };
            match ch {
                c if c == quote => return Ok(text),
                '\\' => self.parse_escape(&mut text)?,
                c => text.push(c),
            }
        }
    }

    fn parse_escape(&mut self, text: &mut String) -> Result<(), LiteralError> {
        let Some(ch) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        match ch {
            '\\' | '\'' | '"' => text.push(ch),
            'n' => text.push('\n'),
            'r' => text.push('\r'),
            't' => text.push('\t'),
            '0' => text.push('\0'),
            'x' => text.push(self.parse_code_point(2)?),
            'u' => text.push(self.parse_code_point(4)?),
            'U' => text.push(self.parse_code_point(8)?),
            '\n' => {}
            other => {
                // unknown escapes keep their backslash
                text.push('\\');
                text.push(other);
            }
        }
        Ok(())
    }

    fn parse_code_point(&mut self, digits: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => {}
                _ => return Err(self.error("invalid hexadecimal escape")),
            }
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("escape is not a valid code point"))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }
        let token = self.src[start..self.pos].replace('_', "");
        let parsed = if is_float {
            token.parse::<f64>().ok().map(Value::Number)
        } else {
            token.parse::<i64>().ok().map(Value::Integer)
        };
        parsed.ok_or_else(|| LiteralError {
            offset: start,
            message: format!("invalid number '{token}'"),
        })
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Boolean(true)),
            "False" => Ok(Value::Boolean(false)),
            "None" => Ok(Value::Missing),
            other => Err(LiteralError {
                offset: start,
                message: format!("unknown name '{other}'"),
            }),
        }
    }
}
