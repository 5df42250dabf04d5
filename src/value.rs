// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Literal values of Tengo map entries.
//!
//! Tengo map entries hold one of four kinds of literal: booleans, integers,
//! floats, or strings. This module parses those literals out of existing
//! script text, renders them back into Tengo syntax, and decides whether two
//! values mean the same thing.
//!
//! # Semantic Equality
//!
//! Numbers compare by numeric value regardless of how they were written, so
//! `10` and `10.0` are the same value. Every other kind only equals a value of
//! the same kind with the same contents. This keeps map updates from
//! rewriting entries whose literal spelling differs but whose meaning does not.

use std::fmt::{Display, Error as FmtError, Formatter, Result as FmtResult};

/// Literal value of a map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Parse an existing literal from Tengo source text.
    ///
    /// Booleans are matched case-insensitively. Quoted text is decoded as a
    /// JSON string, falling back to stripping the surrounding quotes when the
    /// escapes are malformed. Anything else is tried as an integer, then as a
    /// float, and finally kept verbatim as a string.
    pub fn parse_literal(raw: &str) -> Self {
        let stripped = raw.trim();
        if let Some(flag) = parse_bool(stripped) {
            return Self::Bool(flag);
        }

        if is_quoted(stripped) {
            return Self::Str(unquote(stripped));
        }

        parse_number(stripped).unwrap_or_else(|| Self::Str(stripped.to_string()))
    }

    /// Check if two values mean the same thing.
    pub fn semantic_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs == rhs,
            _ => self == other,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(number) => Some(*number as f64),
            Self::Float(number) => Some(*number),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Bool(true) => fmt.write_str("true"),
            Self::Bool(false) => fmt.write_str("false"),
            Self::Int(number) => write!(fmt, "{number}"),
            // INVARIANT: Floats always keep a decimal point, e.g., "10.0".
            Self::Float(number) => write!(fmt, "{number:?}"),
            Self::Str(text) => {
                let quoted = serde_json::to_string(text).map_err(|_| FmtError)?;
                fmt.write_str(&escape_non_ascii(&quoted))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Int(number)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Float(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Str(text)
    }
}

/// Parse "true" or "false" in any letter case.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse an integer, or a float if the text is not a valid integer.
pub(crate) fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(number) = trimmed.parse::<i64>() {
        return Some(Value::Int(number));
    }

    trimmed.parse::<f64>().ok().map(Value::Float)
}

pub(crate) fn is_quoted(raw: &str) -> bool {
    raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"')
}

/// Escape every character outside printable ASCII as `\uXXXX`.
///
/// `"Café"` renders as `"Caf\u00e9"`. Characters beyond the basic
/// multilingual plane become surrogate pairs.
fn escape_non_ascii(quoted: &str) -> String {
    let mut escaped = String::with_capacity(quoted.len());
    for ch in quoted.chars() {
        if (' '..='~').contains(&ch) {
            escaped.push(ch);
            continue;
        }

        let mut units = [0; 2];
        for unit in ch.encode_utf16(&mut units) {
            escaped.push_str(&format!("\\u{unit:04x}"));
        }
    }

    escaped
}

/// Decode a quoted string literal.
///
/// Falls back to naive quote stripping if the literal is not valid JSON.
pub(crate) fn unquote(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim_matches('"').to_string())
}
