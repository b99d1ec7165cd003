//! Renders scanned values as SQL text.
//!
//! Everything here is a pure function: no formatter fails, values of an
//! unexpected shape fall through to their quoted textual form.

use crate::query::dialect::{Dialect, MySql};
use model::{core::value::Value, records::statement::StatementMode};
use std::fmt::Write;

pub const NULL_KEYWORD: &str = "NULL";

/// Renders a single value as a SQL literal.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => NULL_KEYWORD.to_string(),
        Value::String(s) => quote_text(s),
        Value::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => quote_text(s),
            Err(_) => hex_literal(b),
        },
        Value::Int(v) => v.to_string(),
        Value::Uint(v) => v.to_string(),
        // MySQL has no literal for NaN or infinity
        Value::Float32(v) if !v.is_finite() => NULL_KEYWORD.to_string(),
        Value::Float(v) if !v.is_finite() => NULL_KEYWORD.to_string(),
        // `Display` for floats is the shortest text that parses back to
        // the same value and never switches to exponent notation
        Value::Float32(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        other => format!("'{other}'"),
    }
}

/// Renders all values of a row, comma separated.
pub fn format_row(values: &[Value]) -> String {
    values
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds `n` positional placeholders, e.g. `?, ?, ?`.
///
/// Callers must pass `n >= 1`; zero yields an empty string.
pub fn build_placeholders(n: usize) -> String {
    debug_assert!(n > 0, "placeholder list needs at least one column");
    (0..n)
        .map(|i| MySql.get_placeholder(i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The text that goes between the parentheses of one `VALUES` tuple.
pub fn insert_values(mode: StatementMode, values: &[Value]) -> String {
    match mode {
        StatementMode::Prepared => build_placeholders(values.len()),
        StatementMode::Raw => format_row(values),
    }
}

/// Quotes text, doubling single quotes and then backslashes.
fn quote_text(s: &str) -> String {
    let escaped = s.replace('\'', "''").replace('\\', "\\\\");
    format!("'{escaped}'")
}

/// Bytes that are not valid UTF-8 cannot be embedded in statement text,
/// so they are written as a hex literal instead.
fn hex_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out.push('\'');
    out
}
