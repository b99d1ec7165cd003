use crate::core::value::Value;

/// Reads a value as an integer wide enough for every signed and unsigned
/// 64-bit key.
///
/// Integers of any width are accepted as-is, floats are truncated toward
/// zero and text (or UTF-8 bytes) is parsed after trimming whitespace.
/// Returns `None` for NULL, unparsable text and every other type; callers
/// decide what a missing integer means for them.
pub fn coerce_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(i128::from(*v)),
        Value::Uint(v) => Some(i128::from(*v)),
        Value::Float(v) => float_to_integer(*v),
        Value::Float32(v) => float_to_integer(f64::from(*v)),
        Value::String(_) | Value::Bytes(_) => value.as_str().and_then(parse_integer),
        Value::Date(_) | Value::Timestamp(_) | Value::Null => None,
    }
}

/// Same as [`coerce_integer`], falling back to zero.
pub fn coerce_integer_or_zero(value: &Value) -> i128 {
    coerce_integer(value).unwrap_or(0)
}

fn float_to_integer(v: f64) -> Option<i128> {
    if v.is_finite() {
        // `as` saturates on overflow and truncates toward zero
        Some(v.trunc() as i128)
    } else {
        None
    }
}

fn parse_integer(s: &str) -> Option<i128> {
    s.trim().parse::<i128>().ok()
}
