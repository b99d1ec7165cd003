use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameter names understood by the pagination strategies.
pub mod names {
    pub const LIMIT: &str = "limit";
    pub const OFFSET: &str = "offset";
    pub const MAX_OFFSET: &str = "max_offset";
    pub const ID: &str = "id";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const STEP: &str = "step";
}

/// A named strategy parameter as it comes out of configuration.
///
/// Range bounds may be written as numbers or as timestamp strings, so
/// both shapes are kept until the strategy decides how to read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}
