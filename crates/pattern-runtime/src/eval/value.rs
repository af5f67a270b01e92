// Runtime literal value passed across the native function boundary

use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, EvalError};

use super::pattern::PatternNode;

/// Runtime value during evaluation.
/// Integers of every source width are widened to 128 bits.
#[derive(Debug, Clone)]
pub enum Value {
    Unsigned(u128),
    Signed(i128),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
    /// Reference to a pattern produced by the evaluator
    Pattern(Arc<PatternNode>),
}

impl Value {
    /// Name of the active variant, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Unsigned(_) => "unsigned integer",
            Value::Signed(_) => "signed integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Pattern(_) => "pattern",
        }
    }

    /// Convert to unsigned integer
    #[inline]
    pub fn to_unsigned(&self) -> Result<u128, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v),
            Value::Signed(v) => Ok(*v as u128),
            Value::Float(v) => Ok(*v as u128),
            Value::Bool(v) => Ok(u128::from(*v)),
            Value::Char(v) => Ok(*v as u128),
            Value::String(_) | Value::Pattern(_) => Err(self.type_error("integer")),
        }
    }

    /// Convert to signed integer
    #[inline]
    pub fn to_signed(&self) -> Result<i128, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v as i128),
            Value::Signed(v) => Ok(*v),
            Value::Float(v) => Ok(*v as i128),
            Value::Bool(v) => Ok(i128::from(*v)),
            Value::Char(v) => Ok(*v as i128),
            Value::String(_) | Value::Pattern(_) => Err(self.type_error("integer")),
        }
    }

    /// Convert to float
    pub fn to_float(&self) -> Result<f64, EvalError> {
        match self {
            Value::Unsigned(v) => Ok(*v as f64),
            Value::Signed(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::Bool(v) => Ok(if *v { 1.0 } else { 0.0 }),
            Value::Char(v) => Ok(*v as u32 as f64),
            Value::String(_) | Value::Pattern(_) => Err(self.type_error("float")),
        }
    }

    /// Convert to string representation.
    /// Patterns render their structured form.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Unsigned(v) => v.to_string(),
            Value::Signed(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Char(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Pattern(p) => p.to_display_string(),
        }
    }

    fn type_error(&self, expected: &'static str) -> EvalError {
        EvalError::new(ErrorKind::InvalidValueType {
            expected,
            found: self.kind_name(),
        })
    }
}

/// Encode a runtime string back into data bytes.
/// Strings decoded from data hold one char per byte (Latin-1); those map back
/// byte-for-byte. Anything wider is written as UTF-8.
pub fn string_to_bytes(s: &str) -> Vec<u8> {
    if s.chars().all(|c| (c as u32) <= 0xFF) {
        s.chars().map(|c| c as u32 as u8).collect()
    } else {
        s.as_bytes().to_vec()
    }
}

/// Decode data bytes into a runtime string, one char per byte
pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Value::Unsigned(v)
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Signed(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<PatternNode> for Value {
    fn from(v: PatternNode) -> Self {
        Value::Pattern(Arc::new(v))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unsigned(a), Value::Unsigned(b)) => a == b,
            (Value::Signed(a), Value::Signed(b)) => a == b,
            (Value::Unsigned(a), Value::Signed(b)) => (*a as i128) == *b,
            (Value::Signed(a), Value::Unsigned(b)) => *a == (*b as i128),
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => {
                a.section == b.section && a.offset == b.offset && a.size == b.size
            }
            _ => false,
        }
    }
}
