//! Typed scalar values that flow between tables, templates and value converters.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a template parameter or table cell.
///
/// Mirrors the `type` production in the template grammar (§6 of the spec); `List`
/// wraps an element type rather than being its own leaf, since list-ness is
/// orthogonal to the scalar type being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
    Date,
    DateTime,
    Time,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::Bool => "bool",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::Time => "time",
        };
        f.write_str(name)
    }
}

/// A single typed cell value.
///
/// `Null` exists because tables coming back from real adapters can contain
/// missing cells; it has no corresponding `ValueType` annotation since a caller
/// can never declare a template parameter as "null".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Null,
}

impl Value {
    /// The `ValueType` this value would satisfy, or `None` for `Null` (which
    /// satisfies none of them, by design - a null cell renders as an error if
    /// it's ever substituted into a template parameter).
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::Str(_) => Some(ValueType::Str),
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Date(_) => Some(ValueType::Date),
            Value::DateTime(_) => Some(ValueType::DateTime),
            Value::Time(_) => Some(ValueType::Time),
            Value::Null => None,
        }
    }

    /// True if `self` is exactly of the declared type. No numeric promotion:
    /// the value converter contract (§4.2) requires failing loudly on a type
    /// mismatch rather than silently coercing. The one promotion the spec
    /// does call for (int↔float) is scoped to join-key comparison, which is
    /// what [`Value::loose_eq`] is for.
    pub fn matches(&self, declared: ValueType) -> bool {
        self.value_type() == Some(declared)
    }

    /// Loose equality used for join-key comparison: numeric promotion between
    /// int and float, case-sensitive string comparison, calendar-value
    /// comparison for date/time types.
    pub fn loose_eq(&self, other: &Value) -> Option<bool> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a == b),
            (Float(a), Float(b)) => Some(a == b),
            (Int(a), Float(b)) | (Float(b), Int(a)) => Some(*a as f64 == *b),
            (Str(a), Str(b)) => Some(a == b),
            (Bool(a), Bool(b)) => Some(a == b),
            (Date(a), Date(b)) => Some(a == b),
            (DateTime(a), DateTime(b)) => Some(a == b),
            (Time(a), Time(b)) => Some(a == b),
            (Null, Null) => Some(true),
            (Null, _) | (_, Null) => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}
