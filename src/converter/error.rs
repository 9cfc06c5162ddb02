use std::fmt;

use crate::value::ValueType;

/// Raised when a value converter is asked to render a value that doesn't
/// match its declared type (§4.2, §7 `conversion` kind).
#[derive(Debug, Clone)]
pub enum ConversionError {
    TypeMismatch {
        declared: ValueType,
        actual: Option<ValueType>,
    },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::TypeMismatch { declared, actual } => match actual {
                Some(actual) => write!(
                    f,
                    "value declared as {declared} but was actually {actual}"
                ),
                None => write!(f, "value declared as {declared} but was null"),
            },
        }
    }
}

impl std::error::Error for ConversionError {}
