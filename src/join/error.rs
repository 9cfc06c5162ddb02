use std::fmt;

use super::Side;

/// Errors raised while applying a [`super::JoinContext`] (§4.4, §7 `join` kind).
#[derive(Debug)]
pub enum JoinError {
    /// A [`super::JoinContext`] was built with no column correspondences.
    EmptyJoinContext,
    /// A declared key column does not exist on the named side.
    MissingColumn { side: Side, column: String },
    /// Two key columns being compared aren't coercible (anything other than
    /// an int/float pairing).
    IncompatibleKeyTypes {
        parent_column: String,
        child_column: String,
    },
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::EmptyJoinContext => {
                write!(f, "join context must declare at least one column correspondence")
            }
            JoinError::MissingColumn { side, column } => {
                write!(f, "{side} table has no column named \"{column}\"")
            }
            JoinError::IncompatibleKeyTypes {
                parent_column,
                child_column,
            } => write!(
                f,
                "join key types are incompatible: parent column \"{parent_column}\" vs child column \"{child_column}\""
            ),
        }
    }
}

impl std::error::Error for JoinError {}
