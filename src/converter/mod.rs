//! Per-backend value converters (§4.2): the mapping from a typed scalar or
//! list to the literal fragment spliced into a rendered query string.

mod document;
mod error;
mod relational;

pub use document::DocumentConverter;
pub use error::ConversionError;
pub use relational::RelationalConverter;

use crate::value::{Value, ValueType};

/// Converts typed values into backend-specific literal syntax.
///
/// Implementations must be pure (same input always produces the same
/// literal) and must reject a type mismatch rather than silently coerce -
/// the one exception, per §4.2, is that list rendering always reuses the
/// scalar renderer for the element type, so `convert_list`'s default
/// implementation is built directly on top of `convert_scalar`.
pub trait ValueConverter: Send + Sync {
    /// Declared type vs actual value mismatch: name, reject coercion, fail.
    fn convert_scalar(&self, ty: ValueType, value: &Value) -> Result<String, ConversionError>;

    /// Renders a parenthesized/bracketed comma list using `convert_scalar`
    /// for each element. Backends with a distinct array literal syntax
    /// should override this directly rather than post-processing the default.
    fn convert_list(&self, ty: ValueType, values: &[Value]) -> Result<String, ConversionError> {
        let rendered: Result<Vec<String>, ConversionError> =
            values.iter().map(|v| self.convert_scalar(ty, v)).collect();
        Ok(format!("({})", rendered?.join(", ")))
    }
}
