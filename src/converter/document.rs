use super::{ConversionError, ValueConverter};
use crate::value::{Value, ValueType};

/// The document/column-family/time-series family converter (mongo,
/// cassandra, influx, ...): native-looking date/datetime literals and
/// bracketed list syntax instead of the SQL-family's parens.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentConverter;

impl ValueConverter for DocumentConverter {
    fn convert_scalar(&self, ty: ValueType, value: &Value) -> Result<String, ConversionError> {
        if !value.matches(ty) {
            return Err(ConversionError::TypeMismatch {
                declared: ty,
                actual: value.value_type(),
            });
        }

        let rendered = match (ty, value) {
            (ValueType::Int, Value::Int(v)) => v.to_string(),
            (ValueType::Float, Value::Float(v)) => v.to_string(),
            (ValueType::Bool, Value::Bool(v)) => v.to_string(),
            (ValueType::Str, Value::Str(v)) => format!("\"{}\"", escape_double_quotes(v)),
            (ValueType::Date, Value::Date(v)) => format!("ISODate(\"{}\")", v.format("%Y-%m-%d")),
            (ValueType::DateTime, Value::DateTime(v)) => {
                format!("ISODate(\"{}\")", v.format("%Y-%m-%dT%H:%M:%SZ"))
            }
            (ValueType::Time, Value::Time(v)) => format!("\"{}\"", v.format("%H:%M:%S")),
            _ => unreachable!("value.matches(ty) already ruled out every other combination"),
        };

        Ok(rendered)
    }

    fn convert_list(&self, ty: ValueType, values: &[Value]) -> Result<String, ConversionError> {
        let rendered: Result<Vec<String>, ConversionError> =
            values.iter().map(|v| self.convert_scalar(ty, v)).collect();
        Ok(format!("[{}]", rendered?.join(", ")))
    }
}

fn escape_double_quotes(raw: &str) -> String {
    raw.replace('"', "\\\"")
}
