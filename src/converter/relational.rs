use super::{ConversionError, ValueConverter};
use crate::value::{Value, ValueType};

/// The SQL-family converter (sqlite, postgres, mysql/mariadb, mssql, ...):
/// quoted ISO dates, single-quoted strings with doubled-quote escaping,
/// parenthesized lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelationalConverter;

impl ValueConverter for RelationalConverter {
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
            (ValueType::Str, Value::Str(v)) => format!("'{}'", escape_single_quotes(v)),
            (ValueType::Date, Value::Date(v)) => format!("'{}'", v.format("%Y-%m-%d")),
            (ValueType::DateTime, Value::DateTime(v)) => {
                format!("'{}'", v.format("%Y-%m-%d %H:%M:%S"))
            }
            (ValueType::Time, Value::Time(v)) => format!("'{}'", v.format("%H:%M:%S")),
            _ => unreachable!("value.matches(ty) already ruled out every other combination"),
        };

        Ok(rendered)
    }
}

fn escape_single_quotes(raw: &str) -> String {
    raw.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn renders_string_with_escaped_quote() {
        let out = RelationalConverter
            .convert_scalar(ValueType::Str, &Value::Str("O'Brien".into()))
            .unwrap();
        assert_eq!(out, "'O''Brien'");
    }

    #[test]
    fn renders_date_as_iso() {
        let date = NaiveDate::from_ymd_opt(2009, 1, 6).unwrap();
        let out = RelationalConverter
            .convert_scalar(ValueType::Date, &Value::Date(date))
            .unwrap();
        assert_eq!(out, "'2009-01-06'");
    }

    #[test]
    fn rejects_type_mismatch() {
        let err = RelationalConverter
            .convert_scalar(ValueType::Int, &Value::Str("abc".into()))
            .unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn renders_int_list_as_paren_list() {
        let values = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let out = RelationalConverter.convert_list(ValueType::Int, &values).unwrap();
        assert_eq!(out, "(1, 2, 3)");
    }
}
