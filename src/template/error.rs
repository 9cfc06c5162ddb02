use std::fmt;

use crate::converter::ConversionError;

/// Errors raised while parsing or rendering a template (§4.3, §7).
#[derive(Debug, Clone)]
pub enum TemplateError {
    /// The template string is malformed (unmatched braces, bad type keyword,
    /// missing type annotation, ...).
    Parse(String),
    /// An independent parameter was missing from the caller's map, a
    /// dependent parameter's column was missing from the parent table, or a
    /// supplied value didn't match the declared kind/type.
    Parameter(String),
    /// The backend's value converter rejected a value.
    Conversion(ConversionError),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Parse(msg) => write!(f, "parse error: {msg}"),
            TemplateError::Parameter(msg) => write!(f, "parameter error: {msg}"),
            TemplateError::Conversion(err) => write!(f, "conversion error: {err}"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<ConversionError> for TemplateError {
    fn from(item: ConversionError) -> Self {
        TemplateError::Conversion(item)
    }
}
