//! The template language (§4.3): parses a query template containing
//! independent and dependent parameter sites, then renders it against a
//! parent table and a caller-supplied parameter map.
//!
//! Scanning text around `{{ ... }}` sites follows the same "delimited span,
//! then fallibly parse the inside" shape as the rest of this codebase's
//! `nom`-based parsers; `{{` itself is found with a plain substring search
//! rather than a regex since an escaped `{{{{` needs look-ahead a regex
//! would make awkward.

mod error;
mod types;

pub use error::TemplateError;
pub use types::{Arg, ParamKind, Parameter, Segment};

use std::collections::HashMap;

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, multispace0};
use nom::combinator::{map, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use crate::converter::ValueConverter;
use crate::table::Table;
use crate::value::ValueType;

/// A parsed template: literal text segments interleaved with parameter sites.
/// Parsing happens once, at construction; `render` is pure and deterministic
/// given the same (parent_table, params) pair.
#[derive(Clone, Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a raw template string (§6 grammar). Fails with
    /// [`TemplateError::Parse`] on unmatched braces or a malformed parameter
    /// body (bad identifier, unknown type keyword, missing type annotation).
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut rest = raw;

        loop {
            match rest.find("{{") {
                None => {
                    text.push_str(rest);
                    break;
                }
                Some(idx) => {
                    text.push_str(&rest[..idx]);
                    let tail = &rest[idx..];

                    if tail.starts_with("{{{{") {
                        text.push_str("{{");
                        rest = &tail[4..];
                        continue;
                    }

                    let close = tail.find("}}").ok_or_else(|| {
                        TemplateError::Parse(format!(
                            "unmatched '{{{{' with no closing '}}}}' near: {}",
                            preview(tail)
                        ))
                    })?;
                    let param_src = &tail[..close + 2];

                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Param(parse_param(param_src)?));

                    rest = &tail[close + 2..];
                }
            }
        }

        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Template { segments })
    }

    /// Renders this template against an optional parent table and a
    /// caller-supplied independent-parameter map, using `converter` for
    /// backend-specific literal syntax (§4.3 render contract).
    pub fn render(
        &self,
        parent_table: Option<&Table>,
        params: &HashMap<String, Arg>,
        converter: &dyn ValueConverter,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Param(p) => {
                    out.push_str(&render_param(p, parent_table, params, converter)?)
                }
            }
        }
        Ok(out)
    }

    /// The parameter descriptors this template was parsed into, in source
    /// order, skipping literal text segments.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(p) => Some(p),
            Segment::Text(_) => None,
        })
    }
}

/// Resolves and renders one parameter site.
///
/// A site is dependent iff `parent_table` is present and has a column named
/// `p.identifier`; this is the resolution rule documented in DESIGN.md for
/// the grammar's otherwise syntax-identical independent/dependent forms.
fn render_param(
    p: &Parameter,
    parent_table: Option<&Table>,
    params: &HashMap<String, Arg>,
    converter: &dyn ValueConverter,
) -> Result<String, TemplateError> {
    let dependent_column = parent_table.and_then(|t| t.column(&p.identifier));

    match dependent_column {
        Some(_) => {
            let table = parent_table.expect("dependent_column is only Some when parent_table is");
            if p.is_list {
                let values = table
                    .column_values(&p.identifier)
                    .expect("column presence already checked");
                Ok(converter.convert_list(p.value_type, values)?)
            } else {
                let rows = table.row_count();
                if rows != 1 {
                    return Err(TemplateError::Parameter(format!(
                        "dependent parameter '{}' has no |list suffix, so the parent must have \
                         exactly one row, but it has {rows}",
                        p.identifier
                    )));
                }
                let value = table
                    .cell(&p.identifier, 0)
                    .expect("row_count == 1 just checked");
                Ok(converter.convert_scalar(p.value_type, value)?)
            }
        }
        None => {
            let arg = params.get(&p.identifier).ok_or_else(|| {
                TemplateError::Parameter(format!(
                    "independent parameter '{}' was not supplied",
                    p.identifier
                ))
            })?;
            match (p.is_list, arg) {
                (true, Arg::List(values)) => Ok(converter.convert_list(p.value_type, values)?),
                (false, Arg::Scalar(value)) => Ok(converter.convert_scalar(p.value_type, value)?),
                (true, Arg::Scalar(_)) => Err(TemplateError::Parameter(format!(
                    "parameter '{}' is declared |list but a scalar argument was supplied",
                    p.identifier
                ))),
                (false, Arg::List(_)) => Err(TemplateError::Parameter(format!(
                    "parameter '{}' is scalar but a list argument was supplied",
                    p.identifier
                ))),
            }
        }
    }
}

fn preview(s: &str) -> &str {
    let end = s.char_indices().nth(24).map(|(i, _)| i).unwrap_or(s.len());
    &s[..end]
}

/// Parses one complete `{{ ... }}` span (braces included) into a [`Parameter`].
fn parse_param(src: &str) -> Result<Parameter, TemplateError> {
    match param_span(src) {
        Ok(("", (identifier, value_type, is_list))) => {
            let value_type = value_type.ok_or_else(|| {
                TemplateError::Parse(format!(
                    "parameter '{src}' is missing a |type annotation"
                ))
            })?;
            Ok(Parameter {
                identifier: identifier.to_string(),
                value_type,
                is_list,
            })
        }
        _ => Err(TemplateError::Parse(format!("malformed parameter: {src}"))),
    }
}

fn param_span(input: &str) -> IResult<&str, (&str, Option<ValueType>, bool)> {
    delimited(tag("{{"), param_body, tag("}}"))(input)
}

fn param_body(input: &str) -> IResult<&str, (&str, Option<ValueType>, bool)> {
    let (input, identifier) = preceded(multispace0, ident)(input)?;
    let (input, value_type) = opt(preceded(pipe, value_type))(input)?;
    let (input, is_list) = map(opt(preceded(pipe, tag("list"))), |o| o.is_some())(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (identifier, value_type, is_list)))
}

fn pipe(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, tag("|"))(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn value_type(input: &str) -> IResult<&str, ValueType> {
    alt((
        map(tag("datetime"), |_| ValueType::DateTime),
        map(tag("date"), |_| ValueType::Date),
        map(tag("time"), |_| ValueType::Time),
        map(tag("int"), |_| ValueType::Int),
        map(tag("float"), |_| ValueType::Float),
        map(tag("str"), |_| ValueType::Str),
        map(tag("bool"), |_| ValueType::Bool),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::RelationalConverter;
    use crate::table::Column;
    use crate::value::Value;
    use chrono::NaiveDate;

    fn params(pairs: &[(&str, Arg)]) -> HashMap<String, Arg> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn uppercase_render_scenario() {
        let tpl = Template::parse("SELECT * FROM t WHERE n = {{ name |str }}").unwrap();
        let args = params(&[("name", Arg::Scalar(Value::Str("abc".into())))]);
        let out = tpl.render(None, &args, &RelationalConverter).unwrap();
        assert_eq!(out, "SELECT * FROM t WHERE n = 'abc'");
    }

    #[test]
    fn dependent_list_scenario() {
        let tpl =
            Template::parse("SELECT * FROM c WHERE id IN {{ id |int|list }}").unwrap();
        let parent = Table::new(vec![Column::new(
            "id",
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        )]);
        let out = tpl
            .render(Some(&parent), &HashMap::new(), &RelationalConverter)
            .unwrap();
        assert_eq!(out, "SELECT * FROM c WHERE id IN (1, 2, 3)");
    }

    #[test]
    fn dependent_scalar_scenario() {
        let tpl = Template::parse("WHERE d > {{ d |date }}").unwrap();
        let date = NaiveDate::from_ymd_opt(2009, 1, 6).unwrap();
        let parent = Table::new(vec![Column::new("d", vec![Value::Date(date)])]);
        let out = tpl
            .render(Some(&parent), &HashMap::new(), &RelationalConverter)
            .unwrap();
        assert_eq!(out, "WHERE d > '2009-01-06'");
    }

    #[test]
    fn dependent_scalar_requires_single_row() {
        let tpl = Template::parse("WHERE d > {{ d |date }}").unwrap();
        let date = NaiveDate::from_ymd_opt(2009, 1, 6).unwrap();
        let parent = Table::new(vec![Column::new(
            "d",
            vec![Value::Date(date), Value::Date(date)],
        )]);
        let err = tpl
            .render(Some(&parent), &HashMap::new(), &RelationalConverter)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Parameter(_)));
    }

    #[test]
    fn missing_independent_parameter_errors() {
        let tpl = Template::parse("{{ name |str }}").unwrap();
        let err = tpl
            .render(None, &HashMap::new(), &RelationalConverter)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Parameter(_)));
    }

    #[test]
    fn missing_type_annotation_is_a_parse_error() {
        let err = Template::parse("{{ name }}").unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)));
    }

    #[test]
    fn unmatched_brace_is_a_parse_error() {
        let err = Template::parse("SELECT {{ name |str ").unwrap_err();
        assert!(matches!(err, TemplateError::Parse(_)));
    }

    #[test]
    fn escaped_double_brace_is_literal() {
        let tpl = Template::parse("literal {{{{ brace").unwrap();
        let out = tpl.render(None, &HashMap::new(), &RelationalConverter).unwrap();
        assert_eq!(out, "literal {{ brace");
    }

    #[test]
    fn empty_list_dependent_parameter_renders_empty_literal() {
        let tpl = Template::parse("IN {{ id |int|list }}").unwrap();
        let parent = Table::new(vec![Column::new("id", Vec::<Value>::new())]);
        let out = tpl
            .render(Some(&parent), &HashMap::new(), &RelationalConverter)
            .unwrap();
        assert_eq!(out, "IN ()");
    }

    #[test]
    fn rendering_is_deterministic() {
        let tpl = Template::parse("{{ name |str }}").unwrap();
        let args = params(&[("name", Arg::Scalar(Value::Str("x".into())))]);
        let a = tpl.render(None, &args, &RelationalConverter).unwrap();
        let b = tpl.render(None, &args, &RelationalConverter).unwrap();
        assert_eq!(a, b);
    }
}
