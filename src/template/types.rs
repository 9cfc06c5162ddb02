use crate::value::Value;

/// Where a parameter's value came from for one particular render call.
///
/// The grammar (§6) doesn't distinguish independent from dependent sites
/// syntactically - both are `{{ identifier |type }}`. A [`Parameter`] is
/// resolved to a kind at render time: dependent if the identifier matches a
/// column of the parent table in scope, independent otherwise. See
/// `Template::render` and the grounding note in DESIGN.md.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Supplied by the caller's parameter map at execute time.
    Independent,
    /// Extracted from a column of the parent node's result table.
    Dependent,
}

/// A parsed parameter reference: `{{ identifier |type|list }}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// The caller-supplied key (independent) or parent column name (dependent).
    pub identifier: String,
    pub value_type: crate::value::ValueType,
    /// Whether the `|list` suffix was present.
    pub is_list: bool,
}

/// One parsed chunk of a template: either literal text or a parameter site.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Text(String),
    Param(Parameter),
}

/// A caller-supplied argument for an independent parameter. Distinct from
/// [`Value`] (which is always a single table cell) because the caller can
/// supply either a scalar or a list for a `{{ name |type|list }}` site.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Scalar(Value),
    List(Vec<Value>),
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Scalar(value)
    }
}

impl From<Vec<Value>> for Arg {
    fn from(values: Vec<Value>) -> Self {
        Arg::List(values)
    }
}
