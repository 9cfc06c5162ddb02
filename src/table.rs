//! The tabular result type every node produces, plus column-name normalization.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Replaces every character outside `[A-Za-z0-9_]` with `_`, then replaces a
/// leading digit (if any) with `_` as well, so the result always matches
/// `[A-Za-z_][A-Za-z0-9_]*` (§3, §8 invariant on stored column names).
pub fn normalize_column_name(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if out.is_empty() {
        return "_".to_string();
    }

    if out.as_bytes()[0].is_ascii_digit() {
        // SAFETY: we only ever replace the first byte of an ASCII digit,
        // which is always a single byte in UTF-8.
        out.replace_range(0..1, "_");
    }

    out
}

/// A single named column: a header plus a cell sequence as long as every other
/// column in its table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Value>) -> Self {
        Column {
            name: normalize_column_name(&name.into()),
            cells,
        }
    }
}

/// An ordered set of equal-length, named columns - the unit of data every
/// adapter returns and every node stores as its `result_table`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table { columns }
    }

    /// An empty table with no columns and no rows.
    pub fn empty() -> Self {
        Table { columns: Vec::new() }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows - the length of the first column's cell vector, or zero
    /// for a columnless table.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Fetches the value of `column` at `row`, if both exist.
    pub fn cell(&self, column: &str, row: usize) -> Option<&Value> {
        self.column(column)?.cells.get(row)
    }

    /// Returns every cell of `column`, in row order, for `|list` dependent
    /// parameter expansion (§4.3).
    pub fn column_values(&self, column: &str) -> Option<&[Value]> {
        self.column(column).map(|c| c.cells.as_slice())
    }

    /// Normalizes every column's name in place - run once on ingress, right
    /// after an adapter returns a table (§4.6, fetch step "normalize column
    /// names").
    pub fn normalize_names(&mut self) {
        for column in &mut self.columns {
            column.name = normalize_column_name(&column.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_special_characters() {
        assert_eq!(normalize_column_name("user name"), "user_name");
        assert_eq!(normalize_column_name("user-id"), "user_id");
        assert_eq!(normalize_column_name("tbl.col"), "tbl_col");
    }

    #[test]
    fn normalizes_leading_digit() {
        assert_eq!(normalize_column_name("1count"), "_count");
        assert_eq!(normalize_column_name("123"), "_23");
    }

    #[test]
    fn leaves_valid_names_untouched() {
        assert_eq!(normalize_column_name("valid_name_1"), "valid_name_1");
    }

    #[test]
    fn row_count_reflects_first_column() {
        let table = Table::new(vec![Column::new("id", vec![Value::Int(1), Value::Int(2)])]);
        assert_eq!(table.row_count(), 2);
        assert!(!table.is_empty());
    }

    #[test]
    fn empty_table_has_zero_rows() {
        assert_eq!(Table::empty().row_count(), 0);
        assert!(Table::empty().is_empty());
    }
}
