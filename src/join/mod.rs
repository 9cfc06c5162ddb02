//! Declarative child→parent join descriptions and the join engine that applies
//! them during the fold phase (§4.4).

mod error;

pub use error::JoinError;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::{Column, Table};
use crate::value::Value;

/// How a child's table is merged into its parent's.
///
/// Named from the parent's perspective: the parent is conventionally the
/// "left" side and the child being folded in is the "right" side, so `Left`
/// preserves every parent row and `Right` preserves every child row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Outer,
}

/// Declarative record of how one child node's result table folds into its
/// parent's: an ordered list of `(child_column, parent_column)` correspondences
/// plus a join kind.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinContext {
    pairs: Vec<(String, String)>,
    kind: JoinKind,
}

impl JoinContext {
    /// Builds a new join context. Fails if `pairs` is empty - every non-root
    /// child must declare at least one column correspondence (§3).
    pub fn new(pairs: Vec<(String, String)>, kind: JoinKind) -> Result<Self, JoinError> {
        if pairs.is_empty() {
            return Err(JoinError::EmptyJoinContext);
        }
        Ok(JoinContext { pairs, kind })
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Applies this join context, folding `child` into `parent` and returning
    /// the merged table. `child_name` is used to disambiguate colliding
    /// non-key column names (§4.4, collision policy).
    pub fn apply(&self, parent: &Table, child: &Table, child_name: &str) -> Result<Table, JoinError> {
        apply_join(parent, child, &self.pairs, self.kind, child_name)
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Outer => "outer",
        };
        f.write_str(name)
    }
}

/// Performs the actual relational join. Parent is the left/base side; child is
/// folded into it per `kind`.
fn apply_join(
    parent: &Table,
    child: &Table,
    pairs: &[(String, String)],
    kind: JoinKind,
    child_name: &str,
) -> Result<Table, JoinError> {
    // Resolve key column indices on both sides up front so a missing key column
    // is reported before any row-level work happens.
    let mut child_key_idx = Vec::with_capacity(pairs.len());
    let mut parent_key_idx = Vec::with_capacity(pairs.len());

    for (child_col, parent_col) in pairs {
        let ci = child
            .columns()
            .iter()
            .position(|c| &c.name == child_col)
            .ok_or_else(|| JoinError::MissingColumn {
                side: Side::Child,
                column: child_col.clone(),
            })?;
        let pi = parent
            .columns()
            .iter()
            .position(|c| &c.name == parent_col)
            .ok_or_else(|| JoinError::MissingColumn {
                side: Side::Parent,
                column: parent_col.clone(),
            })?;
        child_key_idx.push(ci);
        parent_key_idx.push(pi);
    }

    let parent_rows = parent.row_count();
    let child_rows = child.row_count();

    // For every (parent_row, child_row) pair, whether every key column matches.
    let row_matches = |pr: usize, cr: usize| -> Result<bool, JoinError> {
        for (&pi, &ci) in parent_key_idx.iter().zip(child_key_idx.iter()) {
            let pv = &parent.columns()[pi].cells[pr];
            let cv = &child.columns()[ci].cells[cr];
            match pv.loose_eq(cv) {
                Some(true) => continue,
                Some(false) => return Ok(false),
                None => {
                    return Err(JoinError::IncompatibleKeyTypes {
                        parent_column: parent.columns()[pi].name.clone(),
                        child_column: child.columns()[ci].name.clone(),
                    })
                }
            }
        }
        Ok(true)
    };

    // Child columns that are not consumed as join keys - these are what
    // actually gets appended to the parent's columns.
    let child_value_cols: Vec<usize> = (0..child.columns().len())
        .filter(|i| !child_key_idx.contains(i))
        .collect();

    let parent_names: Vec<&str> = parent.columns().iter().map(|c| c.name.as_str()).collect();

    let mut result_names: Vec<String> = parent_names.iter().map(|s| s.to_string()).collect();
    for &ci in &child_value_cols {
        let name = &child.columns()[ci].name;
        if parent_names.contains(&name.as_str()) {
            result_names.push(format!("{name}_{child_name}"));
        } else {
            result_names.push(name.clone());
        }
    }

    let mut result_cells: Vec<Vec<Value>> = vec![Vec::new(); result_names.len()];
    let parent_col_count = parent.columns().len();

    let mut push_row = |parent_row: Option<usize>, child_row: Option<usize>| {
        for (pi, _) in parent.columns().iter().enumerate() {
            let value = match parent_row {
                Some(pr) => parent.columns()[pi].cells[pr].clone(),
                None => match child_row {
                    // For an unmatched child row, a retained parent-named key
                    // column takes the child's corresponding key value so the
                    // join key is still visible in the result.
                    Some(cr) => parent_key_idx
                        .iter()
                        .position(|&idx| idx == pi)
                        .map(|pos| child.columns()[child_key_idx[pos]].cells[cr].clone())
                        .unwrap_or(Value::Null),
                    None => Value::Null,
                },
            };
            result_cells[pi].push(value);
        }
        for (offset, &ci) in child_value_cols.iter().enumerate() {
            let value = match child_row {
                Some(cr) => child.columns()[ci].cells[cr].clone(),
                None => Value::Null,
            };
            result_cells[parent_col_count + offset].push(value);
        }
    };

    let mut parent_matched = vec![false; parent_rows];
    let mut child_matched = vec![false; child_rows];

    for pr in 0..parent_rows {
        for cr in 0..child_rows {
            if row_matches(pr, cr)? {
                parent_matched[pr] = true;
                child_matched[cr] = true;
                push_row(Some(pr), Some(cr));
            }
        }
    }

    if matches!(kind, JoinKind::Left | JoinKind::Outer) {
        for pr in 0..parent_rows {
            if !parent_matched[pr] {
                push_row(Some(pr), None);
            }
        }
    }

    if matches!(kind, JoinKind::Right | JoinKind::Outer) {
        for cr in 0..child_rows {
            if !child_matched[cr] {
                push_row(None, Some(cr));
            }
        }
    }

    let columns = result_names
        .into_iter()
        .zip(result_cells)
        .map(|(name, cells)| Column { name, cells })
        .collect();

    Ok(Table::new(columns))
}

/// Which side of a join a missing/incompatible column was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Parent,
    Child,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Parent => f.write_str("parent"),
            Side::Child => f.write_str("child"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn parent_table() -> Table {
        Table::new(vec![
            Column::new("id", vec![Value::Int(1), Value::Int(2)]),
            Column::new("x", vec![Value::Int(10), Value::Int(20)]),
        ])
    }

    fn child_table() -> Table {
        Table::new(vec![
            Column::new("id", vec![Value::Int(1), Value::Int(2)]),
            Column::new("y", vec![Value::Int(100), Value::Int(200)]),
        ])
    }

    #[test]
    fn inner_join_merges_matching_rows() {
        let ctx = JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Inner).unwrap();
        let result = ctx.apply(&parent_table(), &child_table(), "child").unwrap();

        assert_eq!(result.column_names(), vec!["id", "x", "y"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.cell("y", 0), Some(&Value::Int(100)));
        assert_eq!(result.cell("y", 1), Some(&Value::Int(200)));
    }

    #[test]
    fn left_join_keeps_unmatched_parent_rows() {
        let parent = parent_table();
        let child = Table::new(vec![
            Column::new("id", vec![Value::Int(1)]),
            Column::new("y", vec![Value::Int(100)]),
        ]);

        let ctx = JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Left).unwrap();
        let result = ctx.apply(&parent, &child, "child").unwrap();

        assert_eq!(result.row_count(), 2);
        assert_eq!(result.cell("y", 1), Some(&Value::Null));
    }

    #[test]
    fn missing_key_column_is_a_join_error() {
        let ctx = JoinContext::new(vec![("nope".into(), "id".into())], JoinKind::Inner).unwrap();
        let err = ctx.apply(&parent_table(), &child_table(), "child").unwrap_err();
        assert!(matches!(err, JoinError::MissingColumn { side: Side::Child, .. }));
    }

    #[test]
    fn empty_pairs_rejected() {
        assert!(matches!(
            JoinContext::new(vec![], JoinKind::Inner),
            Err(JoinError::EmptyJoinContext)
        ));
    }

    #[test]
    fn collision_suffixes_child_column() {
        let parent = Table::new(vec![
            Column::new("id", vec![Value::Int(1)]),
            Column::new("name", vec![Value::Str("parent".into())]),
        ]);
        let child = Table::new(vec![
            Column::new("id", vec![Value::Int(1)]),
            Column::new("name", vec![Value::Str("child".into())]),
        ]);

        let ctx = JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Inner).unwrap();
        let result = ctx.apply(&parent, &child, "kids").unwrap();

        assert_eq!(result.column_names(), vec!["id", "name", "name_kids"]);
    }
}
