//! The result post-processing hook (§4.8): an opaque, per-node ordered
//! sequence of `table -> table` transformations run after a successful
//! fetch, only when the fetched table is non-empty. The transformation
//! sublanguage itself is an external collaborator (§9) - this module only
//! defines the seam the engine calls through.

use crate::backend::ExecutionError;
use crate::table::Table;

/// One post-fetch transformation. A failure here surfaces as an
/// `execution` error (§4.8, §7).
pub trait PostOp: Send + Sync {
    fn apply(&self, table: Table) -> Result<Table, ExecutionError>;
}

impl<F> PostOp for F
where
    F: Fn(Table) -> Result<Table, ExecutionError> + Send + Sync,
{
    fn apply(&self, table: Table) -> Result<Table, ExecutionError> {
        self(table)
    }
}
