//! The backend adapter contract (§4.1): the interface the engine consumes
//! from concrete database drivers. Drivers themselves are out of scope
//! (§1) - this module only defines the trait and the one concrete,
//! deterministic implementation ([`memory::MemoryAdapter`]) that the test
//! suite and the demo binary exercise it with.

mod error;
pub mod memory;

pub use error::{AdapterError, ConnectionError, ExecutionError};

use crate::converter::ValueConverter;
use crate::table::Table;

/// A driver for one backend. The engine treats this entirely as a black
/// box: it renders a query string, hands it to `execute`, and gets back a
/// table or a tagged error. Opening, pooling, and closing physical
/// connections is the adapter's own business.
pub trait Adapter: Send + Sync {
    /// A stable, human-readable name (e.g. `"postgres"`, `"mongo"`). Used
    /// only for registry lookup and log/error messages - never parsed.
    fn name(&self) -> &str;

    /// True for backends that need an explicit column projection list to
    /// turn a document/row-shaped result into a [`Table`] (document
    /// stores, wide column stores, ...).
    fn fields_accepted(&self) -> bool;

    /// This backend's literal-syntax rules (§4.2).
    fn value_converter(&self) -> &dyn ValueConverter;

    /// Executes an already-rendered query string and returns its result as
    /// a table. `fields` is `Some` only when [`Adapter::fields_accepted`]
    /// is true.
    fn execute(&self, query: &str, fields: Option<&[String]>) -> Result<Table, AdapterError>;
}
