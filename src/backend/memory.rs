//! A deterministic, in-memory [`Adapter`] with no physical connection of
//! its own. A real network-backed driver is out of scope for this crate
//! (§1); this is the one concrete implementation the adapter trait needs
//! to be testable end-to-end (the demo binary and the integration tests
//! both build graphs against it).

use std::collections::HashMap;
use std::time::Duration;

use super::{Adapter, AdapterError, ConnectionError, ExecutionError};
use crate::converter::ValueConverter;
use crate::table::Table;

enum Response {
    Table(Table),
    Connection(String),
    Execution(String),
}

/// Maps exact rendered query strings to canned responses. Queries not
/// found fall back to `default`, or to an `execution` error naming the
/// adapter and the unmatched query if no default was configured.
pub struct MemoryAdapter {
    name: String,
    converter: Box<dyn ValueConverter>,
    fields_accepted: bool,
    responses: HashMap<String, Response>,
    default: Option<Table>,
    delay: Option<Duration>,
}

impl MemoryAdapter {
    pub fn new(name: impl Into<String>, converter: impl ValueConverter + 'static) -> Self {
        MemoryAdapter {
            name: name.into(),
            converter: Box::new(converter),
            fields_accepted: false,
            responses: HashMap::new(),
            default: None,
            delay: None,
        }
    }

    /// Registers the table returned for an exact rendered query string.
    pub fn with_response(mut self, query: impl Into<String>, table: Table) -> Self {
        self.responses.insert(query.into(), Response::Table(table));
        self
    }

    /// Makes this adapter return a `connection` error for an exact query.
    pub fn with_connection_error(mut self, query: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(query.into(), Response::Connection(message.into()));
        self
    }

    /// Makes this adapter return an `execution` error for an exact query.
    pub fn with_execution_error(mut self, query: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(query.into(), Response::Execution(message.into()));
        self
    }

    /// The table returned for any query with no specific response registered.
    pub fn with_default(mut self, table: Table) -> Self {
        self.default = Some(table);
        self
    }

    /// Simulates I/O latency - used to exercise sibling-fetch parallelism.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fields_accepted(mut self, accepted: bool) -> Self {
        self.fields_accepted = accepted;
        self
    }
}

impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields_accepted(&self) -> bool {
        self.fields_accepted
    }

    fn value_converter(&self) -> &dyn ValueConverter {
        self.converter.as_ref()
    }

    fn execute(&self, query: &str, _fields: Option<&[String]>) -> Result<Table, AdapterError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match self.responses.get(query) {
            Some(Response::Table(table)) => Ok(table.clone()),
            Some(Response::Connection(msg)) => {
                Err(AdapterError::Connection(ConnectionError(msg.clone())))
            }
            Some(Response::Execution(msg)) => {
                Err(AdapterError::Execution(ExecutionError(msg.clone())))
            }
            None => match &self.default {
                Some(table) => Ok(table.clone()),
                None => Err(AdapterError::Execution(ExecutionError(format!(
                    "MemoryAdapter '{}' has no response configured for query: {query}",
                    self.name
                )))),
            },
        }
    }
}
