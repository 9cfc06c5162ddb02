//! Tagged error kinds and their aggregation into [`GraphError`].
//!
//! Each CORE module owns a small error enum of its own (`TemplateError`,
//! `JoinError`, `CycleError`, ...); this module just wires them into one
//! aggregate via hand-written `From` impls, the same shape as the teacher's
//! `BuildError`/`DbError` split.

use std::fmt;

use crate::backend::{ConnectionError, ExecutionError};
use crate::graph::{ConfigError, CycleError};
use crate::join::JoinError;
use crate::template::TemplateError;

/// Every error kind the engine can raise, in the propagation order from §7.
#[derive(Debug)]
pub enum GraphError {
    Parse(TemplateError),
    Parameter(TemplateError),
    Conversion(TemplateError),
    Connection(ConnectionError),
    Execution(ExecutionError),
    Join(JoinError),
    Cycle(CycleError),
    Configuration(ConfigError),
    Cancelled,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Parse(e) => write!(f, "template parse error: {e}"),
            GraphError::Parameter(e) => write!(f, "parameter error: {e}"),
            GraphError::Conversion(e) => write!(f, "value conversion error: {e}"),
            GraphError::Connection(e) => write!(f, "connection error: {e}"),
            GraphError::Execution(e) => write!(f, "execution error: {e}"),
            GraphError::Join(e) => write!(f, "join error: {e}"),
            GraphError::Cycle(e) => write!(f, "cycle error: {e}"),
            GraphError::Configuration(e) => write!(f, "configuration error: {e}"),
            GraphError::Cancelled => write!(f, "node was cancelled before its fetch started"),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<ConnectionError> for GraphError {
    fn from(item: ConnectionError) -> Self {
        GraphError::Connection(item)
    }
}

impl From<ExecutionError> for GraphError {
    fn from(item: ExecutionError) -> Self {
        GraphError::Execution(item)
    }
}

impl From<JoinError> for GraphError {
    fn from(item: JoinError) -> Self {
        GraphError::Join(item)
    }
}

impl From<CycleError> for GraphError {
    fn from(item: CycleError) -> Self {
        GraphError::Cycle(item)
    }
}

impl From<ConfigError> for GraphError {
    fn from(item: ConfigError) -> Self {
        GraphError::Configuration(item)
    }
}

/// The error actually returned by [`crate::engine::execute`] - the first
/// [`GraphError`] observed, annotated with the name of the node that raised it
/// (§7: "the engine returns it with the offending node's name annotated").
#[derive(Debug)]
pub struct NodeError {
    pub node: String,
    pub kind: GraphError,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node \"{}\": {}", self.node, self.kind)
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl NodeError {
    pub fn new(node: impl Into<String>, kind: impl Into<GraphError>) -> Self {
        NodeError {
            node: node.into(),
            kind: kind.into(),
        }
    }
}
