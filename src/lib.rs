//! Executes a DAG of parameterized queries against heterogeneous data
//! stores and folds the results together via declarative joins.
//!
//! A graph is built from [`graph::Node`]s, each bound to a named
//! [`backend::Adapter`] through an [`graph::AdapterRegistry`] and attached
//! to its parent with a [`join::JoinContext`] describing how its table
//! folds back in. [`engine::execute`] runs the whole tree: a concurrent
//! fetch phase in dependency order, then a single-threaded fold phase in
//! reverse topological order.

pub mod backend;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod graph;
pub mod join;
pub mod log;
pub mod post_op;
pub mod table;
pub mod template;
pub mod value;

pub use backend::{Adapter, AdapterError, ConnectionError, ExecutionError};
pub use config::EngineConfig;
pub use converter::{ConversionError, ValueConverter};
pub use engine::execute;
pub use error::{GraphError, NodeError};
pub use graph::{AdapterRegistry, ConfigError, CycleError, Node, NodeStatus};
pub use join::{JoinContext, JoinError, JoinKind};
pub use log::{ExecutionLog, IndicatifLog, LogEvent, RecordingLog, TracingLog};
pub use post_op::PostOp;
pub use table::{Column, Table};
pub use template::{Arg, Parameter, Segment, Template, TemplateError};
pub use value::{Value, ValueType};
