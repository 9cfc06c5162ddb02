//! The execution engine (§4.6): concurrent fetch in dependency order,
//! followed by a single-threaded reverse-topological fold.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rayon::prelude::*;

use crate::backend::AdapterError;
use crate::config::EngineConfig;
use crate::error::{GraphError, NodeError};
use crate::graph::{Node, NodeStatus};
use crate::log::ExecutionLog;
use crate::table::Table;
use crate::template::{Arg, TemplateError};

/// Tripped on the first fetch error; checked before every subsequent fetch
/// starts (§5 "Cancellation").
struct CancellationToken(AtomicBool);

impl CancellationToken {
    fn new() -> Self {
        CancellationToken(AtomicBool::new(false))
    }

    fn trip(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs `root`'s graph to completion: resets the tree, fetches every node
/// in dependency order (independent subtrees in parallel, up to
/// `config.worker_count` workers), then folds children into parents in
/// reverse topological order. Returns the root's table after every fold,
/// or the first error observed, tagged with the offending node's name
/// (§4.6, §7).
pub fn execute(
    root: &Arc<Node>,
    params: HashMap<String, Arg>,
    config: &EngineConfig,
    log: &dyn ExecutionLog,
) -> Result<Table, NodeError> {
    Node::reset_tree(root);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count.max(1))
        .build()
        .expect("failed to build the fetch worker pool");

    let token = CancellationToken::new();
    let first_error: Mutex<Option<NodeError>> = Mutex::new(None);
    let timeout = config.fetch_timeout();

    pool.install(|| {
        fetch_recursive(root, &params, &token, &first_error, timeout, log);
    });

    if let Some(err) = first_error.into_inner().expect("mutex never poisoned") {
        return Err(err);
    }

    fold(root)
}

fn classify_template_error(e: TemplateError) -> GraphError {
    match &e {
        TemplateError::Parse(_) => GraphError::Parse(e),
        TemplateError::Parameter(_) => GraphError::Parameter(e),
        TemplateError::Conversion(_) => GraphError::Conversion(e),
    }
}

fn classify_adapter_error(e: AdapterError) -> GraphError {
    match e {
        AdapterError::Connection(c) => GraphError::Connection(c),
        AdapterError::Execution(x) => GraphError::Execution(x),
    }
}

fn record_first_error(slot: &Mutex<Option<NodeError>>, err: NodeError) {
    let mut guard = slot.lock().expect("mutex never poisoned");
    if guard.is_none() {
        *guard = Some(err);
    }
}

fn sample_rows(table: &Table, limit: usize) -> Vec<Vec<String>> {
    let rows = table.row_count().min(limit);
    (0..rows)
        .map(|r| {
            table
                .columns()
                .iter()
                .map(|c| c.cells[r].to_string())
                .collect()
        })
        .collect()
}

/// Runs a single node's fetch step: render, call the adapter (under the
/// per-node timeout), normalize column names, run post-ops. Does not touch
/// children.
fn fetch_one(
    node: &Arc<Node>,
    params: &HashMap<String, Arg>,
    timeout: Duration,
    log: &dyn ExecutionLog,
) -> Result<(), NodeError> {
    node.set_status(NodeStatus::Fetching);

    let rendered = node
        .render(params)
        .map_err(|e| NodeError::new(node.name(), classify_template_error(e)))?;

    log.node_info(node.name(), &format!("rendered: {rendered}"));

    let mut table = run_with_timeout(node, &rendered, timeout)?;
    table.normalize_names();

    if !table.is_empty() {
        for op in node.post_ops() {
            table = op
                .apply(table)
                .map_err(|e| NodeError::new(node.name(), GraphError::Execution(e)))?;
        }
    }

    let rows = sample_rows(&table, 3);
    log.node_table_header(node.name(), &table.column_names(), &rows);

    node.set_result_table(table);
    Ok(())
}

/// Calls `node`'s adapter on its own thread and waits up to `timeout`.
/// Adapters that don't return promptly keep running, detached; their
/// eventual result is never observed (§5 "Cancellation", §4.6).
fn run_with_timeout(node: &Arc<Node>, rendered: &str, timeout: Duration) -> Result<Table, NodeError> {
    let adapter = Arc::clone(node.adapter());
    let query = rendered.to_string();
    let fields = node.fields().map(|f| f.to_vec());

    let (tx, rx) = crossbeam::channel::bounded(1);
    std::thread::spawn(move || {
        let result = adapter.execute(&query, fields.as_deref());
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(table)) => Ok(table),
        Ok(Err(e)) => Err(NodeError::new(node.name(), classify_adapter_error(e))),
        Err(_) => Err(NodeError::new(
            node.name(),
            GraphError::Execution(crate::backend::ExecutionError(format!(
                "fetch timed out after {timeout:?}"
            ))),
        )),
    }
}

/// Marks every node in `node`'s subtree as holding an empty table, without
/// calling any adapter - the cascade for "parent's table came back empty"
/// (§9 "Result-set empty semantics").
fn mark_subtree_empty(node: &Arc<Node>) {
    for child in node.children() {
        child.set_result_table(Table::empty());
        mark_subtree_empty(&child);
    }
}

fn fetch_recursive(
    node: &Arc<Node>,
    params: &HashMap<String, Arg>,
    token: &CancellationToken,
    first_error: &Mutex<Option<NodeError>>,
    timeout: Duration,
    log: &dyn ExecutionLog,
) {
    if token.is_cancelled() {
        log.node_info(node.name(), "skipped: execution already cancelled");
        return;
    }

    match fetch_one(node, params, timeout, log) {
        Err(e) => {
            log.node_error(node.name(), &e.to_string());
            node.set_status(NodeStatus::Failed);
            token.trip();
            record_first_error(first_error, e);
            return;
        }
        Ok(()) => {
            if token.is_cancelled() {
                log.node_info(
                    node.name(),
                    "fetch completed after cancellation; not scheduling children",
                );
                return;
            }
        }
    }

    let is_empty = node.result_table().map(|t| t.is_empty()).unwrap_or(true);
    if is_empty {
        mark_subtree_empty(node);
        return;
    }

    let children = node.children();
    if children.is_empty() {
        return;
    }

    children.par_iter().for_each(|child| {
        fetch_recursive(child, params, token, first_error, timeout, log);
    });
}

/// Phase 2: reverse-topological fold (§4.6). Runs single-threaded - joining
/// mutates parent tables, so serial execution avoids contention and keeps
/// the output deterministic.
fn fold(root: &Arc<Node>) -> Result<Table, NodeError> {
    let mut sequence = Node::preorder(root);
    sequence.reverse();

    for node in sequence {
        let Some(parent) = node.parent() else {
            continue;
        };

        let child_table = node.result_table().unwrap_or_else(Table::empty);

        // A columnless table only ever comes from the empty-subtree cascade
        // (§9): nothing to fold in, and attempting the declared join would
        // spuriously fail on "missing" key columns that were never fetched.
        if child_table.columns().is_empty() {
            node.set_status(NodeStatus::FoldedIntoParent);
            continue;
        }

        let join_context = node
            .join_context()
            .expect("every non-root node carries a join context (§3)");
        let parent_table = parent.result_table().unwrap_or_else(Table::empty);

        let merged = join_context
            .apply(&parent_table, &child_table, node.name())
            .map_err(|e| NodeError::new(node.name(), GraphError::Join(e)))?;

        parent.set_result_table(merged);
        node.set_status(NodeStatus::FoldedIntoParent);
    }

    Ok(root.result_table().unwrap_or_else(Table::empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryAdapter;
    use crate::converter::RelationalConverter;
    use crate::graph::AdapterRegistry;
    use crate::join::{JoinContext, JoinKind};
    use crate::log::TracingLog;
    use crate::table::Column;
    use crate::value::Value;
    use std::time::Instant;

    fn config() -> EngineConfig {
        EngineConfig {
            worker_count: 4,
            fetch_timeout_ms: 5_000,
        }
    }

    #[test]
    fn join_fold_scenario() {
        let parent_table = Table::new(vec![
            Column::new("id", vec![Value::Int(1), Value::Int(2)]),
            Column::new("x", vec![Value::Int(10), Value::Int(20)]),
        ]);
        let child_table = Table::new(vec![
            Column::new("id", vec![Value::Int(1), Value::Int(2)]),
            Column::new("y", vec![Value::Int(100), Value::Int(200)]),
        ]);

        let mem = Arc::new(
            MemoryAdapter::new("mem", RelationalConverter)
                .with_response("SELECT * FROM parent", parent_table)
                .with_response("SELECT * FROM child", child_table),
        );
        let mut reg = AdapterRegistry::new();
        reg.register(mem);

        let root = Node::new_node(&reg, "root", "SELECT * FROM parent", "mem", None).unwrap();
        let child = Node::new_node(&reg, "child", "SELECT * FROM child", "mem", None).unwrap();
        let ctx = JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Inner).unwrap();
        Node::add_child(&root, Arc::clone(&child), ctx).unwrap();

        let result = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();

        assert_eq!(result.column_names(), vec!["id", "x", "y"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.cell("y", 0), Some(&Value::Int(100)));
    }

    #[test]
    fn error_propagation_scenario() {
        let mem = Arc::new(
            MemoryAdapter::new("mem", RelationalConverter)
                .with_response(
                    "SELECT * FROM parent",
                    Table::new(vec![Column::new("id", vec![Value::Int(1)])]),
                )
                .with_response(
                    "SELECT ok",
                    Table::new(vec![Column::new("id", vec![Value::Int(1)])]),
                )
                .with_connection_error("SELECT bad", "refused"),
        );
        let mut reg = AdapterRegistry::new();
        reg.register(mem);

        let root = Node::new_node(&reg, "root", "SELECT * FROM parent", "mem", None).unwrap();
        let ok_child = Node::new_node(&reg, "ok", "SELECT ok", "mem", None).unwrap();
        let bad_child = Node::new_node(&reg, "bad", "SELECT bad", "mem", None).unwrap();
        let ctx = || JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Inner).unwrap();
        Node::add_child(&root, Arc::clone(&ok_child), ctx()).unwrap();
        Node::add_child(&root, Arc::clone(&bad_child), ctx()).unwrap();

        let err = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap_err();
        assert_eq!(err.node, "bad");
        assert!(matches!(err.kind, GraphError::Connection(_)));
    }

    #[test]
    fn sibling_fetches_run_in_parallel() {
        let sleep = Duration::from_millis(150);
        let mem = Arc::new(
            MemoryAdapter::new("mem", RelationalConverter)
                .with_response(
                    "SELECT * FROM parent",
                    Table::new(vec![Column::new("id", vec![Value::Int(1)])]),
                )
                .with_delay(sleep),
        );
        let mem_a = Arc::new(
            MemoryAdapter::new("a", RelationalConverter)
                .with_response("A", Table::empty())
                .with_delay(sleep),
        );
        let mem_b = Arc::new(
            MemoryAdapter::new("b", RelationalConverter)
                .with_response("B", Table::empty())
                .with_delay(sleep),
        );

        let mut reg = AdapterRegistry::new();
        reg.register(mem);
        reg.register(mem_a);
        reg.register(mem_b);

        let root = Node::new_node(&reg, "root", "SELECT * FROM parent", "mem", None).unwrap();
        let a = Node::new_node(&reg, "a", "A", "a", None).unwrap();
        let b = Node::new_node(&reg, "b", "B", "b", None).unwrap();
        let ctx = || JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Left).unwrap();
        Node::add_child(&root, Arc::clone(&a), ctx()).unwrap();
        Node::add_child(&root, Arc::clone(&b), ctx()).unwrap();

        let mut cfg = config();
        cfg.worker_count = 2;

        let start = Instant::now();
        execute(&root, HashMap::new(), &cfg, &TracingLog).unwrap();
        let elapsed = start.elapsed();

        // Two siblings sleeping `sleep` each should overlap, not stack: well
        // under 2x a single sleep, comfortably above 1x with scheduling slack.
        assert!(elapsed < sleep * 2, "elapsed {elapsed:?} looks serialized");
    }

    #[test]
    fn empty_parent_skips_descendant_fetches() {
        let mem = Arc::new(
            MemoryAdapter::new("mem", RelationalConverter)
                .with_response("SELECT * FROM parent", Table::empty()),
        );
        let mut reg = AdapterRegistry::new();
        reg.register(mem);

        let root = Node::new_node(&reg, "root", "SELECT * FROM parent", "mem", None).unwrap();
        // No response registered for the child query: if the engine tried to
        // fetch it, MemoryAdapter would return an execution error.
        let child = Node::new_node(&reg, "child", "SELECT * FROM child", "mem", None).unwrap();
        let ctx = JoinContext::new(vec![("id".into(), "id".into())], JoinKind::Left).unwrap();
        Node::add_child(&root, Arc::clone(&child), ctx).unwrap();

        let result = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();
        assert!(result.is_empty());
    }
}
