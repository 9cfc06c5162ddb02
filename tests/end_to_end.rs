//! Black-box tests driving the whole engine through its public API: build a
//! registry, build a graph, call `execute`, check the folded table.

use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use querygraph::backend::memory::MemoryAdapter;
use querygraph::converter::{DocumentConverter, RelationalConverter};
use querygraph::{
    execute, AdapterRegistry, Column, EngineConfig, GraphError, JoinContext, JoinKind, Node,
    Table, TracingLog, Value,
};

fn config() -> EngineConfig {
    EngineConfig {
        worker_count: 4,
        fetch_timeout_ms: 2_000,
    }
}

#[test]
fn cross_backend_join_folds_into_a_single_table() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(
        MemoryAdapter::new("sql", RelationalConverter).with_response(
            "SELECT id FROM accounts",
            Table::new(vec![Column::new("id", vec![Value::Int(1), Value::Int(2)])]),
        ),
    ));
    registry.register(Arc::new(
        MemoryAdapter::new("docs", DocumentConverter).with_response(
            r#"db.profile.find({"account_id": {"$in": [1, 2]}})"#,
            Table::new(vec![
                Column::new("account_id", vec![Value::Int(1), Value::Int(2)]),
                Column::new(
                    "plan",
                    vec![Value::Str("free".into()), Value::Str("pro".into())],
                ),
            ]),
        ),
    ));

    let root = Node::new_node(&registry, "accounts", "SELECT id FROM accounts", "sql", None)
        .unwrap();
    let profile = Node::new_node(
        &registry,
        "profile",
        r#"db.profile.find({"account_id": {"$in": {{id|int|list}}}})"#,
        "docs",
        None,
    )
    .unwrap();

    let ctx = JoinContext::new(vec![("id".into(), "account_id".into())], JoinKind::Inner).unwrap();
    Node::add_child(&root, Arc::clone(&profile), ctx).unwrap();

    let result = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();

    assert_eq!(result.column_names(), vec!["id", "plan"]);
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.cell("plan", 1), Some(&Value::Str("pro".into())));
}

#[test]
fn left_join_keeps_parent_rows_with_no_match() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(
        MemoryAdapter::new("sql", RelationalConverter)
            .with_response(
                "SELECT id FROM accounts",
                Table::new(vec![Column::new(
                    "id",
                    vec![Value::Int(1), Value::Int(2), Value::Int(3)],
                )]),
            )
            .with_response(
                "SELECT account_id, balance FROM ledger WHERE account_id IN (1, 2, 3)",
                Table::new(vec![
                    Column::new("account_id", vec![Value::Int(1), Value::Int(3)]),
                    Column::new("balance", vec![Value::Float(10.0), Value::Float(20.0)]),
                ]),
            ),
    ));

    let root = Node::new_node(&registry, "accounts", "SELECT id FROM accounts", "sql", None)
        .unwrap();
    let ledger = Node::new_node(
        &registry,
        "ledger",
        "SELECT account_id, balance FROM ledger WHERE account_id IN {{id|int|list}}",
        "sql",
        None,
    )
    .unwrap();
    let ctx = JoinContext::new(vec![("id".into(), "account_id".into())], JoinKind::Left).unwrap();
    Node::add_child(&root, Arc::clone(&ledger), ctx).unwrap();

    let result = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();

    // Matched rows come first (id 1, id 3), then the unmatched parent row
    // (id 2) trails with a null balance (§4.4 row ordering).
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.cell("id", 2), Some(&Value::Int(2)));
    assert_eq!(result.cell("balance", 2), Some(&Value::Null));
}

#[test]
fn a_failing_child_surfaces_its_own_name_and_kind() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(
        MemoryAdapter::new("sql", RelationalConverter)
            .with_response(
                "SELECT id FROM accounts",
                Table::new(vec![Column::new("id", vec![Value::Int(1)])]),
            )
            .with_connection_error(
                "SELECT account_id, balance FROM ledger WHERE account_id IN (1)",
                "connection refused",
            ),
    ));

    let root = Node::new_node(&registry, "accounts", "SELECT id FROM accounts", "sql", None)
        .unwrap();
    let ledger = Node::new_node(
        &registry,
        "ledger",
        "SELECT account_id, balance FROM ledger WHERE account_id IN {{id|int|list}}",
        "sql",
        None,
    )
    .unwrap();
    let ctx = JoinContext::new(vec![("id".into(), "account_id".into())], JoinKind::Left).unwrap();
    Node::add_child(&root, Arc::clone(&ledger), ctx).unwrap();

    let err = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap_err();

    assert_eq!(err.node, "ledger");
    assert!(matches!(err.kind, GraphError::Connection(_)));
}

#[test]
fn re_running_the_same_graph_is_independent_of_the_previous_run() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(
        MemoryAdapter::new("sql", RelationalConverter).with_response(
            "SELECT id FROM accounts",
            Table::new(vec![Column::new("id", vec![Value::Int(1), Value::Int(2)])]),
        ),
    ));
    let root = Node::new_node(&registry, "accounts", "SELECT id FROM accounts", "sql", None)
        .unwrap();

    let first = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();
    let second = execute(&root, HashMap::new(), &config(), &TracingLog).unwrap();

    assert_eq!(first.row_count(), second.row_count());
    assert_eq!(root.status(), querygraph::NodeStatus::Fetched);
}
