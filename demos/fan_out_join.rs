//! A root node fanning out to two independent children on two different
//! backends, each folding back in with a different join kind - the
//! "fan-out join" shape from the join engine's design scenarios.
//!
//! Run with `cargo run --example fan_out_join`.

use std::collections::HashMap;
use std::sync::Arc;

use querygraph::backend::memory::MemoryAdapter;
use querygraph::converter::{DocumentConverter, RelationalConverter};
use querygraph::{
    execute, AdapterRegistry, Column, EngineConfig, JoinContext, JoinKind, Node, TracingLog,
    Table, Value,
};

fn main() {
    let mut registry = AdapterRegistry::new();

    registry.register(Arc::new(
        MemoryAdapter::new("accounts", RelationalConverter).with_response(
            "SELECT id, region FROM accounts",
            Table::new(vec![
                Column::new("id", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
                Column::new(
                    "region",
                    vec![
                        Value::Str("us".into()),
                        Value::Str("eu".into()),
                        Value::Str("us".into()),
                    ],
                ),
            ]),
        ),
    ));

    // A relational ledger, fetched once per account id via a dependent list
    // parameter.
    registry.register(Arc::new(
        MemoryAdapter::new("ledger", RelationalConverter).with_response(
            "SELECT account_id, balance FROM ledger WHERE account_id IN (1, 2, 3)",
            Table::new(vec![
                Column::new("account_id", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
                Column::new(
                    "balance",
                    vec![Value::Float(120.0), Value::Float(0.0), Value::Float(54.25)],
                ),
            ]),
        ),
    ));

    // A document store tracking support tickets, with no record at all for
    // account 2 - exercising the left-join "unmatched parent row" path.
    registry.register(Arc::new(
        MemoryAdapter::new("tickets", DocumentConverter).with_response(
            r#"db.tickets.find({"account_id": {"$in": [1, 2, 3]}})"#,
            Table::new(vec![
                Column::new("account_id", vec![Value::Int(1), Value::Int(3)]),
                Column::new(
                    "status",
                    vec![Value::Str("open".into()), Value::Str("closed".into())],
                ),
            ]),
        ),
    ));

    let root = Node::new_node(
        &registry,
        "accounts",
        "SELECT id, region FROM accounts",
        "accounts",
        None,
    )
    .expect("accounts adapter is registered");

    let ledger = Node::new_node(
        &registry,
        "ledger",
        "SELECT account_id, balance FROM ledger WHERE account_id IN {{id|int|list}}",
        "ledger",
        None,
    )
    .expect("ledger adapter is registered");

    let tickets = Node::new_node(
        &registry,
        "tickets",
        r#"db.tickets.find({"account_id": {"$in": {{id|int|list}}}})"#,
        "tickets",
        None,
    )
    .expect("tickets adapter is registered");

    Node::add_child(
        &root,
        Arc::clone(&ledger),
        JoinContext::new(vec![("id".into(), "account_id".into())], JoinKind::Inner)
            .expect("non-empty join pairs"),
    )
    .expect("ledger attaches cleanly");

    Node::add_child(
        &root,
        Arc::clone(&tickets),
        JoinContext::new(vec![("id".into(), "account_id".into())], JoinKind::Left)
            .expect("non-empty join pairs"),
    )
    .expect("tickets attaches cleanly");

    let result = execute(&root, HashMap::new(), &EngineConfig::default(), &TracingLog)
        .expect("demo graph always succeeds");

    println!("columns: {:?}", result.column_names());
    for row in 0..result.row_count() {
        let cells: Vec<String> = result
            .columns()
            .iter()
            .map(|c| c.cells[row].to_string())
            .collect();
        println!("{cells:?}");
    }
}
