#![warn(clippy::all)]

mod prelude {
    pub use color_eyre::eyre::{bail, ensure, eyre, Context as EyreContext, ContextCompat};
    pub use color_eyre::{Report, Result, Section};
    pub use indoc::indoc;
    pub use tracing::{debug, error, info, warn};
}

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use tabled::builder::Builder as TableBuilder;

use prelude::*;
use querygraph::{
    execute, AdapterRegistry, Column, EngineConfig, ExecutionLog, IndicatifLog, JoinContext,
    JoinKind, Node, TracingLog, Table, Value,
};
use querygraph::backend::memory::MemoryAdapter;
use querygraph::converter::RelationalConverter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
    /// Suppress all output but the final result table.
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
    /// Enable debug logging.
    ///
    /// - Level 1 enables ERROR, WARN and INFO.
    /// - Level 2 enables DEBUG.
    /// - Level 3 and up enables TRACE.
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the bundled customers/orders demo graph and prints the folded
    /// result table.
    Run {
        /// Path to a TOML file overriding the default `EngineConfig`.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Arguments::parse();
    install_logging(args.verbose);

    match args.command {
        Command::Run { config } => run_demo(config.as_deref(), args.quiet),
    }
}

fn run_demo(config_path: Option<&std::path::Path>, quiet: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let registry = build_registry();
    let root = build_demo_graph(&registry)?;

    let log: Box<dyn ExecutionLog> = if quiet {
        Box::new(TracingLog)
    } else {
        Box::new(IndicatifLog::new())
    };
    let result =
        execute(&root, HashMap::new(), &config, log.as_ref()).map_err(|e| eyre!("{e}"))?;

    print_table(&result);
    Ok(())
}

fn build_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();

    registry.register(Arc::new(
        MemoryAdapter::new("customers_db", RelationalConverter).with_response(
            "SELECT id, name FROM customers",
            Table::new(vec![
                Column::new("id", vec![Value::Int(1), Value::Int(2)]),
                Column::new(
                    "name",
                    vec![Value::Str("Ada".into()), Value::Str("Grace".into())],
                ),
            ]),
        ),
    ));

    registry.register(Arc::new(
        MemoryAdapter::new("orders_db", RelationalConverter).with_response(
            "SELECT customer_id, total FROM orders WHERE customer_id IN (1, 2)",
            Table::new(vec![
                Column::new("customer_id", vec![Value::Int(1), Value::Int(2), Value::Int(2)]),
                Column::new(
                    "total",
                    vec![Value::Float(12.5), Value::Float(4.0), Value::Float(19.75)],
                ),
            ]),
        ),
    ));

    registry
}

fn build_demo_graph(registry: &AdapterRegistry) -> Result<Arc<Node>> {
    let root = Node::new_node(
        registry,
        "customers",
        "SELECT id, name FROM customers",
        "customers_db",
        None,
    )
    .map_err(|e| eyre!("{e}"))?;

    let orders = Node::new_node(
        registry,
        "orders",
        "SELECT customer_id, total FROM orders WHERE customer_id IN {{id|int|list}}",
        "orders_db",
        None,
    )
    .map_err(|e| eyre!("{e}"))?;

    let ctx = JoinContext::new(vec![("id".into(), "customer_id".into())], JoinKind::Left)
        .map_err(|e| eyre!("{e}"))?;
    Node::add_child(&root, Arc::clone(&orders), ctx).map_err(|e| eyre!("{e}"))?;

    Ok(root)
}

fn print_table(table: &Table) {
    let mut builder = TableBuilder::default();
    builder.push_record(table.column_names());
    for row in 0..table.row_count() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.cells[row].to_string())
            .collect();
        builder.push_record(record);
    }
    println!("{}", builder.build());
}

fn install_logging(verbosity: u8) {
    use color_eyre::config::HookBuilder;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = match verbosity {
        0 => "info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();

    HookBuilder::new()
        .panic_section(indoc! {
            "Well, this is embarrassing. querygraph-demo crashed.
            This is the demo binary, not the library - if you're embedding
            `querygraph`, this panic came from your own graph construction."
        })
        .display_env_section(false)
        .display_location_section(false)
        .install()
        .expect("could not install eyre hooks");

    info!("logging installed");
}
