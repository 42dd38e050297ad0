//! Datamart CLI - build the database and read tables
//!
//! Usage:
//!   datamart init [--config-root <dir>]
//!   datamart statements <phase> [--config-root <dir>]
//!   datamart table <name> [--limit <n>] [--config-root <dir>]
//!   datamart validate [--config-root <dir>]
//!
//! Examples:
//!   datamart init --config-root ./config
//!   datamart statements create --order document
//!   datamart table orders --limit 20

use clap::{Parser, Subcommand, ValueEnum};
use datamart::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datamart")]
#[command(about = "Datamart - schema-driven table access and database setup")]
#[command(version)]
struct Cli {
    /// Directory holding program.json, db.json and database.ini
    #[arg(long, global = true, default_value = "config")]
    config_root: PathBuf,

    /// Runtime config file, relative to the config root
    #[arg(long, global = true)]
    runtime_file: Option<PathBuf>,

    /// Schema document, relative to the config root
    #[arg(long, global = true)]
    schema_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lifecycle phases enabled in the runtime config
    Init,

    /// Print the statements of one phase without executing them
    Statements {
        /// Phase to print
        phase: PhaseArg,

        /// Override the configured table order
        #[arg(short, long)]
        order: Option<OrderArg>,
    },

    /// Load a table through the configured data source and print it
    Table {
        /// Table name
        name: String,

        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Load and check the schema document
    Validate,
}

#[derive(Clone, Copy, ValueEnum)]
enum PhaseArg {
    Create,
    Insert,
    Drop,
    Delete,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::Create => Phase::Create,
            PhaseArg::Insert => Phase::Insert,
            PhaseArg::Drop => Phase::Drop,
            PhaseArg::Delete => Phase::Delete,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Schema document order
    Document,
    /// Referenced tables first
    Dependency,
}

impl From<OrderArg> for TableOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Document => TableOrder::Document,
            OrderArg::Dependency => TableOrder::Dependency,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let mut root = ConfigRoot::new(&cli.config_root);
    if let Some(path) = &cli.runtime_file {
        root = root.with_runtime_file(path);
    }
    if let Some(path) = &cli.schema_file {
        root = root.with_schema_file(path);
    }

    match cli.command {
        Commands::Init => cmd_init(&root),
        Commands::Statements { phase, order } => cmd_statements(&root, phase.into(), order),
        Commands::Table { name, limit } => cmd_table(&root, &name, limit),
        Commands::Validate => cmd_validate(&root),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_init(root: &ConfigRoot) -> ExitCode {
    let (controller, flags) = match SchemaLifecycleController::from_config_root(root) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !flags.any() {
        println!("No lifecycle phase enabled in {}", root.runtime_file().display());
        return ExitCode::SUCCESS;
    }

    match controller.run(&flags) {
        Ok(report) => {
            for phase in &report.phases {
                println!(
                    "{:<7} {} executed, {} failed",
                    phase.phase,
                    phase.executed.len(),
                    phase.failed.len()
                );
                for failure in &phase.failed {
                    println!("  {}: {}", failure.key, failure.error);
                }
            }
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_statements(root: &ConfigRoot, phase: Phase, order: Option<OrderArg>) -> ExitCode {
    let schema = match SchemaModel::load(root.schema_file()) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match root.runtime_config_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let order = order.map_or(config.table_order, TableOrder::from);
    let data_dir = config
        .data_dir
        .as_ref()
        .map_or_else(|| root.dir().to_path_buf(), |dir| root.resolve(dir));
    let factory = StatementFactory::new().with_source_root(data_dir);

    match factory.statements(phase.operation(), &schema, order) {
        Ok(statements) => {
            for (key, statement) in &statements {
                println!("-- {}", key);
                println!("{}", statement);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_table(root: &ConfigRoot, name: &str, limit: usize) -> ExitCode {
    let accessor = match DataAccessor::from_config_root(root) {
        Ok(accessor) => accessor,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match accessor.get_table(name) {
        Ok(table) => {
            print!("{}", table.head(limit));
            println!("({} rows, {} columns)", table.num_rows(), table.num_columns());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(root: &ConfigRoot) -> ExitCode {
    let schema = match SchemaModel::load(root.schema_file()) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Validation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("File: {}", root.schema_file().display());
    println!();
    for table in schema.tables() {
        println!(
            "  {} ({} fields, {} primary keys, {} foreign keys) <- {}",
            table.name,
            table.fields.len(),
            table.primary_keys.len(),
            table.foreign_keys.len(),
            table.source.display()
        );
    }
    println!();

    match schema.dependency_order() {
        Ok(order) => {
            let names: Vec<&str> = order.iter().map(|t| t.name.as_str()).collect();
            println!("Creation order: {}", names.join(", "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Validation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
