//! Schema lifecycle: create, insert, drop and delete phases.
//!
//! Each phase derives one statement per table from the schema and executes
//! them in order against a backend. A failing statement is logged and
//! recorded, and the remaining statements of the phase still run.

use std::fmt;
use std::str::FromStr;

use crate::access::AccessResult;
use crate::backend::{BackendError, RelationalBackend, StorageBackend};
use crate::config::{ConfigRoot, LifecycleFlags};
use crate::schema::{SchemaModel, SchemaResult, TableOrder};
use crate::statement::{Operation, StatementFactory, StatementMap};

/// One lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Create,
    Insert,
    Drop,
    Delete,
}

impl Phase {
    /// Phases in the order [`SchemaLifecycleController::run`] visits them.
    pub const ALL: [Phase; 4] = [Phase::Create, Phase::Insert, Phase::Drop, Phase::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::Insert => "insert",
            Phase::Drop => "drop",
            Phase::Delete => "delete",
        }
    }

    pub fn operation(self) -> Operation {
        match self {
            Phase::Create => Operation::CreateTable,
            Phase::Insert => Operation::InsertCsv,
            Phase::Drop => Operation::Drop,
            Phase::Delete => Operation::Delete,
        }
    }

    pub fn is_enabled(self, flags: &LifecycleFlags) -> bool {
        match self {
            Phase::Create => flags.create,
            Phase::Insert => flags.insert,
            Phase::Drop => flags.drop,
            Phase::Delete => flags.delete,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|p| p.as_str() == s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown phase '{}' (expected create, insert, drop or delete)", s))
    }
}

/// A statement the backend did not run successfully.
#[derive(Debug)]
pub struct StatementFailure {
    /// Statement key, e.g. `createTableorders`.
    pub key: String,
    pub error: BackendError,
}

/// Outcome of one phase.
#[derive(Debug)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Keys of statements that succeeded, in execution order.
    pub executed: Vec<String>,
    pub failed: Vec<StatementFailure>,
}

impl PhaseReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of [`SchemaLifecycleController::run`].
#[derive(Debug, Default)]
pub struct LifecycleReport {
    /// Reports of the phases that ran, in order.
    pub phases: Vec<PhaseReport>,
}

impl LifecycleReport {
    pub fn is_success(&self) -> bool {
        self.phases.iter().all(PhaseReport::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatementFailure> {
        self.phases.iter().flat_map(|p| p.failed.iter())
    }
}

/// Runs lifecycle phases over every table of a schema.
#[derive(Debug)]
pub struct SchemaLifecycleController<B: StorageBackend = RelationalBackend> {
    schema: SchemaModel,
    factory: StatementFactory,
    backend: B,
    order: TableOrder,
}

impl SchemaLifecycleController {
    /// Build a PostgreSQL-backed controller from the files under `root`.
    ///
    /// Relative table sources in bulk loads are resolved against the data
    /// directory, because the server reads them with its own working
    /// directory.
    pub fn from_config_root(root: &ConfigRoot) -> AccessResult<(Self, LifecycleFlags)> {
        let config = root.runtime_config()?;
        let schema = SchemaModel::load(root.schema_file())?;
        let params = root.connection_params(&config.connection_section)?;
        let backend = RelationalBackend::postgres(&params)?;
        let data_dir = config
            .data_dir
            .as_ref()
            .map_or_else(|| root.dir().to_path_buf(), |dir| root.resolve(dir));

        let controller = Self::new(schema, backend)
            .with_order(config.table_order)
            .with_factory(StatementFactory::new().with_source_root(data_dir));
        Ok((controller, config.db))
    }
}

impl<B: StorageBackend> SchemaLifecycleController<B> {
    pub fn new(schema: SchemaModel, backend: B) -> Self {
        Self {
            schema,
            factory: StatementFactory::new(),
            backend,
            order: TableOrder::default(),
        }
    }

    pub fn with_order(mut self, order: TableOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_factory(mut self, factory: StatementFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The statements `phase` would execute, in order.
    pub fn statements(&self, phase: Phase) -> SchemaResult<StatementMap> {
        self.factory
            .statements(phase.operation(), &self.schema, self.order)
    }

    /// Execute every statement of one phase.
    ///
    /// Only a schema that cannot be ordered fails the phase as a whole.
    pub fn run_phase(&self, phase: Phase) -> SchemaResult<PhaseReport> {
        let statements = self.statements(phase)?;
        tracing::info!(phase = %phase, statements = statements.len(), "running phase");

        let mut report = PhaseReport {
            phase,
            executed: Vec::with_capacity(statements.len()),
            failed: Vec::new(),
        };
        for (key, statement) in statements {
            match self.backend.execute(&statement) {
                Ok(()) => report.executed.push(key),
                Err(error) => {
                    tracing::error!(phase = %phase, statement = %key, error = %error, "statement failed; continuing");
                    report.failed.push(StatementFailure { key, error });
                }
            }
        }

        tracing::info!(
            phase = %phase,
            executed = report.executed.len(),
            failed = report.failed.len(),
            "phase finished"
        );
        Ok(report)
    }

    /// Run every enabled phase in create, insert, drop, delete order.
    pub fn run(&self, flags: &LifecycleFlags) -> SchemaResult<LifecycleReport> {
        let mut report = LifecycleReport::default();
        for phase in Phase::ALL {
            if !phase.is_enabled(flags) {
                tracing::debug!(phase = %phase, "phase disabled");
                continue;
            }
            report.phases.push(self.run_phase(phase)?);
        }
        Ok(report)
    }
}
