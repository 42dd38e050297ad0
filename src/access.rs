//! Table access for report code.
//!
//! [`DataAccessor::get_table`] is the single entry point callers use: it
//! picks the backend named by the runtime config, reads the table, and
//! normalizes the rows so column names always match the schema.

use thiserror::Error;

use crate::backend::{BackendError, FileBackend, RelationalBackend, RowSet, StorageBackend};
use crate::config::{ConfigError, ConfigRoot, DataSource, RuntimeConfig};
use crate::schema::{SchemaError, SchemaModel, TableDef};
use crate::statement::StatementFactory;
use crate::table::Table;

/// Errors from [`DataAccessor`].
#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The configured data source has no backend attached.
    #[error("no {0} backend configured")]
    BackendUnavailable(&'static str),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Reads tables from whichever backend the configuration selects.
#[derive(Debug)]
pub struct DataAccessor<R: StorageBackend = RelationalBackend> {
    config: RuntimeConfig,
    schema: SchemaModel,
    factory: StatementFactory,
    file: FileBackend,
    relational: Option<R>,
}

impl DataAccessor {
    /// Load config and schema from `root`.
    ///
    /// A relational backend is only built when the configured data source is
    /// `postgres`; an unsupported data source is reported by
    /// [`get_table`](Self::get_table), not here.
    pub fn from_config_root(root: &ConfigRoot) -> AccessResult<Self> {
        let config = root.runtime_config()?;
        let schema = SchemaModel::load(root.schema_file())?;
        let data_dir = config
            .data_dir
            .as_ref()
            .map_or_else(|| root.dir().to_path_buf(), |dir| root.resolve(dir));

        let relational = match config.data_source() {
            Ok(DataSource::Postgres) => {
                let params = root.connection_params(&config.connection_section)?;
                Some(RelationalBackend::postgres(&params)?)
            }
            _ => None,
        };

        Ok(Self::with_backends(
            config,
            schema,
            FileBackend::new(data_dir),
            relational,
        ))
    }
}

impl<R: StorageBackend> DataAccessor<R> {
    pub fn with_backends(
        config: RuntimeConfig,
        schema: SchemaModel,
        file: FileBackend,
        relational: Option<R>,
    ) -> Self {
        Self {
            config,
            schema,
            factory: StatementFactory::new(),
            file,
            relational,
        }
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read one table as a fresh [`Table`].
    pub fn get_table(&self, name: &str) -> AccessResult<Table> {
        let table = self.schema.table(name)?;
        let source = self.config.data_source().inspect_err(|e| {
            tracing::error!(table = %name, error = %e, "cannot read table");
        })?;

        let rows = match source {
            DataSource::Csv => {
                tracing::info!(table = %name, "getting data from csv");
                let statement = self.factory.read_statement(table, true);
                self.file.read(table, &statement)?
            }
            DataSource::Postgres => {
                tracing::info!(table = %name, "getting data from postgres");
                let backend = self
                    .relational
                    .as_ref()
                    .ok_or(AccessError::BackendUnavailable("relational"))?;
                let statement = self.factory.read_statement(table, false);
                backend.read(table, &statement)?
            }
        };

        Ok(normalize(table, rows))
    }
}

/// Name and type positional rows after the table's declared fields.
pub fn normalize(table: &TableDef, rows: RowSet) -> Table {
    if let Some(header) = &rows.header {
        if header != &table.fields {
            tracing::warn!(
                table = %table.name,
                file_columns = ?header,
                declared = ?table.fields,
                "source header differs from declared fields; using declared names by position"
            );
        }
    }
    Table::from_rows(
        &table.name,
        &table.fields,
        &table.semantic_types(),
        rows.rows,
    )
}
