//! Derives statements from the schema.
//!
//! Every method is a pure function of its input: nothing here touches
//! storage. Per-table methods return SQL text; whole-schema methods return a
//! [`StatementMap`] keyed `"<operation><table>"` (e.g. `createTableorders`,
//! `insertCsvorders`, `droporders`, `deleteorders`).

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use super::Statement;
use crate::schema::{ColumnRole, SchemaModel, SchemaResult, TableDef, TableOrder};
use crate::sql::{
    ColumnDef, CopyFrom, CreateTable, DropTable, Postgres, Projection, Query, SqlDialect, Truncate,
};

/// Statements for a whole schema, keyed `"<operation><table>"`, in
/// execution order.
pub type StatementMap = IndexMap<String, Statement>;

/// Whole-schema operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `CREATE TABLE` for every table.
    CreateTable,
    /// Bulk load every table from its source file.
    InsertCsv,
    /// `DROP TABLE` for every table.
    Drop,
    /// `TRUNCATE ... CASCADE` for every table.
    Delete,
}

impl Operation {
    /// Prefix used in [`StatementMap`] keys.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Operation::CreateTable => "createTable",
            Operation::InsertCsv => "insertCsv",
            Operation::Drop => "drop",
            Operation::Delete => "delete",
        }
    }

    /// Map key for one table.
    pub fn key(self, table: &str) -> String {
        format!("{}{}", self.key_prefix(), table)
    }

    /// Whether dependency ordering runs backwards for this operation
    /// (referencing tables first).
    fn reverses_dependencies(self) -> bool {
        matches!(self, Operation::Drop | Operation::Delete)
    }
}

/// Builds statement text for a SQL dialect.
#[derive(Debug, Clone, Default)]
pub struct StatementFactory<D: SqlDialect = Postgres> {
    dialect: D,
    source_root: Option<PathBuf>,
}

impl StatementFactory<Postgres> {
    /// Factory emitting PostgreSQL.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: SqlDialect> StatementFactory<D> {
    /// Factory for an arbitrary dialect.
    pub fn with_dialect(dialect: D) -> Self {
        Self {
            dialect,
            source_root: None,
        }
    }

    /// Resolve relative `source` paths in bulk-load statements against
    /// `root`. Without a root, sources are emitted exactly as declared.
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// `CREATE TABLE <name> (<col> <type> [REFERENCES t(c) | PRIMARY KEY], ...);`
    pub fn create_table_statement(&self, table: &TableDef) -> String {
        let columns = table.columns().map(|(name, data_type)| {
            let col = ColumnDef::new(name, data_type);
            match table.role(name) {
                ColumnRole::ForeignKey(fk) => {
                    col.references(&fk.referenced_table, &fk.referenced_column)
                }
                ColumnRole::PrimaryKey => col.primary_key(),
                ColumnRole::Plain => col,
            }
        });
        let sql = CreateTable::new(&table.name)
            .columns(columns)
            .to_sql(&self.dialect);
        terminate(sql)
    }

    /// `COPY <name> FROM '<source>' DELIMITER ',' CSV HEADER;`
    pub fn bulk_load_statement(&self, table: &TableDef) -> String {
        let source = self.resolve_source(&table.source);
        let sql = CopyFrom::new(&table.name, source.to_string_lossy()).to_sql(&self.dialect);
        terminate(sql)
    }

    /// `TRUNCATE <name> CASCADE;`
    pub fn truncate_statement(&self, table: &str) -> String {
        let mut truncate = Truncate::table(table);
        if self.dialect.supports_truncate_cascade() {
            truncate = truncate.cascade();
        }
        terminate(truncate.to_sql(&self.dialect))
    }

    /// `DROP TABLE <name>;`
    pub fn drop_statement(&self, table: &str) -> String {
        terminate(DropTable::new(table).to_sql(&self.dialect))
    }

    /// `SELECT * FROM <name>`
    pub fn select_all_statement(&self, table: &str) -> String {
        Query::from(table).to_sql(&self.dialect)
    }

    /// `SELECT <fields> FROM <name>`, where `fields` is `"*"` or a
    /// comma-separated column list.
    pub fn select_by_table(&self, table: &str, fields: &str) -> String {
        Query::from(table)
            .select(Projection::parse(fields))
            .to_sql(&self.dialect)
    }

    /// `SELECT <fields> FROM <name>` from a column slice. A slice naming no
    /// columns selects everything.
    pub fn select_fields(&self, table: &str, fields: &[&str]) -> String {
        Query::from(table)
            .select(Projection::columns(fields.iter().copied()))
            .to_sql(&self.dialect)
    }

    /// The statement a backend runs to read `table`.
    ///
    /// Relational reads select the declared fields positionally; the file
    /// backend reads the declared source directly.
    pub fn read_statement(&self, table: &TableDef, from_file: bool) -> Statement {
        if from_file {
            Statement::ReadFile(table.source.clone())
        } else {
            Statement::Sql(self.select_by_table(&table.name, "*"))
        }
    }

    /// One statement per table for `operation`.
    ///
    /// With [`TableOrder::Dependency`], create and insert visit referenced
    /// tables first while drop and delete visit them last.
    pub fn statements(
        &self,
        operation: Operation,
        schema: &SchemaModel,
        order: TableOrder,
    ) -> SchemaResult<StatementMap> {
        let mut tables = schema.ordered_tables(order)?;
        if order == TableOrder::Dependency && operation.reverses_dependencies() {
            tables.reverse();
        }

        Ok(tables
            .into_iter()
            .map(|table| {
                let sql = match operation {
                    Operation::CreateTable => self.create_table_statement(table),
                    Operation::InsertCsv => self.bulk_load_statement(table),
                    Operation::Drop => self.drop_statement(&table.name),
                    Operation::Delete => self.truncate_statement(&table.name),
                };
                (operation.key(&table.name), Statement::Sql(sql))
            })
            .collect())
    }

    pub fn create_tables(&self, schema: &SchemaModel, order: TableOrder) -> SchemaResult<StatementMap> {
        self.statements(Operation::CreateTable, schema, order)
    }

    pub fn insert_csv(&self, schema: &SchemaModel, order: TableOrder) -> SchemaResult<StatementMap> {
        self.statements(Operation::InsertCsv, schema, order)
    }

    pub fn drop_tables(&self, schema: &SchemaModel, order: TableOrder) -> SchemaResult<StatementMap> {
        self.statements(Operation::Drop, schema, order)
    }

    pub fn delete_contents(
        &self,
        schema: &SchemaModel,
        order: TableOrder,
    ) -> SchemaResult<StatementMap> {
        self.statements(Operation::Delete, schema, order)
    }

    fn resolve_source(&self, source: &Path) -> PathBuf {
        match &self.source_root {
            Some(root) if source.is_relative() => root.join(source),
            _ => source.to_path_buf(),
        }
    }
}

fn terminate(mut sql: String) -> String {
    sql.push(';');
    sql
}
