//! Relational backend with per-call sessions.

use super::{BackendError, BackendResult, PgConnector, RowSet, StorageBackend};
use crate::config::ConnectionParams;
use crate::schema::TableDef;
use crate::statement::Statement;

/// One open database session. Dropping it closes the connection.
pub trait Session {
    /// Run `sql` inside a transaction and commit it.
    fn execute(&mut self, sql: &str) -> BackendResult<()>;

    /// Run `sql` and fetch every row as text cells.
    fn query(&mut self, sql: &str) -> BackendResult<Vec<Vec<Option<String>>>>;
}

/// Opens sessions.
pub trait Connector {
    type Session: Session;

    /// Open a new session.
    fn connect(&self) -> BackendResult<Self::Session>;

    /// Where sessions connect to, for logs. Must not contain credentials.
    fn target(&self) -> String;
}

/// Runs SQL statements, opening a fresh session for every call.
///
/// Sessions are never shared or pooled: each [`execute`](StorageBackend::execute)
/// and [`read`](StorageBackend::read) opens one, uses it and drops it before
/// returning, whether the statement succeeded or not.
#[derive(Debug)]
pub struct RelationalBackend<C: Connector = PgConnector> {
    connector: C,
}

impl RelationalBackend<PgConnector> {
    /// PostgreSQL backend for the given connection parameters.
    pub fn postgres(params: &ConnectionParams) -> BackendResult<Self> {
        Ok(Self::new(PgConnector::new(params)?))
    }
}

impl<C: Connector> RelationalBackend<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn open(&self) -> BackendResult<C::Session> {
        let target = self.connector.target();
        tracing::info!(target = %target, "connecting to the database");
        self.connector.connect().inspect_err(|e| {
            tracing::error!(target = %target, error = %e, "database connection failed");
        })
    }

    fn sql<'s>(&self, statement: &'s Statement) -> BackendResult<&'s str> {
        statement.as_sql().ok_or(BackendError::Unsupported {
            backend: "relational",
            operation: "file reads",
        })
    }
}

impl<C: Connector> StorageBackend for RelationalBackend<C> {
    fn name(&self) -> &'static str {
        "relational"
    }

    #[tracing::instrument(skip(self, statement), fields(sql_preview = %statement.preview()))]
    fn execute(&self, statement: &Statement) -> BackendResult<()> {
        let sql = self.sql(statement)?;
        let mut session = self.open()?;
        let result = session.execute(sql);
        drop(session);
        tracing::debug!("database connection closed");

        match &result {
            Ok(()) => tracing::debug!("statement committed"),
            Err(e) => tracing::error!(error = %e, "statement failed"),
        }
        result
    }

    #[tracing::instrument(
        skip(self, table, statement),
        fields(table = %table.name, sql_preview = %statement.preview())
    )]
    fn read(&self, table: &TableDef, statement: &Statement) -> BackendResult<RowSet> {
        let sql = self.sql(statement)?;
        let mut session = self.open()?;
        let result = session.query(sql);
        drop(session);
        tracing::debug!("database connection closed");

        let rows = result.inspect_err(|e| tracing::error!(error = %e, "query failed"))?;

        let expected = table.fields.len();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            let err = BackendError::Shape {
                table: table.name.clone(),
                row: idx + 1,
                expected,
                found: row.len(),
            };
            tracing::error!(error = %err, "result does not match declared fields");
            return Err(err);
        }

        tracing::debug!(rows = rows.len(), "query complete");
        Ok(RowSet { header: None, rows })
    }
}
