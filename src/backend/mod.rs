//! Storage backends.
//!
//! A backend either executes a [`Statement`] or reads the rows of one table.
//! Two implementations exist:
//!
//! - [`FileBackend`] reads a table's delimited `source` file and cannot
//!   execute anything.
//! - [`RelationalBackend`] runs SQL against a database, opening a fresh
//!   session for every call and closing it before returning.
//!
//! Rows come back as raw text; typing and column naming happen in
//! [`crate::access`].

pub mod csv;
mod error;
mod file;
mod postgres;
mod relational;

pub use error::{BackendError, BackendResult};
pub use file::FileBackend;
pub use postgres::{PgConnector, PgSession};
pub use relational::{Connector, RelationalBackend, Session};

use crate::schema::TableDef;
use crate::statement::Statement;

/// Raw rows returned by a backend read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    /// Column names reported by the source, if it has any. Relational reads
    /// are positional and leave this empty.
    pub header: Option<Vec<String>>,
    /// Cell text, `None` for SQL NULL or an empty file cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Something that can execute statements and read tables.
pub trait StorageBackend {
    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// Run a statement for its effect.
    fn execute(&self, statement: &Statement) -> BackendResult<()>;

    /// Read the rows of `table` using `statement`.
    fn read(&self, table: &TableDef, statement: &Statement) -> BackendResult<RowSet>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn execute(&self, statement: &Statement) -> BackendResult<()> {
        (**self).execute(statement)
    }

    fn read(&self, table: &TableDef, statement: &Statement) -> BackendResult<RowSet> {
        (**self).read(table, statement)
    }
}
