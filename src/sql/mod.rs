//! SQL generation module.
//!
//! A small type-safe SQL builder producing PostgreSQL statement text:
//!
//! - [`query`] - SELECT over a single table
//! - [`ddl`] - CREATE TABLE, DROP TABLE, TRUNCATE
//! - [`dml`] - bulk load (`COPY ... FROM`)
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - identifier and literal quoting rules

pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod query;
pub mod token;


pub use dialect::{Postgres, SqlDialect};
pub use query::{Projection, Query};
pub use token::{Token, TokenStream};

pub use ddl::{ColumnConstraint, ColumnDef, CreateTable, DropTable, Truncate};
pub use dml::CopyFrom;
