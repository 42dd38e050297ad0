//! Executable statements.
//!
//! A [`Statement`] is what the [`factory`] hands to a storage backend. For a
//! relational backend it is plain SQL text; for the file backend it is a
//! direct instruction to read a delimited file.

pub mod factory;

use std::fmt;
use std::path::{Path, PathBuf};

pub use factory::{Operation, StatementFactory, StatementMap};

/// An immutable, backend-specific executable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// SQL text for a relational backend.
    Sql(String),
    /// Read the delimited file at this path.
    ReadFile(PathBuf),
}

impl Statement {
    /// SQL text, if this is a SQL statement.
    pub fn as_sql(&self) -> Option<&str> {
        match self {
            Statement::Sql(sql) => Some(sql),
            Statement::ReadFile(_) => None,
        }
    }

    /// File path, if this is a file read.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Statement::ReadFile(path) => Some(path),
            Statement::Sql(_) => None,
        }
    }

    /// Short form for log fields.
    pub fn preview(&self) -> String {
        match self {
            Statement::Sql(sql) => sql.chars().take(100).collect(),
            Statement::ReadFile(path) => format!("read {}", path.display()),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Sql(sql) => f.write_str(sql),
            Statement::ReadFile(path) => write!(f, "-- read {}", path.display()),
        }
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::Sql(sql)
    }
}
