//! Declarative table schema.
//!
//! The schema document is a JSON file with one entry per table:
//!
//! ```json
//! {
//!   "tables": {
//!     "orders": {
//!       "fields": ["order_id", "customer_id"],
//!       "types": ["varchar", "varchar"],
//!       "primarykeys": ["order_id"],
//!       "foreignkeys": ["customer_id.customers.customer_id"],
//!       "source": "../data/olist_orders_dataset.csv"
//!     }
//!   }
//! }
//! ```
//!
//! Loading validates every table up front; a single malformed definition
//! rejects the whole document. The resulting [`SchemaModel`] is immutable
//! and iterates tables in document order.

mod order;
mod types;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

pub use order::TableOrder;
pub use types::SemanticType;

/// Errors raised while loading or querying a schema document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed JSON or has the wrong shape.
    #[error("malformed schema document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A table entry lacks a required key.
    #[error("table '{table}' is missing required field '{field}'")]
    MissingField { table: String, field: &'static str },

    /// `fields` and `types` differ in length.
    #[error("table '{table}' declares {fields} fields but {types} types")]
    LengthMismatch {
        table: String,
        fields: usize,
        types: usize,
    },

    /// A foreign key string is not of the form `column.table.column`.
    #[error("table '{table}' has malformed foreign key '{value}' (expected column.table.column)")]
    InvalidForeignKey { table: String, value: String },

    /// A key refers to a column that is not declared in `fields`.
    #[error("table '{table}' declares {kind} '{column}' which is not one of its fields")]
    UnknownKeyColumn {
        table: String,
        kind: &'static str,
        column: String,
    },

    /// The same column is declared as a foreign key twice.
    #[error("table '{table}' declares column '{column}' as a foreign key more than once")]
    DuplicateForeignKey { table: String, column: String },

    /// A field name appears twice in one table.
    #[error("table '{table}' declares field '{column}' more than once")]
    DuplicateField { table: String, column: String },

    /// The requested table is not part of the schema.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Foreign keys form a cycle, so no creation order exists.
    #[error("foreign keys form a cycle between tables: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A parsed `column.table.column` foreign key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Column in the declaring table.
    pub column: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column in `referenced_table`.
    pub referenced_column: String,
}

impl FromStr for ForeignKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').map(str::trim).collect();
        match parts.as_slice() {
            [column, table, referenced]
                if !column.is_empty() && !table.is_empty() && !referenced.is_empty() =>
            {
                Ok(ForeignKey {
                    column: column.to_string(),
                    referenced_table: table.to_string(),
                    referenced_column: referenced.to_string(),
                })
            }
            _ => Err(()),
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.column, self.referenced_table, self.referenced_column
        )
    }
}

/// How a column participates in key constraints.
///
/// A column has exactly one role. When a column is declared both as a
/// primary key and as a foreign key, the foreign key wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole<'a> {
    ForeignKey(&'a ForeignKey),
    PrimaryKey,
    Plain,
}

/// Definition of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Table name (the key in the schema document).
    pub name: String,
    /// Column names, in declared order.
    pub fields: Vec<String>,
    /// Backend-native type tokens, aligned 1:1 with `fields`.
    pub types: Vec<String>,
    /// Primary key columns, in declared order.
    pub primary_keys: Vec<String>,
    /// Foreign keys, in declared order.
    pub foreign_keys: Vec<ForeignKey>,
    /// Path of the delimited data file for this table.
    pub source: PathBuf,
}

impl TableDef {
    /// Iterate `(field, type)` pairs in declared order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.types.iter().map(String::as_str))
    }

    /// Foreign key declared on `column`, if any.
    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Whether `column` is declared as a primary key.
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_keys.iter().any(|pk| pk == column)
    }

    /// Classify a column. Foreign-key membership takes precedence over
    /// primary-key membership.
    pub fn role(&self, column: &str) -> ColumnRole<'_> {
        if let Some(fk) = self.foreign_key(column) {
            ColumnRole::ForeignKey(fk)
        } else if self.is_primary_key(column) {
            ColumnRole::PrimaryKey
        } else {
            ColumnRole::Plain
        }
    }

    /// Semantic types of the columns, aligned with `fields`.
    pub fn semantic_types(&self) -> Vec<SemanticType> {
        self.types.iter().map(|t| SemanticType::parse(t)).collect()
    }

    /// Tables this table references through foreign keys, deduplicated,
    /// in declaration order.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for fk in &self.foreign_keys {
            if !out.contains(&fk.referenced_table.as_str()) {
                out.push(&fk.referenced_table);
            }
        }
        out
    }
}

/// The whole schema: every table keyed by name, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaModel {
    tables: IndexMap<String, TableDef>,
}

/// On-disk shape of the document, before validation.
#[derive(Debug, Deserialize)]
struct RawSchema {
    tables: IndexMap<String, RawTableDef>,
}

#[derive(Debug, Deserialize)]
struct RawTableDef {
    fields: Option<Vec<String>>,
    types: Option<Vec<String>>,
    #[serde(default)]
    primarykeys: Vec<String>,
    #[serde(default)]
    foreignkeys: Vec<String>,
    source: Option<String>,
}

impl SchemaModel {
    /// Load and validate a schema document from disk.
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            tables = schema.len(),
            "schema loaded"
        );
        Ok(schema)
    }

    /// Parse and validate a schema document held in memory.
    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let raw: RawSchema = serde_json::from_str(content)?;
        let mut tables = IndexMap::with_capacity(raw.tables.len());
        for (name, def) in raw.tables {
            let table = validate_table(&name, def)?;
            tables.insert(name, table);
        }
        Ok(Self { tables })
    }

    /// Look up a table by name.
    pub fn table(&self, name: &str) -> SchemaResult<&TableDef> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    /// Iterate tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    /// Table names in document order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn validate_table(name: &str, raw: RawTableDef) -> SchemaResult<TableDef> {
    let missing = |field: &'static str| SchemaError::MissingField {
        table: name.to_string(),
        field,
    };

    let fields = raw.fields.ok_or_else(|| missing("fields"))?;
    let types = raw.types.ok_or_else(|| missing("types"))?;
    let source = raw.source.ok_or_else(|| missing("source"))?;

    if fields.len() != types.len() {
        return Err(SchemaError::LengthMismatch {
            table: name.to_string(),
            fields: fields.len(),
            types: types.len(),
        });
    }

    for (idx, field) in fields.iter().enumerate() {
        if fields[..idx].contains(field) {
            return Err(SchemaError::DuplicateField {
                table: name.to_string(),
                column: field.clone(),
            });
        }
    }

    // `[""]` is the document's way of saying "no keys".
    let primary_keys: Vec<String> = raw
        .primarykeys
        .into_iter()
        .map(|pk| pk.trim().to_string())
        .filter(|pk| !pk.is_empty())
        .collect();

    for pk in &primary_keys {
        if !fields.contains(pk) {
            return Err(SchemaError::UnknownKeyColumn {
                table: name.to_string(),
                kind: "primary key",
                column: pk.clone(),
            });
        }
    }

    let mut foreign_keys: Vec<ForeignKey> = Vec::new();
    for value in raw.foreignkeys.iter().filter(|v| !v.trim().is_empty()) {
        let fk: ForeignKey = value
            .parse()
            .map_err(|_| SchemaError::InvalidForeignKey {
                table: name.to_string(),
                value: value.clone(),
            })?;

        if !fields.contains(&fk.column) {
            return Err(SchemaError::UnknownKeyColumn {
                table: name.to_string(),
                kind: "foreign key",
                column: fk.column,
            });
        }
        if foreign_keys.iter().any(|existing| existing.column == fk.column) {
            return Err(SchemaError::DuplicateForeignKey {
                table: name.to_string(),
                column: fk.column,
            });
        }
        if primary_keys.contains(&fk.column) {
            tracing::warn!(
                table = %name,
                column = %fk.column,
                "column declared as both primary and foreign key; emitting it as a foreign key"
            );
        }
        foreign_keys.push(fk);
    }

    Ok(TableDef {
        name: name.to_string(),
        fields,
        types,
        primary_keys,
        foreign_keys,
        source: PathBuf::from(source),
    })
}
