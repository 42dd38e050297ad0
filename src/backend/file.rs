//! Flat-file backend.

use std::fs;
use std::path::{Path, PathBuf};

use super::csv;
use super::{BackendError, BackendResult, RowSet, StorageBackend};
use crate::schema::TableDef;
use crate::statement::Statement;

/// Reads tables straight from their delimited `source` files.
///
/// Relative sources resolve against `data_dir`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where the file for `table` lives.
    pub fn source_path(&self, table: &TableDef) -> PathBuf {
        if table.source.is_absolute() {
            table.source.clone()
        } else {
            self.data_dir.join(&table.source)
        }
    }
}

impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn execute(&self, statement: &Statement) -> BackendResult<()> {
        tracing::warn!(statement = %statement.preview(), "file backend cannot execute statements");
        Err(BackendError::Unsupported {
            backend: self.name(),
            operation: "statement execution",
        })
    }

    /// Reads the table's declared source; the statement is not consulted.
    #[tracing::instrument(skip(self, table, _statement), fields(table = %table.name))]
    fn read(&self, table: &TableDef, _statement: &Statement) -> BackendResult<RowSet> {
        let path = self.source_path(table);
        tracing::info!(path = %path.display(), "reading table from file");

        let content = fs::read_to_string(&path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "failed to read data file");
            BackendError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let records = csv::parse(&content, ',', true).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to parse data file");
            BackendError::Parse {
                path: path.clone(),
                line: e.line,
                message: e.message,
            }
        })?;

        let columns = match &records.header {
            Some(header) => header_columns(table, header)?,
            None => (0..table.fields.len()).collect(),
        };
        let width = table.fields.len();

        let mut rows = Vec::with_capacity(records.rows.len());
        for (idx, mut record) in records.rows.into_iter().enumerate() {
            if record.len() != width {
                return Err(BackendError::Shape {
                    table: table.name.clone(),
                    row: idx + 1,
                    expected: width,
                    found: record.len(),
                });
            }
            rows.push(
                columns
                    .iter()
                    .map(|&col| {
                        let cell = std::mem::take(&mut record[col]);
                        (!cell.is_empty()).then_some(cell)
                    })
                    .collect(),
            );
        }
        let header = records
            .header
            .map(|header| columns.iter().map(|&col| header[col].clone()).collect());

        tracing::debug!(rows = rows.len(), "file read complete");
        Ok(RowSet { header, rows })
    }
}

/// Index of the file column feeding each declared field, in declared order.
///
/// Headers naming every declared field are matched by name. A header sharing
/// no name with the declared fields is taken positionally. Anything else, and
/// any width other than the declared field count, is rejected.
fn header_columns(table: &TableDef, header: &[String]) -> BackendResult<Vec<usize>> {
    if header.len() != table.fields.len() {
        tracing::error!(
            file_columns = ?header,
            declared = ?table.fields,
            "source header width differs from declared fields"
        );
        return Err(BackendError::Shape {
            table: table.name.clone(),
            row: 0,
            expected: table.fields.len(),
            found: header.len(),
        });
    }

    let positions: Vec<Option<usize>> = table
        .fields
        .iter()
        .map(|field| header.iter().position(|name| name.trim() == field))
        .collect();

    if positions.iter().all(Option::is_none) {
        return Ok((0..header.len()).collect());
    }

    positions
        .into_iter()
        .zip(&table.fields)
        .map(|(pos, field)| {
            pos.ok_or_else(|| {
                tracing::error!(column = %field, file_columns = ?header, "declared field missing from source header");
                BackendError::MissingColumn {
                    table: table.name.clone(),
                    column: field.clone(),
                }
            })
        })
        .collect()
}
