//! Normalized tabular results.
//!
//! Every read, whichever backend served it, ends up as a [`Table`]: named
//! columns in declared order, each holding values of one semantic type.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::schema::SemanticType;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Parse a raw text cell as `kind`. Returns `None` when the text is not
    /// a valid value of that kind.
    pub fn parse(raw: &str, kind: SemanticType) -> Option<Value> {
        let s = raw.trim();
        match kind {
            SemanticType::Text | SemanticType::Unknown => Some(Value::Text(raw.to_string())),
            SemanticType::Integer => s.parse::<i64>().ok().map(Value::Int),
            SemanticType::Float => s.parse::<f64>().ok().map(Value::Float),
            SemanticType::Timestamp => parse_timestamp(s).map(Value::Timestamp),
            SemanticType::Boolean => match s.to_ascii_lowercase().as_str() {
                "t" | "true" | "y" | "yes" | "1" => Some(Value::Bool(true)),
                "f" | "false" | "n" | "no" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One named column of uniformly typed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: SemanticType,
    pub values: Vec<Value>,
}

impl Column {
    /// Type raw cells. Empty and missing cells become [`Value::Null`].
    ///
    /// A declared kind is used when every non-null cell parses as that kind;
    /// otherwise the column is typed by inspection (integer, float,
    /// timestamp, then text).
    pub fn from_cells(name: impl Into<String>, declared: SemanticType, cells: Vec<Option<String>>) -> Self {
        let name = name.into();
        let kind = if declared != SemanticType::Unknown && fits(&cells, declared) {
            declared
        } else {
            let inferred = infer(&cells);
            if declared != SemanticType::Unknown {
                tracing::debug!(
                    column = %name,
                    declared = %declared,
                    inferred = %inferred,
                    "cells do not match declared type"
                );
            }
            inferred
        };

        let values = cells
            .into_iter()
            .map(|cell| match cell {
                Some(raw) if !raw.is_empty() => {
                    Value::parse(&raw, kind).unwrap_or(Value::Text(raw))
                }
                _ => Value::Null,
            })
            .collect();

        Self { name, kind, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }
}

fn non_null(cells: &[Option<String>]) -> impl Iterator<Item = &str> {
    cells
        .iter()
        .filter_map(|c| c.as_deref())
        .filter(|c| !c.is_empty())
}

fn fits(cells: &[Option<String>], kind: SemanticType) -> bool {
    non_null(cells).all(|c| Value::parse(c, kind).is_some())
}

fn infer(cells: &[Option<String>]) -> SemanticType {
    if non_null(cells).next().is_none() {
        return SemanticType::Text;
    }
    [
        SemanticType::Integer,
        SemanticType::Float,
        SemanticType::Timestamp,
    ]
    .into_iter()
    .find(|&kind| fits(cells, kind))
    .unwrap_or(SemanticType::Text)
}

/// A normalized table, owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from positional text rows.
    ///
    /// `names` and `kinds` must have the same length; each row is assigned
    /// to columns by position and short rows are padded with nulls.
    pub fn from_rows(
        name: impl Into<String>,
        names: &[String],
        kinds: &[SemanticType],
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        let mut cells: Vec<Vec<Option<String>>> =
            names.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            let mut row = row.into_iter();
            for column in cells.iter_mut() {
                column.push(row.next().flatten());
            }
        }

        let columns = names
            .iter()
            .zip(cells)
            .enumerate()
            .map(|(idx, (name, cells))| {
                let kind = kinds.get(idx).copied().unwrap_or(SemanticType::Unknown);
                Column::from_cells(name.clone(), kind, cells)
            })
            .collect();

        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Values of one row, in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().filter_map(|c| c.get(idx)).collect())
    }

    /// A copy holding at most the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    kind: c.kind,
                    values: c.values.iter().take(n).cloned().collect(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().map(Value::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&rendered)
            .map(|(c, vals)| {
                vals.iter()
                    .map(|v| v.chars().count())
                    .chain(std::iter::once(c.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.name, w = *w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in 0..self.num_rows() {
            let cells: Vec<String> = rendered
                .iter()
                .zip(&widths)
                .map(|(vals, w)| format!("{:<w$}", vals[row], w = *w))
                .collect();
            writeln!(f, "{}", cells.join(" | ").trim_end())?;
        }
        Ok(())
    }
}
