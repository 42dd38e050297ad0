//! SELECT query builder.
//!
//! Table reads only ever need a projection over a single table, so the
//! builder covers exactly that: `SELECT * FROM t` or
//! `SELECT a, b FROM t`.

use super::dialect::SqlDialect;
use super::token::{Token, TokenStream};

/// Projection list of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// Explicit column list, in order.
    Columns(Vec<String>),
}

impl Projection {
    /// Parse a projection from the textual field list form used by callers:
    /// `"*"` selects everything, otherwise the string is split on commas.
    pub fn parse(fields: &str) -> Self {
        if fields.trim() == "*" {
            return Projection::All;
        }
        Self::columns(fields.split(','))
    }

    /// Project the given column names, ignoring blank entries. A list naming
    /// no columns selects everything.
    pub fn columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let columns: Vec<String> = names
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        }
    }
}

/// SELECT query over one table.
#[derive(Debug, Clone)]
#[must_use = "queries have no effect until converted to SQL with to_sql()"]
pub struct Query {
    pub projection: Projection,
    pub from: String,
}

impl Query {
    /// `SELECT * FROM <table>`.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            projection: Projection::All,
            from: table.into(),
        }
    }

    /// Replace the projection.
    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, _dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Select).space();

        match &self.projection {
            Projection::All => {
                ts.push(Token::Star);
            }
            Projection::Columns(cols) => {
                let mut first = true;
                for col in cols {
                    if !first {
                        ts.comma().space();
                    }
                    first = false;
                    ts.push(Token::Ident(col.clone()));
                }
            }
        }

        ts.space()
            .push(Token::From)
            .space()
            .push(Token::Ident(self.from.clone()));
        ts
    }
}
