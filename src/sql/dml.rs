//! DML (Data Manipulation Language) support.
//!
//! Only bulk loading is needed: the PostgreSQL `COPY ... FROM` form that
//! reads a comma-delimited file with a header row on the server side.

use super::dialect::SqlDialect;
use super::token::{Token, TokenStream};

/// `COPY <table> FROM '<file>' DELIMITER ',' CSV HEADER` statement.
#[derive(Debug, Clone)]
#[must_use = "DML statements have no effect until converted to SQL with to_sql()"]
pub struct CopyFrom {
    pub table: String,
    pub source: String,
}

impl CopyFrom {
    pub fn new(table: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            source: source.into(),
        }
    }

    /// Convert to SQL for the given dialect.
    pub fn to_sql(&self, dialect: &dyn SqlDialect) -> String {
        self.to_tokens(dialect).serialize(dialect)
    }

    /// Convert to token stream.
    pub fn to_tokens(&self, _dialect: &dyn SqlDialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Copy)
            .space()
            .push(Token::Ident(self.table.clone()))
            .space()
            .push(Token::From)
            .space()
            .push(Token::LitString(self.source.clone()))
            .space()
            .push(Token::Delimiter)
            .space()
            .push(Token::LitString(",".to_string()))
            .space()
            .push(Token::Csv)
            .space()
            .push(Token::Header);

        ts
    }
}
