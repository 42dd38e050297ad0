//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used here:
//! - ANSI identifier quoting (`"`), applied only when an identifier is not a
//!   plain lowercase name or collides with a reserved word
//! - `TRUNCATE ... CASCADE`
//! - `COPY ... FROM '<file>' DELIMITER ',' CSV HEADER`

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double_if_needed(ident)
    }

    fn supports_truncate_cascade(&self) -> bool {
        true
    }
}
