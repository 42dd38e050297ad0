//! SQL Dialect definitions and formatting rules.
//!
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//! identifier quoting and string literal quoting. Statements are only ever
//! executed against PostgreSQL, so that is the one implementation.

pub mod helpers;
mod postgres;

pub use postgres::Postgres;

/// SQL dialect trait - defines how SQL constructs are rendered.
pub trait SqlDialect: std::fmt::Debug {
    /// Quote an identifier (table, column) if the dialect requires it.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Whether `TRUNCATE ... CASCADE` is understood.
    fn supports_truncate_cascade(&self) -> bool {
        false
    }
}
