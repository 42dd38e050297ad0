//! Semantic classification of backend-native column type tokens.
//!
//! The schema document carries PostgreSQL type tokens verbatim (they are
//! emitted as-is into CREATE TABLE). Reading a table needs to know what kind
//! of scalar each column holds, so the tokens are mapped onto a small set of
//! semantic types here.

use std::fmt;

use serde::Serialize;

/// What kind of scalar a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Text,
    Integer,
    Float,
    Timestamp,
    Boolean,
    /// Type token not recognized; cell values are typed by inspection.
    Unknown,
}

impl SemanticType {
    /// Classify a type token such as `varchar`, `varchar(32)`, `int4`,
    /// `double precision` or `timestamp without time zone`.
    pub fn parse(token: &str) -> Self {
        let s = token.trim().to_lowercase();
        // Drop length/precision parameters: varchar(50), numeric(10,2)
        let base = match s.find('(') {
            Some(idx) => s[..idx].trim_end(),
            None => s.as_str(),
        };

        match base {
            "text" | "varchar" | "character varying" | "char" | "character" | "bpchar"
            | "string" | "uuid" | "name" => SemanticType::Text,

            "smallint" | "int" | "integer" | "bigint" | "int2" | "int4" | "int8" | "serial"
            | "bigserial" | "smallserial" => SemanticType::Integer,

            "real" | "float" | "float4" | "float8" | "double" | "double precision"
            | "numeric" | "decimal" | "money" => SemanticType::Float,

            "date" | "timestamp" | "timestamptz" | "datetime" | "timestamp without time zone"
            | "timestamp with time zone" => SemanticType::Timestamp,

            "bool" | "boolean" => SemanticType::Boolean,

            _ => SemanticType::Unknown,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Text => "text",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Boolean => "boolean",
            SemanticType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
