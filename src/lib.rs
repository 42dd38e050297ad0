//! # Datamart
//!
//! Schema-driven data access and statement generation for a fixed
//! relational dataset.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Schema document (db.json)                   │
//! │  (tables, fields, types, primary/foreign keys, sources)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SchemaModel                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [statement::factory + sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Statements (CREATE / COPY / TRUNCATE / DROP / SELECT)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [backend]
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │       FileBackend        │   │    RelationalBackend     │
//! │     (delimited files)    │   │      (PostgreSQL)        │
//! └──────────────────────────┘   └──────────────────────────┘
//!                          │
//!                          ▼ [access / lifecycle]
//! ┌─────────────────────────────────────────────────────────┐
//! │   DataAccessor::get_table    SchemaLifecycleController   │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod backend;
pub mod config;
pub mod lifecycle;
pub mod schema;
pub mod sql;
pub mod statement;
pub mod table;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::access::{AccessError, AccessResult, DataAccessor};
    pub use crate::backend::{
        BackendError, BackendResult, Connector, FileBackend, PgConnector, RelationalBackend,
        RowSet, Session, StorageBackend,
    };
    pub use crate::config::{
        ConfigError, ConfigRoot, ConnectionParams, DataSource, LifecycleFlags, RuntimeConfig,
    };
    pub use crate::lifecycle::{LifecycleReport, Phase, PhaseReport, SchemaLifecycleController};
    pub use crate::schema::{
        ColumnRole, ForeignKey, SchemaError, SchemaModel, SemanticType, TableDef, TableOrder,
    };
    pub use crate::statement::{Operation, Statement, StatementFactory, StatementMap};
    pub use crate::table::{Column, Table, Value};
}

pub use access::DataAccessor;
pub use lifecycle::SchemaLifecycleController;
pub use schema::SchemaModel;
pub use statement::{Statement, StatementFactory};
pub use table::Table;
