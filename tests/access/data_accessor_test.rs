use datamart::access::{AccessError, DataAccessor};
use datamart::backend::{BackendError, BackendResult, FileBackend, RowSet, StorageBackend};
use datamart::config::{ConfigError, ConfigRoot, RuntimeConfig};
use datamart::schema::{SchemaModel, TableDef};
use datamart::statement::Statement;
use datamart::table::Value;
use std::cell::RefCell;
use std::fs;
use std::path::Path;

const SCHEMA: &str = r#"{"tables": {
    "orders": {
        "fields": ["order_id", "customer_id", "order_purchase_timestamp"],
        "types": ["varchar", "varchar", "timestamp"],
        "primarykeys": ["order_id"],
        "foreignkeys": ["customer_id.customers.customer_id"],
        "source": "../data/orders.csv"
    },
    "customers": {
        "fields": ["customer_id", "customer_zip_code_prefix"],
        "types": ["varchar", "int"],
        "primarykeys": ["customer_id"],
        "foreignkeys": [""],
        "source": "../data/customers.csv"
    }
}}"#;

/// Relational stand-in that records the statements it is asked to read.
#[derive(Debug, Default)]
struct RecordingBackend {
    reads: RefCell<Vec<String>>,
}

impl StorageBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn execute(&self, _statement: &Statement) -> BackendResult<()> {
        Ok(())
    }

    fn read(&self, _table: &TableDef, statement: &Statement) -> BackendResult<RowSet> {
        self.reads.borrow_mut().push(statement.to_string());
        Ok(RowSet {
            header: None,
            rows: vec![
                vec![Some("c1".into()), Some("14409".into())],
                vec![Some("c2".into()), Some("9790".into())],
            ],
        })
    }
}

/// Lay out `<tmp>/config/{program.json,db.json}` and `<tmp>/data/*.csv`.
fn project(program: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config");
    let data = dir.path().join("data");
    fs::create_dir_all(&config).unwrap();
    fs::create_dir_all(&data).unwrap();

    fs::write(config.join("program.json"), program).unwrap();
    fs::write(config.join("db.json"), SCHEMA).unwrap();
    fs::write(
        data.join("orders.csv"),
        "order_id,customer_id,order_purchase_timestamp\n\
         e481f51c,9ef432eb,2017-10-02 10:56:33\n\
         53cdb2fc,b0830fb4,2018-07-24 20:41:37\n",
    )
    .unwrap();
    fs::write(
        data.join("customers.csv"),
        "id,zip\nc1,14409\nc2,\n",
    )
    .unwrap();
    dir
}

fn root(dir: &Path) -> ConfigRoot {
    ConfigRoot::new(dir.join("config"))
}

#[test]
fn test_csv_table_from_config_root() {
    let dir = project(r#"{"datasource": "csv", "db": {}}"#);
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();

    let orders = accessor.get_table("orders").unwrap();
    assert_eq!(
        orders.column_names(),
        vec!["order_id", "customer_id", "order_purchase_timestamp"]
    );
    assert_eq!(orders.num_rows(), 2);
    let ts = orders.column("order_purchase_timestamp").unwrap();
    assert_eq!(ts.values[0].to_string(), "2017-10-02 10:56:33");
    assert!(ts.values[0].as_timestamp().is_some());
}

#[test]
fn test_csv_header_mismatch_uses_declared_names() {
    let dir = project(r#"{"datasource": "csv"}"#);
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();

    let customers = accessor.get_table("customers").unwrap();
    assert_eq!(
        customers.column_names(),
        vec!["customer_id", "customer_zip_code_prefix"]
    );
    let zip = customers.column("customer_zip_code_prefix").unwrap();
    assert_eq!(zip.values, vec![Value::Int(14409), Value::Null]);
}

#[test]
fn test_csv_reordered_columns_keep_their_values() {
    let dir = project(r#"{"datasource": "csv"}"#);
    fs::write(
        dir.path().join("data/orders.csv"),
        "customer_id,order_purchase_timestamp,order_id\n9ef432eb,2017-10-02 10:56:33,e481f51c\n",
    )
    .unwrap();
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();

    let orders = accessor.get_table("orders").unwrap();
    assert_eq!(
        orders.column("order_id").unwrap().values,
        vec![Value::Text("e481f51c".into())]
    );
    assert_eq!(
        orders.column("customer_id").unwrap().values,
        vec![Value::Text("9ef432eb".into())]
    );
}

#[test]
fn test_csv_wider_than_declared_is_an_error() {
    let dir = project(r#"{"datasource": "csv"}"#);
    fs::write(
        dir.path().join("data/customers.csv"),
        "customer_zip_code_prefix,customer_id,customer_state\n14409,c1,SP\n",
    )
    .unwrap();
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();

    let err = accessor.get_table("customers").unwrap_err();
    assert!(matches!(
        err,
        AccessError::Backend(BackendError::Shape { row: 0, expected: 2, found: 3, .. })
    ));
}

#[test]
fn test_csv_mode_never_touches_relational_backend() {
    let dir = project(r#"{"datasource": "csv"}"#);
    let relational = RecordingBackend::default();
    let accessor = DataAccessor::with_backends(
        RuntimeConfig::from_json_str(r#"{"datasource": "csv"}"#).unwrap(),
        SchemaModel::from_json_str(SCHEMA).unwrap(),
        FileBackend::new(dir.path().join("config")),
        Some(&relational),
    );

    accessor.get_table("orders").unwrap();
    accessor.get_table("customers").unwrap();
    assert!(relational.reads.borrow().is_empty());
}

#[test]
fn test_postgres_mode_selects_and_renames_positionally() {
    let dir = tempfile::tempdir().unwrap();
    let relational = RecordingBackend::default();
    let accessor = DataAccessor::with_backends(
        RuntimeConfig::from_json_str(r#"{"datasource": "postgres"}"#).unwrap(),
        SchemaModel::from_json_str(SCHEMA).unwrap(),
        FileBackend::new(dir.path()),
        Some(&relational),
    );

    let customers = accessor.get_table("customers").unwrap();
    assert_eq!(*relational.reads.borrow(), vec!["SELECT * FROM customers"]);
    assert_eq!(
        customers.column_names(),
        vec!["customer_id", "customer_zip_code_prefix"]
    );
    assert_eq!(
        customers.row(1).unwrap(),
        vec![&Value::Text("c2".into()), &Value::Int(9790)]
    );
}

#[test]
fn test_each_call_returns_a_fresh_table() {
    let dir = project(r#"{"datasource": "csv"}"#);
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();
    let first = accessor.get_table("orders").unwrap();
    let second = accessor.get_table("orders").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unsupported_datasource_returns_no_table() {
    let dir = project(r#"{"datasource": "excel"}"#);
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();

    let err = accessor.get_table("orders").unwrap_err();
    assert!(matches!(
        err,
        AccessError::Config(ConfigError::UnsupportedDataSource(ref v)) if v == "excel"
    ));
}

#[test]
fn test_unknown_table() {
    let dir = project(r#"{"datasource": "csv"}"#);
    let accessor = DataAccessor::from_config_root(&root(dir.path())).unwrap();
    assert!(matches!(
        accessor.get_table("payments").unwrap_err(),
        AccessError::Schema(_)
    ));
}

#[test]
fn test_postgres_without_connection_section() {
    let dir = project(r#"{"datasource": "postgres"}"#);
    fs::write(
        dir.path().join("config/database.ini"),
        "[mysql]\nhost = localhost\n",
    )
    .unwrap();

    let err = DataAccessor::from_config_root(&root(dir.path())).unwrap_err();
    assert!(matches!(
        err,
        AccessError::Config(ConfigError::SectionNotFound { ref section, .. }) if section == "postgresql"
    ));
}
