use datamart::backend::{BackendError, FileBackend, StorageBackend};
use datamart::schema::SchemaModel;
use datamart::statement::Statement;
use std::fs;

const SCHEMA: &str = r#"{"tables": {"sellers": {
    "fields": ["seller_id", "seller_zip_code_prefix", "seller_city", "seller_state"],
    "types": ["varchar", "int", "varchar", "varchar"],
    "primarykeys": ["seller_id"],
    "foreignkeys": [""],
    "source": "data/sellers.csv"
}}}"#;

fn setup(csv: &str) -> (tempfile::TempDir, SchemaModel) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/sellers.csv"), csv).unwrap();
    (dir, SchemaModel::from_json_str(SCHEMA).unwrap())
}

#[test]
fn test_reads_source_relative_to_data_dir() {
    let (dir, schema) = setup(
        "seller_id,seller_zip_code_prefix,seller_city,seller_state\n\
         3442f8959a84dea7ee197c632cb2df15,13023,campinas,SP\n\
         d1b65fc7debc3361ea86b5f14c68d2e2,13844,\"mogi guacu\",SP\n",
    );
    let backend = FileBackend::new(dir.path());
    let sellers = schema.table("sellers").unwrap();

    // The statement is ignored; the declared source is read.
    let rows = backend
        .read(sellers, &Statement::Sql("SELECT 1".into()))
        .unwrap();
    assert_eq!(rows.header.as_ref().unwrap().len(), 4);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.rows[1][2].as_deref(), Some("mogi guacu"));
}

#[test]
fn test_empty_cells_are_none() {
    let (dir, schema) = setup("seller_id,seller_zip_code_prefix,seller_city,seller_state\ns1,,,SP\n");
    let rows = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap();
    assert_eq!(rows.rows[0], vec![Some("s1".to_string()), None, None, Some("SP".to_string())]);
}

#[test]
fn test_ragged_row_is_shape_error() {
    let (dir, schema) = setup("seller_id,seller_zip_code_prefix,seller_city,seller_state\ns1,1,x\n");
    let err = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap_err();
    assert!(matches!(err, BackendError::Shape { row: 1, expected: 4, found: 3, .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let schema = SchemaModel::from_json_str(SCHEMA).unwrap();
    let err = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap_err();
    assert!(matches!(err, BackendError::Io { .. }));
    assert!(!err.is_connectivity());
}

#[test]
fn test_execute_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileBackend::new(dir.path())
        .execute(&Statement::Sql("DROP TABLE sellers;".into()))
        .unwrap_err();
    assert!(matches!(err, BackendError::Unsupported { backend: "file", .. }));
}

#[test]
fn test_reordered_header_maps_columns_by_name() {
    let (dir, schema) = setup(
        "seller_city,seller_state,seller_id,seller_zip_code_prefix\n\
         campinas,SP,s1,13023\n",
    );
    let rows = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap();
    assert_eq!(
        rows.header.unwrap(),
        vec!["seller_id", "seller_zip_code_prefix", "seller_city", "seller_state"]
    );
    assert_eq!(
        rows.rows[0],
        vec![
            Some("s1".to_string()),
            Some("13023".to_string()),
            Some("campinas".to_string()),
            Some("SP".to_string()),
        ]
    );
}

#[test]
fn test_extra_source_column_is_shape_error() {
    let (dir, schema) = setup(
        "seller_id,seller_zip_code_prefix,seller_city,seller_state,seller_country\n\
         s1,13023,campinas,SP,BR\n",
    );
    let err = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap_err();
    assert!(matches!(err, BackendError::Shape { row: 0, expected: 4, found: 5, .. }));
}

#[test]
fn test_header_missing_declared_field_is_rejected() {
    let (dir, schema) = setup(
        "seller_id,seller_zip_code_prefix,seller_city,state\n\
         s1,13023,campinas,SP\n",
    );
    let err = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap_err();
    match err {
        BackendError::MissingColumn { table, column } => {
            assert_eq!(table, "sellers");
            assert_eq!(column, "seller_state");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unrelated_header_is_read_positionally() {
    let (dir, schema) = setup("id,zip,city,state\ns1,13023,campinas,SP\n");
    let rows = FileBackend::new(dir.path())
        .read(schema.table("sellers").unwrap(), &Statement::ReadFile("ignored".into()))
        .unwrap();
    assert_eq!(rows.header.unwrap(), vec!["id", "zip", "city", "state"]);
    assert_eq!(rows.rows[0][0].as_deref(), Some("s1"));
    assert_eq!(rows.rows[0][2].as_deref(), Some("campinas"));
}
