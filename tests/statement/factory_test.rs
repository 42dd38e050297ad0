#[cfg(test)]
mod tests {
    use datamart::schema::{SchemaModel, TableOrder};
    use datamart::statement::{Operation, Statement, StatementFactory};
    use insta::assert_snapshot;

    const OLIST: &str = include_str!("../fixtures/olist_schema.json");

    fn schema() -> SchemaModel {
        SchemaModel::from_json_str(OLIST).unwrap()
    }

    fn sql(statement: &Statement) -> &str {
        statement.as_sql().unwrap()
    }

    #[test]
    fn test_create_order_items() {
        let schema = schema();
        let sql = StatementFactory::new().create_table_statement(schema.table("order_items").unwrap());
        assert_snapshot!(sql, @"CREATE TABLE order_items (order_id varchar REFERENCES orders(order_id), order_item_id int, product_id varchar REFERENCES products(product_id), seller_id varchar REFERENCES sellers(seller_id), price float, freight_value float);");
    }

    #[test]
    fn test_create_has_one_clause_per_field() {
        let schema = schema();
        let factory = StatementFactory::new();
        for table in schema.tables() {
            let sql = factory.create_table_statement(table);
            let body = sql
                .strip_prefix(&format!("CREATE TABLE {} (", table.name))
                .and_then(|s| s.strip_suffix(");"))
                .unwrap();
            let clauses: Vec<&str> = body.split(", ").collect();
            assert_eq!(clauses.len(), table.fields.len(), "{}", table.name);

            for (clause, field) in clauses.iter().zip(&table.fields) {
                assert!(clause.starts_with(field.as_str()));
                let references = clause.contains("REFERENCES");
                let primary = clause.contains("PRIMARY KEY");
                assert!(!(references && primary), "{clause}");
                assert_eq!(references, table.foreign_key(field).is_some());
            }
        }
    }

    #[test]
    fn test_bulk_load_reviews() {
        let schema = schema();
        let sql = StatementFactory::new().bulk_load_statement(schema.table("order_reviews").unwrap());
        assert_snapshot!(sql, @"COPY order_reviews FROM '../data/olist_order_reviews_dataset.csv' DELIMITER ',' CSV HEADER;");
    }

    #[test]
    fn test_whole_schema_maps_cover_every_table() {
        let schema = schema();
        let factory = StatementFactory::new();

        for operation in [
            Operation::CreateTable,
            Operation::InsertCsv,
            Operation::Drop,
            Operation::Delete,
        ] {
            for order in [TableOrder::Document, TableOrder::Dependency] {
                let map = factory.statements(operation, &schema, order).unwrap();
                assert_eq!(map.len(), schema.len());
                for name in schema.table_names() {
                    let key = format!("{}{}", operation.key_prefix(), name);
                    assert!(map.contains_key(&key), "missing {key}");
                }
            }
        }
    }

    #[test]
    fn test_document_order_is_reproduced() {
        let schema = schema();
        let create = StatementFactory::new()
            .create_tables(&schema, TableOrder::Document)
            .unwrap();
        let first = create.keys().next().unwrap();
        assert_eq!(first, "createTableorders");
    }

    #[test]
    fn test_delete_runs_children_first_in_dependency_order() {
        let schema = schema();
        let delete = StatementFactory::new()
            .delete_contents(&schema, TableOrder::Dependency)
            .unwrap();
        let keys: Vec<&str> = delete.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"deletegeolocation"));
        assert_eq!(keys.last(), Some(&"deletecustomers"));
        assert_eq!(sql(&delete["deleteorders"]), "TRUNCATE orders CASCADE;");
    }

    #[test]
    fn test_regeneration_is_byte_identical() {
        let schema = schema();
        let factory = StatementFactory::new();
        let a = factory.drop_tables(&schema, TableOrder::Dependency).unwrap();
        let b = factory.drop_tables(&schema, TableOrder::Dependency).unwrap();
        assert_eq!(a, b);
        assert_eq!(sql(&a["droporders"]), "DROP TABLE orders;");
    }

    #[test]
    fn test_quoted_identifiers() {
        let factory = StatementFactory::new();
        assert_eq!(factory.drop_statement("Order Items"), "DROP TABLE \"Order Items\";");
        assert_eq!(factory.select_by_table("user", "*"), "SELECT * FROM \"user\"");
    }
}
