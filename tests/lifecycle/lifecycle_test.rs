#[cfg(test)]
mod tests {
    use datamart::backend::{BackendError, BackendResult, RowSet, StorageBackend};
    use datamart::config::{LifecycleFlags, RuntimeConfig};
    use datamart::lifecycle::{Phase, SchemaLifecycleController};
    use datamart::schema::{SchemaError, SchemaModel, TableDef, TableOrder};
    use datamart::statement::Statement;
    use std::cell::RefCell;

    const OLIST: &str = include_str!("../fixtures/olist_schema.json");

    /// Records executed SQL and rejects statements containing `fail_on`.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        executed: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl StorageBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn execute(&self, statement: &Statement) -> BackendResult<()> {
            let sql = statement.to_string();
            if self.fail_on.is_some_and(|needle| sql.contains(needle)) {
                return Err(BackendError::statement("relation already exists", &sql));
            }
            self.executed.borrow_mut().push(sql);
            Ok(())
        }

        fn read(&self, _table: &TableDef, _statement: &Statement) -> BackendResult<RowSet> {
            Ok(RowSet::default())
        }
    }

    fn schema() -> SchemaModel {
        SchemaModel::from_json_str(OLIST).unwrap()
    }

    #[test]
    fn test_only_enabled_phases_run() {
        let backend = ScriptedBackend::default();
        let controller = SchemaLifecycleController::new(schema(), &backend);
        let flags = RuntimeConfig::from_json_str(
            r#"{"datasource": "postgres", "db": {"create": "y", "insert": "n", "drop": "", "delete": "y"}}"#,
        )
        .unwrap()
        .db;

        let report = controller.run(&flags).unwrap();
        let phases: Vec<Phase> = report.phases.iter().map(|p| p.phase).collect();
        assert_eq!(phases, vec![Phase::Create, Phase::Delete]);
        assert!(report.is_success());

        let executed = backend.executed.borrow();
        assert_eq!(executed.len(), 16);
        assert!(executed[..8].iter().all(|s| s.starts_with("CREATE TABLE")));
        assert!(executed[8..].iter().all(|s| s.starts_with("TRUNCATE")));
    }

    #[test]
    fn test_no_flags_no_statements() {
        let backend = ScriptedBackend::default();
        let controller = SchemaLifecycleController::new(schema(), &backend);
        let report = controller.run(&LifecycleFlags::default()).unwrap();
        assert!(report.phases.is_empty());
        assert!(backend.executed.borrow().is_empty());
    }

    #[test]
    fn test_failure_does_not_abort_phase() {
        let backend = ScriptedBackend {
            fail_on: Some("CREATE TABLE orders "),
            ..Default::default()
        };
        let controller = SchemaLifecycleController::new(schema(), &backend);

        let report = controller.run_phase(Phase::Create).unwrap();
        assert_eq!(report.executed.len(), 7);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "createTableorders");
        assert!(report.failed[0].error.is_statement());
        assert!(!report.is_success());
    }

    #[test]
    fn test_dependency_order_creates_parents_first() {
        let backend = ScriptedBackend::default();
        let controller = SchemaLifecycleController::new(schema(), &backend)
            .with_order(TableOrder::Dependency);
        controller.run_phase(Phase::Create).unwrap();

        let executed = backend.executed.borrow();
        let position = |table: &str| {
            executed
                .iter()
                .position(|s| s.starts_with(&format!("CREATE TABLE {} ", table)))
                .unwrap()
        };
        assert!(position("customers") < position("orders"));
        assert!(position("orders") < position("order_items"));
    }

    #[test]
    fn test_document_order_reproduces_schema_order() {
        let backend = ScriptedBackend::default();
        let controller =
            SchemaLifecycleController::new(schema(), &backend).with_order(TableOrder::Document);
        let statements = controller.statements(Phase::Insert).unwrap();
        let keys: Vec<&str> = statements.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "insertCsvorders");
        assert_eq!(keys[1], "insertCsvcustomers");
    }

    #[test]
    fn test_cycle_fails_phase_before_executing() {
        let cyclic = SchemaModel::from_json_str(
            r#"{"tables": {
                "a": {"fields": ["b_id"], "types": ["int"], "foreignkeys": ["b_id.b.id"], "source": "a.csv"},
                "b": {"fields": ["a_id"], "types": ["int"], "foreignkeys": ["a_id.a.id"], "source": "b.csv"}
            }}"#,
        )
        .unwrap();
        let backend = ScriptedBackend::default();
        let controller = SchemaLifecycleController::new(cyclic, &backend);

        assert!(matches!(
            controller.run(&LifecycleFlags::all()),
            Err(SchemaError::DependencyCycle(_))
        ));
        assert!(backend.executed.borrow().is_empty());
    }
}
