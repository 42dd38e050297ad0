//! Session handling of the relational backend, against an in-memory
//! connector that records every session it opens.

use datamart::backend::{
    BackendError, BackendResult, Connector, RelationalBackend, Session, StorageBackend,
};
use datamart::schema::SchemaModel;
use datamart::statement::Statement;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Log {
    opened: usize,
    closed: usize,
    executed: Vec<String>,
}

#[derive(Clone, Copy)]
enum Mode {
    Ok,
    Unreachable,
    Reject,
    WrongWidth,
}

struct MockSession {
    log: Rc<RefCell<Log>>,
    mode: Mode,
}

impl Session for MockSession {
    fn execute(&mut self, sql: &str) -> BackendResult<()> {
        match self.mode {
            Mode::Reject => Err(BackendError::statement("syntax error at or near \"TABLE\"", sql)),
            _ => {
                self.log.borrow_mut().executed.push(sql.to_string());
                Ok(())
            }
        }
    }

    fn query(&mut self, sql: &str) -> BackendResult<Vec<Vec<Option<String>>>> {
        match self.mode {
            Mode::Reject => Err(BackendError::statement("relation does not exist", sql)),
            Mode::WrongWidth => Ok(vec![vec![Some("only one".into())]]),
            _ => Ok(vec![
                vec![Some("o1".into()), Some("c1".into())],
                vec![Some("o2".into()), None],
            ]),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

struct MockConnector {
    log: Rc<RefCell<Log>>,
    mode: Mode,
}

impl Connector for MockConnector {
    type Session = MockSession;

    fn connect(&self) -> BackendResult<MockSession> {
        if let Mode::Unreachable = self.mode {
            return Err(BackendError::Connectivity("connection refused".into()));
        }
        self.log.borrow_mut().opened += 1;
        Ok(MockSession {
            log: Rc::clone(&self.log),
            mode: self.mode,
        })
    }

    fn target(&self) -> String {
        "mock:5432/olist".into()
    }
}

fn backend(mode: Mode) -> (RelationalBackend<MockConnector>, Rc<RefCell<Log>>) {
    let log = Rc::new(RefCell::new(Log::default()));
    let backend = RelationalBackend::new(MockConnector {
        log: Rc::clone(&log),
        mode,
    });
    (backend, log)
}

fn orders() -> SchemaModel {
    SchemaModel::from_json_str(
        r#"{"tables": {"orders": {
            "fields": ["order_id", "customer_id"],
            "types": ["varchar", "varchar"],
            "primarykeys": ["order_id"],
            "source": "orders.csv"
        }}}"#,
    )
    .unwrap()
}

fn select() -> Statement {
    Statement::Sql("SELECT * FROM orders".into())
}

#[test]
fn test_execute_opens_and_closes_one_session() {
    let (backend, log) = backend(Mode::Ok);
    backend
        .execute(&Statement::Sql("DROP TABLE orders;".into()))
        .unwrap();
    backend
        .execute(&Statement::Sql("DROP TABLE customers;".into()))
        .unwrap();

    let log = log.borrow();
    assert_eq!(log.opened, 2);
    assert_eq!(log.closed, 2);
    assert_eq!(log.executed, vec!["DROP TABLE orders;", "DROP TABLE customers;"]);
}

#[test]
fn test_failed_statement_still_releases_session() {
    let (backend, log) = backend(Mode::Reject);
    let err = backend
        .execute(&Statement::Sql("DROP TABL orders;".into()))
        .unwrap_err();

    assert!(err.is_statement());
    assert_eq!(log.borrow().opened, 1);
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_failed_query_still_releases_session() {
    let (backend, log) = backend(Mode::Reject);
    let schema = orders();
    let err = backend
        .read(schema.table("orders").unwrap(), &select())
        .unwrap_err();

    assert!(err.is_statement());
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_unreachable_database_is_connectivity_error() {
    let (backend, log) = backend(Mode::Unreachable);
    let schema = orders();

    let err = backend
        .execute(&Statement::Sql("DROP TABLE orders;".into()))
        .unwrap_err();
    assert!(err.is_connectivity());
    let err = backend
        .read(schema.table("orders").unwrap(), &select())
        .unwrap_err();
    assert!(err.is_connectivity());
    assert_eq!(log.borrow().opened, 0);
}

#[test]
fn test_read_returns_positional_rows() {
    let (backend, log) = backend(Mode::Ok);
    let schema = orders();
    let rows = backend.read(schema.table("orders").unwrap(), &select()).unwrap();

    assert!(rows.header.is_none());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.rows[1][1], None);
    assert_eq!(log.borrow().closed, 1);
}

#[test]
fn test_read_rejects_rows_of_wrong_width() {
    let (backend, log) = backend(Mode::WrongWidth);
    let schema = orders();
    let err = backend
        .read(schema.table("orders").unwrap(), &select())
        .unwrap_err();

    assert!(matches!(err, BackendError::Shape { expected: 2, found: 1, .. }));
    assert_eq!(log.borrow().closed, 1);
}
