//! PostgreSQL sessions over `tokio-postgres`.
//!
//! The rest of the crate is synchronous, so each connector owns a small
//! current-thread Tokio runtime and blocks on it. Sessions must not be used
//! from inside another async runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use super::{BackendError, BackendResult, Connector, Session};
use crate::config::ConnectionParams;

/// How long to wait for the connection task to finish after the client is
/// dropped.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

pub(crate) fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let code = db_error.code();
    let mut message = db_error.message().to_string();

    if let Some(detail) = db_error.detail() {
        if !detail.trim().is_empty() {
            message.push_str(&format!(" (detail: {})", detail));
        }
    }

    if let Some(hint) = db_error.hint() {
        if !hint.trim().is_empty() {
            message.push_str(&format!(" (hint: {})", hint));
        }
    }

    match code.code() {
        "23505" => format!("duplicate value violates unique constraint: {}", message),
        "23503" => format!("foreign key violation: {}", message),
        "23502" => format!("null value violates not-null constraint: {}", message),
        "22007" => format!("invalid datetime format: {}", message),
        "22P02" => format!("invalid input syntax: {}", message),
        "42P01" => format!("undefined table: {}", message),
        "42P07" => format!("table already exists: {}", message),
        _ => format!("{} (code: {})", message, code.code()),
    }
}

/// Server-side errors are statement failures; anything else means the
/// connection itself is gone.
fn classify(error: tokio_postgres::Error, sql: &str) -> BackendError {
    let message = format_postgres_error(&error);
    if error.as_db_error().is_some() {
        BackendError::statement(message, sql)
    } else {
        BackendError::Connectivity(message)
    }
}

/// Opens PostgreSQL sessions.
#[derive(Debug)]
pub struct PgConnector {
    runtime: Arc<Runtime>,
    config: tokio_postgres::Config,
    connect_timeout: Duration,
    statement_timeout: Duration,
    target: String,
}

impl PgConnector {
    pub fn new(params: &ConnectionParams) -> BackendResult<Self> {
        let config = params.to_pg_config()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Connectivity(format!("failed to start runtime: {}", e)))?;

        Ok(Self {
            runtime: Arc::new(runtime),
            connect_timeout: params.connect_timeout()?,
            statement_timeout: params.statement_timeout()?,
            target: format!(
                "{}:{}/{}",
                params.host(),
                params.port()?,
                params.database().unwrap_or("")
            ),
            config,
        })
    }
}

impl Connector for PgConnector {
    type Session = PgSession;

    fn connect(&self) -> BackendResult<PgSession> {
        let config = self.config.clone();
        let connect_timeout = self.connect_timeout;
        let (client, connection) = self
            .runtime
            .block_on(async move { tokio::time::timeout(connect_timeout, config.connect(NoTls)).await })
            .map_err(|_| {
                BackendError::Connectivity(format!(
                    "timed out after {}s connecting to {}",
                    connect_timeout.as_secs(),
                    self.target
                ))
            })?
            .map_err(|e| BackendError::Connectivity(format_postgres_error(&e)))?;

        let driver = self.runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        let mut session = PgSession {
            runtime: Arc::clone(&self.runtime),
            client: Some(client),
            driver: Some(driver),
            call_timeout: self.statement_timeout,
        };
        let millis = self.statement_timeout.as_millis();
        session.run(&format!("SET statement_timeout = {}", millis), |client, sql| {
            Box::pin(async move { client.batch_execute(sql).await })
        })?;
        Ok(session)
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

type PgFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, tokio_postgres::Error>> + 'a>>;

/// A live PostgreSQL session. The connection closes on drop.
pub struct PgSession {
    runtime: Arc<Runtime>,
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
    call_timeout: Duration,
}

impl PgSession {
    /// Run one client operation under the call timeout.
    fn run<T>(
        &mut self,
        sql: &str,
        op: impl for<'a> FnOnce(&'a mut Client, &'a str) -> PgFuture<'a, T>,
    ) -> BackendResult<T> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| BackendError::Connectivity("session already closed".to_string()))?;
        let call_timeout = self.call_timeout;

        self.runtime
            .block_on(tokio::time::timeout(call_timeout, op(client, sql)))
            .map_err(|_| {
                BackendError::Connectivity(format!(
                    "timed out after {}s waiting for the server",
                    call_timeout.as_secs()
                ))
            })?
            .map_err(|e| classify(e, sql))
    }
}

impl Session for PgSession {
    fn execute(&mut self, sql: &str) -> BackendResult<()> {
        self.run(sql, |client, sql| {
            Box::pin(async move {
                let tx = client.transaction().await?;
                tx.batch_execute(sql).await?;
                tx.commit().await
            })
        })
    }

    fn query(&mut self, sql: &str) -> BackendResult<Vec<Vec<Option<String>>>> {
        let messages = self.run(sql, |client, sql| {
            Box::pin(async move { client.simple_query(sql).await })
        })?;

        Ok(messages
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|idx| row.get(idx).map(str::to_string))
                        .collect(),
                ),
                _ => None,
            })
            .collect())
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        // Dropping the client ends the connection task.
        drop(self.client.take());
        if let Some(driver) = self.driver.take() {
            let _ = self
                .runtime
                .block_on(async { tokio::time::timeout(CLOSE_GRACE, driver).await });
        }
    }
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("open", &self.client.is_some())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
