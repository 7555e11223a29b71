//! In-process backend that records committed statements.
//!
//! Used for `--dry-run` synchronization and as the store double in tests.
//! Statements run inside a transaction only reach the log on commit, so a
//! rolled-back batch leaves no trace, mirroring a transactional store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{CypherExecutor, GraphClient, Transaction};

/// A statement as it was submitted to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: Params,
}

impl Statement {
    /// Length of the array bound to `name`, if it is one.
    pub fn batch_len(&self, name: &str) -> Option<usize> {
        self.params
            .get(name)
            .and_then(|v| v.as_array())
            .map(|rows| rows.len())
    }
}

#[derive(Default)]
struct State {
    committed: Vec<Statement>,
    failures: Vec<String>,
    canned_rows: Vec<(String, Vec<Row>)>,
}

/// Recording client; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingClient {
    state: Arc<Mutex<State>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every statement containing `pattern` fail with a query error.
    pub fn fail_matching(self, pattern: &str) -> Self {
        self.lock().failures.push(pattern.to_string());
        self
    }

    /// Returns `rows` for reads whose statement contains `pattern`.
    pub fn with_rows(self, pattern: &str, rows: Vec<Row>) -> Self {
        self.lock().canned_rows.push((pattern.to_string(), rows));
        self
    }

    /// All statements that reached the store, in commit order.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().committed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, cypher: &str) -> Result<(), AppError> {
        let state = self.lock();
        match state.failures.iter().find(|p| cypher.contains(p.as_str())) {
            Some(pattern) => Err(AppError::Query {
                message: format!("injected failure for statements matching '{}'", pattern),
                query: cypher.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn record(&self, statements: impl IntoIterator<Item = Statement>) {
        self.lock().committed.extend(statements);
    }
}

#[async_trait]
impl CypherExecutor for RecordingClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.check(cypher)?;
        let rows = self
            .lock()
            .canned_rows
            .iter()
            .find(|(pattern, _)| cypher.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        self.record([Statement {
            cypher: cypher.to_string(),
            params,
        }]);
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.check(cypher)?;
        self.record([Statement {
            cypher: cypher.to_string(),
            params,
        }]);
        Ok(())
    }
}

#[async_trait]
impl GraphClient for RecordingClient {
    type Tx<'a> = RecordingTransaction<'a>;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        Ok(RecordingTransaction {
            client: self,
            pending: Mutex::new(Vec::new()),
        })
    }
}

/// Buffers statements until commit.
pub struct RecordingTransaction<'a> {
    client: &'a RecordingClient,
    pending: Mutex<Vec<Statement>>,
}

#[async_trait]
impl CypherExecutor for RecordingTransaction<'_> {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.run_cypher(cypher, params).await?;
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.client.check(cypher)?;
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Statement {
                cypher: cypher.to_string(),
                params,
            });
        Ok(())
    }
}

#[async_trait]
impl Transaction for RecordingTransaction<'_> {
    async fn commit(self) -> Result<(), AppError> {
        let pending = self
            .pending
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        self.client.record(pending);
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        Ok(())
    }
}
