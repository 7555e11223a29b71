//! Core traits for the remote store boundary.
//!
//! The synchronizer only ever needs "run this statement with these
//! parameters inside a transaction", so the hierarchy stays small:
//!
//! - [`CypherExecutor`] - Run or stream a parameterized statement
//! - [`Transaction`] - Commit or roll back
//! - [`GraphClient`] - Open transactions on a shared session

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher statements against a graph store.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a statement and returns a stream of result rows.
    ///
    /// Use this for reads (MATCH ... RETURN).
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a statement without returning results.
    ///
    /// Use this for writes (MERGE, SET, DELETE) and schema statements.
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A graph store session that can begin transactions.
///
/// Executor methods on the client itself run in auto-commit mode; the
/// synchronizer wraps every batch in an explicit [`begin`](GraphClient::begin).
#[async_trait]
pub trait GraphClient: CypherExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + CypherExecutor
    where
        Self: 'a;

    /// Begins a new transaction.
    ///
    /// ```ignore
    /// let txn = client.begin().await?;
    /// txn.run_cypher("MERGE (n:Node {id: $id})", params).await?;
    /// txn.commit().await?;
    /// ```
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}

/// Runs one statement in its own transaction, rolling back on failure.
pub async fn run_in_transaction<C: GraphClient>(
    client: &C,
    cypher: &str,
    params: crate::graph::row::Params,
) -> Result<(), AppError> {
    let txn = client.begin().await?;
    match txn.run_cypher(cypher, params).await {
        Ok(()) => txn.commit().await,
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(error = %rollback_err, "Rollback after failed statement also failed");
            }
            Err(err)
        }
    }
}
