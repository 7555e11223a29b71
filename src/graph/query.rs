//! Fluent statement builder.

use futures::TryStreamExt;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::CypherExecutor;

/// A statement plus its parameters, bound to an executor.
///
/// ```ignore
/// executor
///     .query("UNWIND $nodes AS node MERGE (n:Node {id: node.id})")
///     .param("nodes", rows)?
///     .run()
///     .await?;
/// ```
pub struct Query<'a, E: CypherExecutor + ?Sized> {
    executor: &'a E,
    cypher: String,
    params: Params,
}

impl<'a, E: CypherExecutor + ?Sized> Query<'a, E> {
    pub fn new(executor: &'a E, cypher: &str) -> Self {
        Self {
            executor,
            cypher: cypher.to_string(),
            params: Params::new(),
        }
    }

    /// Adds a parameter, referenced as `$name` in the statement.
    pub fn param<T: Serialize>(mut self, name: &str, value: T) -> Result<Self, AppError> {
        let json_value = serde_json::to_value(value)?;
        self.params.insert(name.to_string(), json_value);
        Ok(self)
    }

    /// Adds a parameter that's already a JSON value.
    pub fn param_raw(mut self, name: &str, value: JsonValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Adds every parameter of an existing map.
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    /// Executes the statement and returns a stream of rows.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        self.executor
            .execute_cypher(&self.cypher, self.params)
            .await
    }

    /// Executes the statement and collects all rows.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the statement and returns the first row, if any.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        use futures::StreamExt;
        stream.next().await.transpose()
    }

    /// Executes the statement without returning results.
    pub async fn run(self) -> Result<(), AppError> {
        self.executor.run_cypher(&self.cypher, self.params).await
    }
}

/// Adds `executor.query("...")` to every [`CypherExecutor`].
pub trait QueryExt: CypherExecutor {
    fn query(&self, cypher: &str) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, cypher)
    }
}

impl<E: CypherExecutor> QueryExt for E {}
