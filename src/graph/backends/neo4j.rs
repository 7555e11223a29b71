//! Neo4j backend over the Bolt protocol.
//!
//! Statement parameters arrive as JSON and are converted to Bolt values
//! before being bound, so batch payloads (`$nodes`, `$edges`) travel as
//! typed lists of maps rather than being interpolated into the statement.
//!
//! ```ignore
//! use sidb_network::graph::backends::neo4j::Neo4jClient;
//!
//! let client = Neo4jClient::connect(&config.neo4j).await?;
//! let counts = StoreRepository::new(&client).counts().await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltNull, BoltType, ConfigBuilder};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use crate::config::Neo4jConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{CypherExecutor, GraphClient, Transaction};

/// Neo4j client backed by the neo4rs connection pool.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Neo4jClient {
    graph: neo4rs::Graph,
}

impl Neo4jClient {
    /// Connects and pings the server.
    ///
    /// neo4rs builds its pool lazily, so a `RETURN 1` round trip is issued
    /// immediately to surface an unreachable server here instead of on the
    /// first batch.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, AppError> {
        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_deref().unwrap_or(""))
            .max_connections(4)
            .fetch_size(500);
        if let Some(db) = config.database.as_deref() {
            builder = builder.db(db);
        }

        let graph = neo4rs::Graph::connect(builder.build()?).await?;
        graph.run(neo4rs::query("RETURN 1")).await?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    pub fn inner(&self) -> &neo4rs::Graph {
        &self.graph
    }
}

#[async_trait]
impl CypherExecutor for Neo4jClient {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        use async_stream::try_stream;

        let query = build_query(cypher, params);
        let statement = cypher.to_string();
        let mut result = self
            .graph
            .execute(query)
            .await
            .map_err(|e| query_error(&statement, e))?;

        Ok(Box::pin(try_stream! {
            while let Some(row) = result.next().await.map_err(|e| query_error(&statement, e))? {
                yield convert_row(&row)?;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.graph
            .run(build_query(cypher, params))
            .await
            .map_err(|e| query_error(cypher, e))
    }
}

#[async_trait]
impl GraphClient for Neo4jClient {
    type Tx<'a> = Neo4jTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let txn = self.graph.start_txn().await?;
        Ok(Neo4jTransaction {
            txn: Mutex::new(Some(txn)),
        })
    }
}

/// An explicit Neo4j transaction.
///
/// neo4rs needs `&mut` access to run statements, so the handle sits behind
/// an async mutex to satisfy the shared-reference executor trait.
pub struct Neo4jTransaction {
    txn: Mutex<Option<neo4rs::Txn>>,
}

impl Neo4jTransaction {
    async fn take(self) -> Result<neo4rs::Txn, AppError> {
        self.txn
            .into_inner()
            .ok_or_else(|| AppError::Internal("transaction already finished".into()))
    }
}

#[async_trait]
impl CypherExecutor for Neo4jTransaction {
    async fn execute_cypher(
        &self,
        _cypher: &str,
        _params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        Err(AppError::Internal(
            "streaming reads inside a Neo4j transaction are not supported; use the client".into(),
        ))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        let mut guard = self.txn.lock().await;
        let txn = guard
            .as_mut()
            .ok_or_else(|| AppError::Internal("transaction already finished".into()))?;
        txn.run(build_query(cypher, params))
            .await
            .map_err(|e| query_error(cypher, e))
    }
}

#[async_trait]
impl Transaction for Neo4jTransaction {
    async fn commit(self) -> Result<(), AppError> {
        self.take().await?.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.take().await?.rollback().await?;
        Ok(())
    }
}

fn build_query(cypher: &str, params: Params) -> neo4rs::Query {
    params
        .into_iter()
        .fold(neo4rs::query(cypher), |query, (name, value)| {
            query.param(&name, to_bolt(value))
        })
}

fn query_error(cypher: &str, err: neo4rs::Error) -> AppError {
    AppError::Query {
        message: err.to_string(),
        query: cypher.to_string(),
    }
}

/// Converts a JSON parameter value into its Bolt counterpart.
fn to_bolt(value: JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => b.into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        JsonValue::String(s) => s.into(),
        JsonValue::Array(items) => {
            BoltType::List(BoltList::from(items.into_iter().map(to_bolt).collect::<Vec<_>>()))
        }
        JsonValue::Object(map) => {
            let mut bolt = BoltMap::new();
            for (key, value) in map {
                bolt.put(key.into(), to_bolt(value));
            }
            BoltType::Map(bolt)
        }
    }
}

fn convert_row(row: &neo4rs::Row) -> Result<Row, AppError> {
    let data: HashMap<String, JsonValue> = row
        .to()
        .map_err(|e| AppError::Internal(format!("Failed to decode Neo4j row: {}", e)))?;
    Ok(Row::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_bolt_scalars() {
        assert!(matches!(to_bolt(JsonValue::Null), BoltType::Null(_)));
        assert!(matches!(to_bolt(json!(true)), BoltType::Boolean(_)));
        assert!(matches!(to_bolt(json!(7)), BoltType::Integer(_)));
        assert!(matches!(to_bolt(json!(0.25)), BoltType::Float(_)));
        assert!(matches!(to_bolt(json!("HP:0001250")), BoltType::String(_)));
    }

    #[test]
    fn test_to_bolt_batch_payload() {
        let payload = json!([
            {"id": "P1", "name": "John Smith v0"},
            {"id": "P2", "name": "John Smith v1"}
        ]);
        match to_bolt(payload) {
            BoltType::List(list) => {
                assert_eq!(list.value.len(), 2);
                assert!(list.value.iter().all(|item| matches!(item, BoltType::Map(_))));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }
}
